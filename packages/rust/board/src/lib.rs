//! Board data source: reference parsing and item retrieval.
//!
//! The pipeline only sees the [`BoardSource`] trait. [`MiroClient`] is the
//! production implementation, walking the REST API's continuation links
//! until exhausted.

mod record;

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use boardsmith_shared::{BoardConfig, BoardsmithError, Item, ItemType, Result, resolve_board_token};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use record::{clean_html, parse_item};

/// User-Agent string for board API requests.
const USER_AGENT: &str = concat!("Boardsmith/", env!("CARGO_PKG_VERSION"));

/// How much of an error body to keep in a fetch error.
const ERROR_BODY_CHARS: usize = 200;

/// Matches a whole `board` path segment followed by `<id>`.
static BOARD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)board/([^/?#]+)").expect("board id regex"));

/// Extract the board identifier from a reference such as
/// `https://miro.com/app/board/uXjVK123=/`.
pub fn parse_board_id(reference: &str) -> Result<String> {
    BOARD_ID_RE
        .captures(reference)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            BoardsmithError::reference(format!("no board/<id> segment in '{reference}'"))
        })
}

// ---------------------------------------------------------------------------
// BoardSource
// ---------------------------------------------------------------------------

/// Anything that can list the items of a board.
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetch every item on the board, in source order.
    async fn fetch_items(&self, board_id: &str) -> Result<Vec<Item>>;
}

// ---------------------------------------------------------------------------
// MiroClient
// ---------------------------------------------------------------------------

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

/// Miro REST v2 client.
pub struct MiroClient {
    client: Client,
    api_base: Url,
    token: String,
    page_limit: u32,
    include_connectors: bool,
}

impl MiroClient {
    /// Create a client with an explicit access token.
    pub fn new(config: &BoardConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BoardsmithError::Fetch(format!("failed to build HTTP client: {e}")))?;

        let api_base = Url::parse(&config.api_base).map_err(|e| {
            BoardsmithError::config(format!("invalid board api_base '{}': {e}", config.api_base))
        })?;

        Ok(Self {
            client,
            api_base,
            token: token.into(),
            page_limit: config.page_limit,
            include_connectors: config.include_connectors,
        })
    }

    /// Create a client reading the token from the configured env var.
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        let token = resolve_board_token(config)?;
        Self::new(config, token)
    }

    /// `{api_base}/boards/{board_id}/{listing}?limit=N`
    fn listing_url(&self, board_id: &str, listing: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| BoardsmithError::config(format!("api_base '{}' cannot be a base", self.api_base)))?
            .pop_if_empty()
            .extend(["boards", board_id, listing]);
        url.query_pairs_mut()
            .append_pair("limit", &self.page_limit.to_string());
        Ok(url)
    }

    /// Follow continuation links from `first` until exhausted, collecting records.
    async fn walk_pages(&self, first: Url) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            if !seen.insert(url.to_string()) {
                warn!(%url, "continuation link repeats, stopping pagination");
                break;
            }

            let page = self.fetch_page(&url).await?;
            debug!(%url, records = page.data.len(), "fetched page");
            records.extend(page.data);

            next = match page.links.and_then(|l| l.next) {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    BoardsmithError::Fetch(format!("invalid continuation link '{link}': {e}"))
                })?),
                None => None,
            };
        }

        Ok(records)
    }

    async fn fetch_page(&self, url: &Url) -> Result<Page> {
        let response = self
            .client
            .get(url.as_str())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BoardsmithError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BoardsmithError::Fetch(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            let prefix: String = body.chars().take(ERROR_BODY_CHARS).collect();
            return Err(BoardsmithError::Fetch(format!("{url}: HTTP {status}: {prefix}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| BoardsmithError::Fetch(format!("{url}: malformed page body: {e}")))
    }
}

#[async_trait]
impl BoardSource for MiroClient {
    #[instrument(skip_all, fields(board_id = %board_id))]
    async fn fetch_items(&self, board_id: &str) -> Result<Vec<Item>> {
        let mut records = self.walk_pages(self.listing_url(board_id, "items")?).await?;
        let item_count = records.len();

        if self.include_connectors {
            let connectors = self.walk_pages(self.listing_url(board_id, "connectors")?).await?;
            records.extend(connectors.into_iter().map(|mut record| {
                if let Value::Object(map) = &mut record {
                    map.entry("type")
                        .or_insert_with(|| Value::String(ItemType::Connector.as_str().into()));
                }
                record
            }));
        }

        let total = records.len();
        let items: Vec<Item> = records.into_iter().filter_map(parse_item).collect();
        if items.len() < total {
            warn!(skipped = total - items.len(), "skipped records without id or type");
        }

        info!(
            items = item_count,
            connectors = total - item_count,
            "board fetch complete"
        );

        Ok(items)
    }
}
