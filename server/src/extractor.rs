use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use url::{Host, Url};

use crate::cache::MetadataCache;
use crate::error::ExtractError;
use crate::models::TagMap;

pub const TWITTER_PREFIX: &str = "twitter:";
pub const OPEN_GRAPH_PREFIX: &str = "og:";
pub const MAX_REDIRECTS: usize = 10;

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    /// Whole-request timeout. `None` keeps the transport default (no timeout).
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Remember empty results, including failed fetches, until evicted.
    pub cache_empty_results: bool,
    /// Share one upstream fetch between concurrent requests for the same URL.
    pub coalesce_requests: bool,
    pub block_private_addresses: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: None,
            cache_empty_results: true,
            coalesce_requests: true,
            block_private_addresses: false,
        }
    }
}

type InFlight = Arc<OnceCell<Arc<TagMap>>>;

/// One caller's claim on an in-flight fetch.
///
/// Dropping it (on completion or cancellation) removes the map entry once the
/// fetch has finished or no other caller is waiting on it. The cell is
/// released under the map lock so reference counts are only ever read and
/// changed while it is held.
struct InFlightEntry<'a> {
    in_flight: &'a Mutex<HashMap<String, InFlight>>,
    url: &'a str,
    cell: InFlight,
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        let cell = std::mem::take(&mut self.cell);
        let is_current = in_flight
            .get(self.url)
            .is_some_and(|current| Arc::ptr_eq(current, &cell));
        // The map and this entry are the only holders left.
        if is_current && (cell.initialized() || Arc::strong_count(&cell) <= 2) {
            in_flight.remove(self.url);
        }
        drop(cell);
    }
}

/// Cache-backed fetch → parse → extract pipeline.
///
/// `fetch` never fails: every fetch or parse error is logged and answered
/// with an empty `TagMap`.
pub struct MetadataExtractor {
    client: ReqwestClient,
    cache: MetadataCache,
    config: ExtractorConfig,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl MetadataExtractor {
    pub fn new(cache: MetadataCache, config: ExtractorConfig) -> Result<Self, ExtractError> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if config.block_private_addresses {
            // Redirects are followed by hand so every hop passes the guard.
            builder = builder.redirect(Policy::none());
        }
        let client = builder.build().map_err(ExtractError::Client)?;

        Ok(Self {
            client,
            cache,
            config,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Return the tags for `url`, from the cache when possible.
    pub async fn fetch(&self, url: &str) -> Arc<TagMap> {
        if let Some(tags) = self.cache.get(url) {
            tracing::debug!(url = %url, "Metadata cache hit");
            return tags;
        }
        tracing::debug!(url = %url, "Metadata cache miss");

        if !self.config.coalesce_requests {
            return self.fetch_and_store(url).await;
        }

        let entry = InFlightEntry {
            in_flight: &self.in_flight,
            url,
            cell: self
                .in_flight
                .lock()
                .entry(url.to_string())
                .or_default()
                .clone(),
        };

        let tags = entry
            .cell
            .get_or_init(|| async {
                // A previous leader may have finished between our cache miss
                // and joining this cell.
                match self.cache.get(url) {
                    Some(tags) => tags,
                    None => self.fetch_and_store(url).await,
                }
            })
            .await
            .clone();

        tags
    }

    async fn fetch_and_store(&self, url: &str) -> Arc<TagMap> {
        let tags = match self.try_fetch(url).await {
            Ok(tags) => {
                tracing::debug!(url = %url, count = tags.len(), tags = ?tags, "Extracted metadata tags");
                tags
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Failed to extract metadata");
                TagMap::new()
            }
        };

        let tags = Arc::new(tags);
        if !tags.is_empty() || self.config.cache_empty_results {
            self.cache.put(url, tags.clone());
        }
        tags
    }

    async fn try_fetch(&self, url: &str) -> Result<TagMap, ExtractError> {
        let target = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;

        match target.scheme() {
            "http" | "https" => {}
            other => return Err(ExtractError::UnsupportedScheme(other.to_string())),
        }

        let response = if self.config.block_private_addresses {
            self.send_guarded(target).await?
        } else {
            self.client.get(target).send().await?
        };

        // Status is deliberately not checked; error pages can carry tags too.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, %status, "Upstream returned non-success status");
        }

        let html: String = response.text().await?;
        extract_tags(&html)
    }

    /// GET `target`, checking it and every redirect hop against the
    /// private-address guard.
    async fn send_guarded(&self, mut target: Url) -> Result<Response, ExtractError> {
        for _ in 0..=MAX_REDIRECTS {
            ensure_public_target(&target).await?;
            let response = self.client.get(target.clone()).send().await?;

            let next = redirect_target(
                &target,
                response.status(),
                response.headers().get(LOCATION),
            )?;
            match next {
                Some(next) => {
                    tracing::debug!(from = %target, to = %next, "Following guarded redirect");
                    target = next;
                }
                None => return Ok(response),
            }
        }

        Err(ExtractError::TooManyRedirects(MAX_REDIRECTS))
    }
}

/// Where a response redirects to, resolved against `current`.
///
/// `None` when the response is not a redirect or carries no `Location`.
fn redirect_target(
    current: &Url,
    status: StatusCode,
    location: Option<&HeaderValue>,
) -> Result<Option<Url>, ExtractError> {
    if !status.is_redirection() {
        return Ok(None);
    }
    let Some(location) = location else {
        return Ok(None);
    };

    let location = location
        .to_str()
        .map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
    let next = current
        .join(location)
        .map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;

    match next.scheme() {
        "http" | "https" => Ok(Some(next)),
        other => Err(ExtractError::UnsupportedScheme(other.to_string())),
    }
}

// ── Public helpers ─────────────────────────────────────────────────────────

/// Collect `twitter:*` (by `name`) and `og:*` (by `property`) meta tags from
/// `html`, in document order. Later duplicates overwrite earlier ones.
///
/// A recognised tag without a `content` attribute is skipped.
pub fn extract_tags(html: &str) -> Result<TagMap, ExtractError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta").map_err(|e| ExtractError::Parse(format!("{e:?}")))?;

    let mut tags = TagMap::new();
    for element in document.select(&selector) {
        let meta = element.value();
        let content = meta.attr("content");

        let keys = [
            meta.attr("name").filter(|n| n.starts_with(TWITTER_PREFIX)),
            meta.attr("property")
                .filter(|p| p.starts_with(OPEN_GRAPH_PREFIX)),
        ];
        for key in keys.into_iter().flatten() {
            match content {
                Some(content) => tags.insert(key, content),
                None => tracing::debug!(tag = %key, "Skipping meta tag without content"),
            }
        }
    }

    Ok(tags)
}

/// Returns `true` if `ip` is a private, loopback, link-local or unspecified
/// address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            matches!(
                o,
                [127, ..]
                    | [10, ..]
                    | [169, 254, ..]
                    | [192, 168, ..]
                    | [0, ..]
                    | [255, 255, 255, 255]
            ) || (o[0] == 172 && (16..=31).contains(&o[1]))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00 == 0xfc00)
                || (v6.segments()[0] & 0xffc0 == 0xfe80)
        }
    }
}

/// Resolve the target host and refuse it if any address is private.
async fn ensure_public_target(target: &Url) -> Result<(), ExtractError> {
    let port = target.port_or_known_default().unwrap_or(80);

    let addrs: Vec<IpAddr> = match target.host() {
        Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        Some(Host::Domain(domain)) => tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| ExtractError::Resolve(e.to_string()))?
            .map(|addr| addr.ip())
            .collect(),
        None => return Err(ExtractError::Blocked(target.to_string())),
    };

    match addrs.into_iter().find(|ip| is_private_ip(*ip)) {
        Some(ip) => Err(ExtractError::Blocked(ip.to_string())),
        None => Ok(()),
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────
