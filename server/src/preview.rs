use url::Url;

use crate::error::BuildError;
use crate::models::{MetadataRecord, TagMap};

const IMAGE_KEYS: &[&str] = &["og:image", "twitter:image:src"];
const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description"];
const SITE_NAME_KEYS: &[&str] = &["og:site_name", "twitter:site"];

/// Project `tags` into the fixed-shape record returned to clients.
///
/// Each field takes the first non-empty tag among its candidates. An
/// origin-relative image (`/img.png`) is made absolute against `url`, which
/// is the only step that can fail.
pub fn build_record(url: &str, tags: &TagMap) -> Result<MetadataRecord, BuildError> {
    let field = |keys: &[&str]| tags.first_non_empty(keys).unwrap_or_default().to_string();

    let mut image = field(IMAGE_KEYS);
    if image.starts_with('/') {
        image = resolve_against_origin(url, &image)?;
    }

    Ok(MetadataRecord {
        url: url.to_string(),
        title: field(TITLE_KEYS),
        image,
        description: field(DESCRIPTION_KEYS),
        site_name: field(SITE_NAME_KEYS),
    })
}

/// `/path` → `scheme://host[:port]/path`; `//host/path` → `scheme://host/path`.
fn resolve_against_origin(url: &str, path: &str) -> Result<String, BuildError> {
    let base = Url::parse(url).map_err(|source| BuildError::UrlParse {
        url: url.to_string(),
        source,
    })?;
    let scheme = base.scheme();

    if path.starts_with("//") {
        return Ok(format!("{scheme}:{path}"));
    }

    let host = base
        .host_str()
        .ok_or_else(|| BuildError::MissingHost(url.to_string()))?;

    Ok(match base.port() {
        Some(port) => format!("{scheme}://{host}:{port}{path}"),
        None => format!("{scheme}://{host}{path}"),
    })
}
