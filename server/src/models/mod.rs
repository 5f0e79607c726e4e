use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Tag Models
// ============================================================================

/// Open Graph / Twitter Card tags extracted from one page, keyed by the
/// `property` or `name` attribute (`og:title`, `twitter:image:src`, ...).
///
/// An empty map is the "no data" answer: the page had no recognised tags, or
/// fetching it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap(HashMap<String, String>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// First value among `keys` that is present and non-empty.
    pub fn first_non_empty(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TagMap(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Response Models
// ============================================================================

/// Link preview returned by `GET /?url=...`.
///
/// Every field is a string; absent metadata is `""` rather than `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub url: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub site_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_skips_blank_values() {
        let tags: TagMap = [("og:title", ""), ("twitter:title", "B")]
            .into_iter()
            .collect();
        assert_eq!(tags.first_non_empty(&["og:title", "twitter:title"]), Some("B"));
    }

    #[test]
    fn first_non_empty_none_when_all_missing() {
        let tags = TagMap::new();
        assert_eq!(tags.first_non_empty(&["og:title"]), None);
    }

    #[test]
    fn record_serializes_site_name_in_camel_case() {
        let record = MetadataRecord {
            url: "https://example.com".into(),
            site_name: "Example".into(),
            ..MetadataRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["siteName"], "Example");
        assert_eq!(json["title"], "");
        assert!(json.get("site_name").is_none());
    }

    #[test]
    fn tag_map_serializes_as_plain_object() {
        let tags: TagMap = [("og:title", "X")].into_iter().collect();
        let json = serde_json::to_value(&tags).unwrap();
        assert_eq!(json, serde_json::json!({ "og:title": "X" }));
    }
}
