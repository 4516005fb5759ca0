//! Link records

use super::types::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Library-native link record: a loosely shaped map whose keys vary between
/// library versions.
pub type LinkRecord = Map<String, Value>;

/// Legacy key some library versions use for the link's source rectangle
pub const LEGACY_RECT_KEY: &str = "from";
/// Canonical key for the link's source rectangle
pub const RECT_KEY: &str = "rect";

/// Link action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    #[default]
    None,
    /// Destination in the same document
    Goto,
    /// External URI
    Uri,
    /// Launch an application or file
    Launch,
    /// Named action
    Named,
    /// Destination in another document
    GotoR,
}

/// Link on a page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub kind: LinkKind,
    /// Cross-reference number of the link annotation. PDFium does not
    /// expose object numbers, so PDFium-backed links carry 0.
    pub xref: u32,
    /// Target page (1-indexed) for internal links
    pub page: Option<u32>,
    /// Destination point on the target page
    pub to: Option<Point>,
    /// Destination zoom factor (0 when unspecified)
    pub zoom: f32,
    /// Link identifier; empty for PDFium-backed links
    pub id: String,
    /// Clickable area on the source page
    pub rect: Option<Rect>,
    /// URI for external links
    pub uri: Option<String>,
    /// Page the link sits on (1-indexed)
    pub source_page: u32,
}

impl Link {
    /// Decode a library-native record, unifying the rectangle key.
    pub fn from_record(record: LinkRecord) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(normalize_record(record)))
    }
}

/// Move a legacy `from` rectangle to `rect`. A record that already carries
/// `rect` keeps it and drops the legacy entry.
pub fn normalize_record(mut record: LinkRecord) -> LinkRecord {
    if let Some(rect) = record.remove(LEGACY_RECT_KEY) {
        record.entry(RECT_KEY).or_insert(rect);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> LinkRecord {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_legacy_rect_key_is_renamed() {
        let legacy = json!({"kind": "uri", "from": [1.0, 2.0, 3.0, 4.0]});
        let normalized = normalize_record(record(legacy));
        assert!(!normalized.contains_key("from"));
        assert_eq!(normalized["rect"], json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_canonical_rect_wins_over_legacy() {
        let normalized = normalize_record(record(json!({
            "rect": [0.0, 0.0, 1.0, 1.0],
            "from": [9.0, 9.0, 9.0, 9.0],
        })));
        assert_eq!(normalized["rect"], json!([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn test_decode_uri_link() {
        let link = Link::from_record(record(json!({
            "kind": "uri",
            "uri": "https://example.com",
            "from": [10.0, 20.0, 110.0, 8.0],
            "xref": 12,
        })))
        .unwrap();

        assert_eq!(link.kind, LinkKind::Uri);
        assert_eq!(link.uri.as_deref(), Some("https://example.com"));
        assert_eq!(link.rect, Some(Rect::new(10.0, 20.0, 110.0, 8.0)));
        assert_eq!(link.xref, 12);
        assert_eq!(link.page, None);
    }

    #[test]
    fn test_decode_goto_link() {
        let link = Link::from_record(record(json!({
            "kind": "goto",
            "page": 3,
            "to": [72.0, 700.0],
            "zoom": 1.5,
        })))
        .unwrap();

        assert_eq!(link.kind, LinkKind::Goto);
        assert_eq!(link.page, Some(3));
        assert_eq!(link.to, Some(Point { x: 72.0, y: 700.0 }));
        assert_eq!(link.zoom, 1.5);
        assert!(link.rect.is_none());
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        assert!(Link::from_record(record(json!({"kind": "teleport"}))).is_err());
        assert!(Link::from_record(record(json!({"from": "nowhere"}))).is_err());
    }
}
