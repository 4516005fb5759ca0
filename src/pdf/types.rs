//! Shared record types for document views

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the derived views a [`LazyDocumentView`](super::LazyDocumentView) exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Metadata,
    Text,
    Images,
    Tables,
    Links,
    Annotations,
}

impl ViewKind {
    pub const ALL: [ViewKind; 6] = [
        ViewKind::Metadata,
        ViewKind::Text,
        ViewKind::Images,
        ViewKind::Tables,
        ViewKind::Links,
        ViewKind::Annotations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Metadata => "metadata",
            ViewKind::Text => "text",
            ViewKind::Images => "images",
            ViewKind::Tables => "tables",
            ViewKind::Links => "links",
            ViewKind::Annotations => "annotations",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rectangle in PDF user space (left, top, right, bottom).
///
/// Serialized as a four element array, the shape PDF libraries hand out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).abs()
    }

    pub fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }
}

impl From<[f32; 4]> for Rect {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl From<Rect> for [f32; 4] {
    fn from(rect: Rect) -> Self {
        [rect.left, rect.top, rect.right, rect.bottom]
    }
}

/// Point in PDF user space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Document-level metadata.
///
/// Every field is optional; documents routinely omit most of the information
/// dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub producer: Option<String>,
    /// Format and version, e.g. `PDF 1.7`
    pub format: Option<String>,
    /// Security handler in use; `None` for unencrypted documents
    pub encryption: Option<String>,
    pub author: Option<String>,
    pub modification_date: Option<String>,
    pub keywords: Option<String>,
    pub title: Option<String>,
    pub creation_date: Option<String>,
    pub creator: Option<String>,
    pub subject: Option<String>,
    pub trapped: Option<String>,
}

impl Metadata {
    pub fn creation_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.creation_date.as_deref().and_then(parse_pdf_date)
    }

    pub fn modification_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.modification_date.as_deref().and_then(parse_pdf_date)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Everything after the year is optional. A missing offset is read as UTC.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);

    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, zone) = value.split_at(digits_end);
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(s) => s.parse().ok(),
            None if digits.len() <= start => Some(default),
            None => None,
        }
    };

    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = parse_pdf_offset(zone)?;
    offset.from_local_datetime(&naive).single()
}

fn parse_pdf_offset(zone: &str) -> Option<FixedOffset> {
    let sign = match zone.chars().next() {
        None | Some('Z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };

    let parts: Vec<u32> = zone[1..]
        .split('\'')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<_>>>()?;
    let hours = parts.first().copied().unwrap_or(0);
    let minutes = parts.get(1).copied().unwrap_or(0);
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
}

/// Annotation subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Text,
    Link,
    FreeText,
    Line,
    Square,
    Circle,
    Polygon,
    Polyline,
    Highlight,
    Underline,
    Squiggly,
    Strikeout,
    Stamp,
    Caret,
    Ink,
    Popup,
    FileAttachment,
    Sound,
    Movie,
    Widget,
    Screen,
    PrinterMark,
    TrapNet,
    Watermark,
    ThreeD,
    RichMedia,
    XfaWidget,
    Redacted,
    Unknown,
}

impl AnnotationKind {
    /// Markup annotations cover a span of page text
    pub fn is_text_markup(&self) -> bool {
        matches!(
            self,
            AnnotationKind::Highlight
                | AnnotationKind::Underline
                | AnnotationKind::Squiggly
                | AnnotationKind::Strikeout
        )
    }
}

/// Page annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Page number (1-indexed)
    pub page: u32,
    pub kind: AnnotationKind,
    /// Text content (comment, note)
    pub contents: Option<String>,
    /// Author name
    pub author: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub rect: Option<Rect>,
    /// Fill color (hex format)
    pub color: Option<String>,
    /// Text under highlight/underline/squiggly/strikeout markup
    pub highlighted_text: Option<String>,
}

impl Annotation {
    pub fn new(page: u32, kind: AnnotationKind) -> Self {
        Self {
            page,
            kind,
            contents: None,
            author: None,
            created: None,
            modified: None,
            rect: None,
            color: None,
            highlighted_text: None,
        }
    }
}
