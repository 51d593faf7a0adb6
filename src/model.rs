//! Authored step timeline model.
//!
//! Blocks and segments are produced upstream by the editor and are treated as
//! immutable input by layout.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Kind of a timeline block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Renderable content made of ordered segments.
    Content,
    /// Vertical spacer the height of one line.
    LineBreak,
    /// Forces following content into the next column.
    ColumnBreak,
    /// Forces following content onto a new page.
    PageBreak,
    /// Forward-compatible fallback for kinds this crate does not know.
    Unknown(String),
}

impl BlockKind {
    /// Canonical string tag used by serialized timelines.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Content => "content",
            Self::LineBreak => "line-break",
            Self::ColumnBreak => "column-break",
            Self::PageBreak => "page-break",
            Self::Unknown(value) => value.as_str(),
        }
    }

    /// True for line, column and page breaks.
    pub fn is_break(&self) -> bool {
        matches!(self, Self::LineBreak | Self::ColumnBreak | Self::PageBreak)
    }
}

impl From<&str> for BlockKind {
    fn from(value: &str) -> Self {
        match value {
            "content" => Self::Content,
            "line-break" => Self::LineBreak,
            "column-break" => Self::ColumnBreak,
            "page-break" => Self::PageBreak,
            _ => Self::Unknown(value.to_string()),
        }
    }
}

impl From<String> for BlockKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "content" | "line-break" | "column-break" | "page-break" => {
                Self::from(value.as_str())
            }
            _ => Self::Unknown(value),
        }
    }
}

impl From<BlockKind> for String {
    fn from(value: BlockKind) -> Self {
        match value {
            BlockKind::Unknown(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BlockKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from(tag))
    }
}

/// One timeline unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBlock {
    /// Stable block id.
    pub id: String,
    /// Block kind.
    pub kind: BlockKind,
    /// Ordered segments. Only meaningful for [`BlockKind::Content`].
    #[serde(default)]
    pub segments: Vec<StepSegment>,
}

impl StepBlock {
    /// Build a content block.
    pub fn content(id: impl Into<String>, segments: Vec<StepSegment>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Content,
            segments,
        }
    }

    /// Build a break block of the given kind with no segments.
    pub fn marker(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            segments: Vec::new(),
        }
    }

    /// Segments sorted by `order_index`, ties kept in authored order.
    pub fn ordered_segments(&self) -> Vec<&StepSegment> {
        let mut segments: Vec<&StepSegment> = self.segments.iter().collect();
        segments.sort_by_key(|segment| segment.order_index());
        segments
    }
}

/// Abstract text style authored with a segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStyle {
    /// Font family stack, e.g. `"KaTeX_Main, serif"`.
    #[serde(default)]
    pub font_family: Option<String>,
    /// Font size in px.
    #[serde(default)]
    pub font_size: Option<f32>,
    /// Numeric weight or keyword (`"bold"`, `"normal"`).
    #[serde(default)]
    pub font_weight: Option<String>,
    /// CSS color string.
    #[serde(default)]
    pub color: Option<String>,
}

/// Media kind for non-text segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// One piece of content inside a content block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepSegment {
    /// Styled rich-text run.
    Text(TextSegment),
    /// Still image.
    Image(MediaSegment),
    /// Video clip.
    Video(MediaSegment),
    /// Segment kind this crate does not know. Dropped by layout.
    #[serde(other)]
    Unknown,
}

impl StepSegment {
    /// Segment id, when the kind is known.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.id.as_str()),
            Self::Image(media) | Self::Video(media) => Some(media.id.as_str()),
            Self::Unknown => None,
        }
    }

    /// Position within the owning block. Unknown segments sort last.
    pub fn order_index(&self) -> usize {
        match self {
            Self::Text(text) => text.order_index,
            Self::Image(media) | Self::Video(media) => media.order_index,
            Self::Unknown => usize::MAX,
        }
    }

    /// Media type for image/video segments.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::Image(_) => Some(MediaType::Image),
            Self::Video(_) => Some(MediaType::Video),
            Self::Text(_) | Self::Unknown => None,
        }
    }

    /// Convenience constructor for a text segment.
    pub fn text(
        id: impl Into<String>,
        order_index: usize,
        html: impl Into<String>,
        style: SegmentStyle,
    ) -> Self {
        Self::Text(TextSegment {
            id: id.into(),
            order_index,
            html: html.into(),
            style,
        })
    }

    /// Convenience constructor for an image segment.
    pub fn image(
        id: impl Into<String>,
        order_index: usize,
        src: impl Into<String>,
        size: Option<(f32, f32)>,
    ) -> Self {
        Self::Image(MediaSegment::new(id, order_index, src, size))
    }

    /// Convenience constructor for a video segment.
    pub fn video(
        id: impl Into<String>,
        order_index: usize,
        src: impl Into<String>,
        size: Option<(f32, f32)>,
    ) -> Self {
        Self::Video(MediaSegment::new(id, order_index, src, size))
    }
}

/// Text segment payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    pub id: String,
    pub order_index: usize,
    /// Authored markup. Untrusted until sanitized.
    pub html: String,
    #[serde(default)]
    pub style: SegmentStyle,
}

/// Image/video segment payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSegment {
    pub id: String,
    pub order_index: usize,
    /// Media locator.
    pub src: String,
    /// Intrinsic width hint.
    #[serde(default)]
    pub width: Option<f32>,
    /// Intrinsic height hint.
    #[serde(default)]
    pub height: Option<f32>,
}

impl MediaSegment {
    fn new(
        id: impl Into<String>,
        order_index: usize,
        src: impl Into<String>,
        size: Option<(f32, f32)>,
    ) -> Self {
        Self {
            id: id.into(),
            order_index,
            src: src.into(),
            width: size.map(|(w, _)| w),
            height: size.map(|(_, h)| h),
        }
    }

    /// Intrinsic `width / height` when both hints are present and positive.
    pub fn intrinsic_ratio(&self) -> Option<f32> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite() => {
                Some(w / h)
            }
            _ => None,
        }
    }
}
