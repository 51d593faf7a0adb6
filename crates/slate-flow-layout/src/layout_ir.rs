//! Layout output: positioned canvas items, anchors and the page map.
//!
//! Everything here is plain data with serde derives, so a result can be
//! snapshotted and diffed by downstream consumers.

use serde::{Deserialize, Serialize};
use slate_flow::{MediaType, RenderTextStyle};
use std::collections::BTreeMap;

/// Page identifier.
pub type PageId = String;

/// Axis-aligned rectangle in surface or page pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Positioned text item on a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    pub id: String,
    /// Sanitized source markup (never the typeset glyph output).
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub z_index: u32,
    pub style: RenderTextStyle,
    pub segment_id: String,
}

/// Positioned image/video item on a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub src: String,
    pub w: f32,
    pub h: f32,
    pub x: f32,
    pub y: f32,
    pub z_index: u32,
    pub segment_id: String,
    pub media_type: MediaType,
}

/// Absolutely positioned, page-local visual item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasItem {
    Text(TextItem),
    Media(MediaItem),
}

impl CanvasItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Text(item) => &item.id,
            Self::Media(item) => &item.id,
        }
    }

    pub fn z_index(&self) -> u32 {
        match self {
            Self::Text(item) => item.z_index,
            Self::Media(item) => item.z_index,
        }
    }

    pub fn segment_id(&self) -> &str {
        match self {
            Self::Text(item) => &item.segment_id,
            Self::Media(item) => &item.segment_id,
        }
    }

    /// Top-left corner in page coordinates.
    pub fn origin(&self) -> (f32, f32) {
        match self {
            Self::Text(item) => (item.x, item.y),
            Self::Media(item) => (item.x, item.y),
        }
    }
}

/// Where one logical unit physically landed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorPosition {
    /// Segment id, or the block id for break blocks.
    pub segment_id: String,
    pub order_index: usize,
    pub step_index: usize,
    pub page_id: PageId,
    /// 0-based column on the page.
    pub column: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// `page id -> step index -> anchors`.
pub type AnchorMap = BTreeMap<PageId, BTreeMap<usize, Vec<AnchorPosition>>>;

/// Stable fingerprint of every layout-affecting input besides the blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutProfileId(pub [u8; 32]);

impl LayoutProfileId {
    /// Build a deterministic profile id from arbitrary payload bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        fn fnv64(seed: u64, payload: &[u8]) -> u64 {
            let mut hash = seed;
            for b in payload {
                hash ^= *b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            hash
        }
        let mut out = [0u8; 32];
        let h0 = fnv64(0xcbf29ce484222325, bytes).to_le_bytes();
        let h1 = fnv64(0x9e3779b97f4a7c15, bytes).to_le_bytes();
        let h2 = fnv64(0xd6e8feb86659fd93, bytes).to_le_bytes();
        let h3 = fnv64(0xa0761d6478bd642f, bytes).to_le_bytes();
        out[0..8].copy_from_slice(&h0);
        out[8..16].copy_from_slice(&h1);
        out[16..24].copy_from_slice(&h2);
        out[24..32].copy_from_slice(&h3);
        Self(out)
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}

/// Immutable snapshot produced by one layout run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoLayoutResult {
    pub pages: BTreeMap<PageId, Vec<CanvasItem>>,
    /// Page ids in creation order.
    pub page_order: Vec<PageId>,
    pub page_column_counts: BTreeMap<PageId, usize>,
    pub anchor_map: AnchorMap,
    /// Profile the snapshot was produced under.
    pub profile: LayoutProfileId,
}

impl AutoLayoutResult {
    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// Items on `page_id`, empty when the page is unknown.
    pub fn items_on_page(&self, page_id: &str) -> &[CanvasItem] {
        self.pages.get(page_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Page that consumed `step_index`.
    pub fn page_for_step(&self, step_index: usize) -> Option<&str> {
        self.page_order
            .iter()
            .find(|page_id| {
                self.anchor_map
                    .get(page_id.as_str())
                    .is_some_and(|steps| steps.contains_key(&step_index))
            })
            .map(String::as_str)
    }

    /// Page and anchors recorded for `step_index`.
    pub fn anchors_for_step(&self, step_index: usize) -> Option<(&str, &[AnchorPosition])> {
        let page_id = self.page_for_step(step_index)?;
        let anchors = self.anchor_map.get(page_id)?.get(&step_index)?;
        Some((page_id, anchors.as_slice()))
    }

    /// Anchor recorded for a content segment (or break block id).
    pub fn anchor_for_segment(&self, segment_id: &str) -> Option<&AnchorPosition> {
        self.page_order.iter().find_map(|page_id| {
            self.anchor_map
                .get(page_id.as_str())?
                .values()
                .flatten()
                .find(|anchor| anchor.segment_id == segment_id)
        })
    }

    /// Every anchor in page creation order, then step order.
    pub fn anchors(&self) -> impl Iterator<Item = &AnchorPosition> {
        self.page_order.iter().flat_map(|page_id| {
            self.anchor_map
                .get(page_id.as_str())
                .into_iter()
                .flat_map(|steps| steps.values().flatten())
        })
    }
}

/// Generator for page and item ids.
///
/// Injected so repeated runs over identical input can be byte-identical.
pub trait IdSource {
    /// Called once at the start of every layout run.
    fn begin_run(&mut self) {}

    /// Id for the `ordinal`-th page allocated after the base page (1-based).
    fn page_id(&mut self, base_page_id: &str, ordinal: usize) -> PageId;

    /// Id for a canvas item emitted for `segment_id` on `page_id`.
    fn item_id(&mut self, page_id: &str, segment_id: &str) -> String;
}

/// Deterministic counter-based ids; counters reset every run.
#[derive(Clone, Debug, Default)]
pub struct SequentialIds {
    next_item: usize,
}

impl IdSource for SequentialIds {
    fn begin_run(&mut self) {
        self.next_item = 0;
    }

    fn page_id(&mut self, base_page_id: &str, ordinal: usize) -> PageId {
        format!("{base_page_id}-p{ordinal}")
    }

    fn item_id(&mut self, _page_id: &str, _segment_id: &str) -> String {
        let id = format!("item-{}", self.next_item);
        self.next_item += 1;
        id
    }
}
