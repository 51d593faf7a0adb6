//! Compilation of timeline blocks into measurable visual units.
//!
//! Nothing here measures. A [`VisualUnit`] is what gets appended to a
//! measurement surface; its [`ElementKey`]s are how measurements are looked up
//! afterwards.

use slate_flow::{
    HtmlSanitizer, MediaSegment, MediaType, RenderTextStyle, StepBlock, StepSegment, StyleResolver,
};

/// Aspect ratio assumed for videos without size hints.
pub const DEFAULT_VIDEO_RATIO: f32 = 16.0 / 9.0;
/// Aspect ratio assumed for other media without size hints.
pub const DEFAULT_MEDIA_RATIO: f32 = 1.0;

/// Identity of a unit on a surface: the step index of its block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey(pub usize);

/// Addressable sub-element of an appended unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    /// A text run or media cell.
    Segment { step_index: usize, segment_id: String },
    /// The spacer of a line/column break.
    Spacer { step_index: usize },
}

impl ElementKey {
    pub fn step_index(&self) -> usize {
        match self {
            Self::Segment { step_index, .. } | Self::Spacer { step_index } => *step_index,
        }
    }
}

/// Spacer flavor for break blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpacerKind {
    /// Consumes vertical space only.
    Line,
    /// Forces following content into the next column.
    Column,
}

/// Styled text run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub segment_id: String,
    pub order_index: usize,
    /// Sanitized source markup.
    pub html: String,
    pub style: RenderTextStyle,
    /// Typeset markup replacing `html` on the surface, when math typesetting ran.
    pub typeset_html: Option<String>,
}

impl TextRun {
    /// Markup as it should appear on the measurement surface.
    pub fn display_html(&self) -> &str {
        self.typeset_html.as_deref().unwrap_or(self.html.as_str())
    }
}

/// One cell of a media row.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaCell {
    pub segment_id: String,
    pub order_index: usize,
    pub src: String,
    pub media_type: MediaType,
    pub width: f32,
    pub height: f32,
}

/// Horizontally packed run of consecutive media segments.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRow {
    /// Shared row height.
    pub height: f32,
    pub cells: Vec<MediaCell>,
}

impl MediaRow {
    /// Width of all cells plus inner gaps.
    pub fn total_width(&self, gap: f32) -> f32 {
        let cells: f32 = self.cells.iter().map(|cell| cell.width).sum();
        cells + gap * self.cells.len().saturating_sub(1) as f32
    }
}

/// Stacked element inside a content unit.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitPart {
    Text(TextRun),
    Media(MediaRow),
}

/// Unit payload.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitBody {
    /// Content parts in vertical order.
    Flow(Vec<UnitPart>),
    /// Single spacer element for a break block.
    Spacer(SpacerKind),
}

/// Measurable visual unit for one block.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualUnit {
    pub key: UnitKey,
    pub block_id: String,
    pub body: UnitBody,
}

impl VisualUnit {
    pub fn step_index(&self) -> usize {
        self.key.0
    }

    /// Keys of every addressable element, in emission order.
    pub fn element_keys(&self) -> Vec<ElementKey> {
        let step_index = self.step_index();
        match &self.body {
            UnitBody::Spacer(_) => vec![ElementKey::Spacer { step_index }],
            UnitBody::Flow(parts) => {
                let mut keys = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        UnitPart::Text(run) => keys.push(ElementKey::Segment {
                            step_index,
                            segment_id: run.segment_id.clone(),
                        }),
                        UnitPart::Media(row) => {
                            keys.extend(row.cells.iter().map(|cell| ElementKey::Segment {
                                step_index,
                                segment_id: cell.segment_id.clone(),
                            }));
                        }
                    }
                }
                keys
            }
        }
    }

    pub fn has_text(&self) -> bool {
        match &self.body {
            UnitBody::Flow(parts) => parts.iter().any(|part| matches!(part, UnitPart::Text(_))),
            UnitBody::Spacer(_) => false,
        }
    }

    /// Mutable access to every text run.
    pub fn text_runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        let parts: &mut [UnitPart] = match &mut self.body {
            UnitBody::Flow(parts) => parts.as_mut_slice(),
            UnitBody::Spacer(_) => &mut [],
        };
        parts.iter_mut().filter_map(|part| match part {
            UnitPart::Text(run) => Some(run),
            UnitPart::Media(_) => None,
        })
    }

    /// Drop any typeset output so the sanitized source is shown instead.
    pub fn clear_typeset(&mut self) {
        for run in self.text_runs_mut() {
            run.typeset_html = None;
        }
    }
}

/// Limits for the media row solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MediaRowLimits {
    pub column_width: f32,
    pub gap: f32,
    /// Lower bound for the row height.
    pub min_row_height: f32,
    /// Lower bound for each cell's width and height.
    pub min_cell: f32,
}

/// Solve the shared height and per-cell widths of a media row.
///
/// `A = column_width - gap * (n - 1)`, `H = clamp(A / sum(ratio), min_row,
/// column_width)` with the lower bound winning on narrow columns, and
/// `w_i = max(min_cell, ratio_i * H)`.
pub(crate) fn solve_media_row(ratios: &[f32], limits: MediaRowLimits) -> (f32, Vec<f32>) {
    if ratios.is_empty() {
        return (0.0, Vec::new());
    }
    let gaps = limits.gap * ratios.len().saturating_sub(1) as f32;
    let available = (limits.column_width - gaps).max(1.0);
    let total_ratio: f32 = ratios.iter().sum();
    let raw_height = if total_ratio > 0.0 {
        available / total_ratio
    } else {
        limits.min_row_height
    };
    let height = raw_height
        .min(limits.column_width)
        .max(limits.min_row_height)
        .max(limits.min_cell);
    let widths = ratios
        .iter()
        .map(|ratio| (ratio * height).max(limits.min_cell))
        .collect();
    (height, widths)
}

/// Aspect ratio used when packing a media segment.
pub(crate) fn media_ratio(media: &MediaSegment, media_type: MediaType) -> f32 {
    match (media.intrinsic_ratio(), media_type) {
        (Some(ratio), _) => ratio,
        (None, MediaType::Video) => DEFAULT_VIDEO_RATIO,
        (None, MediaType::Image) => DEFAULT_MEDIA_RATIO,
    }
}

/// Compiled unit plus bookkeeping about what was left out.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CompiledBlock {
    pub unit: VisualUnit,
    /// Segments of unknown kind that were dropped.
    pub dropped_segments: usize,
}

/// Turns blocks into [`VisualUnit`]s.
pub(crate) struct BlockCompiler<'a> {
    sanitizer: &'a dyn HtmlSanitizer,
    styles: &'a dyn StyleResolver,
    limits: MediaRowLimits,
}

impl<'a> BlockCompiler<'a> {
    pub(crate) fn new(
        sanitizer: &'a dyn HtmlSanitizer,
        styles: &'a dyn StyleResolver,
        limits: MediaRowLimits,
    ) -> Self {
        Self {
            sanitizer,
            styles,
            limits,
        }
    }

    /// Compile a content block.
    ///
    /// Consecutive media segments share one row; unknown segment kinds are
    /// dropped and counted.
    pub(crate) fn compile_content(&self, block: &StepBlock, step_index: usize) -> CompiledBlock {
        let mut parts = Vec::with_capacity(block.segments.len());
        let mut pending_media: Vec<(&MediaSegment, MediaType)> = Vec::new();
        let mut dropped_segments = 0usize;

        for segment in block.ordered_segments() {
            match segment {
                StepSegment::Text(text) => {
                    self.flush_media_row(&mut pending_media, &mut parts);
                    parts.push(UnitPart::Text(TextRun {
                        segment_id: text.id.clone(),
                        order_index: text.order_index,
                        html: self.sanitizer.sanitize_non_empty(&text.html),
                        style: self.styles.to_render_style(&text.style),
                        typeset_html: None,
                    }));
                }
                StepSegment::Image(media) => pending_media.push((media, MediaType::Image)),
                StepSegment::Video(media) => pending_media.push((media, MediaType::Video)),
                StepSegment::Unknown => dropped_segments += 1,
            }
        }
        self.flush_media_row(&mut pending_media, &mut parts);

        CompiledBlock {
            unit: VisualUnit {
                key: UnitKey(step_index),
                block_id: block.id.clone(),
                body: UnitBody::Flow(parts),
            },
            dropped_segments,
        }
    }

    /// Compile a line/column break into its spacer unit.
    pub(crate) fn compile_spacer(
        &self,
        block: &StepBlock,
        step_index: usize,
        kind: SpacerKind,
    ) -> VisualUnit {
        VisualUnit {
            key: UnitKey(step_index),
            block_id: block.id.clone(),
            body: UnitBody::Spacer(kind),
        }
    }

    fn flush_media_row(
        &self,
        pending: &mut Vec<(&MediaSegment, MediaType)>,
        parts: &mut Vec<UnitPart>,
    ) {
        if pending.is_empty() {
            return;
        }
        let ratios: Vec<f32> = pending
            .iter()
            .map(|(media, media_type)| media_ratio(media, *media_type))
            .collect();
        let (height, widths) = solve_media_row(&ratios, self.limits);
        let cells = pending
            .drain(..)
            .zip(widths)
            .map(|((media, media_type), width)| MediaCell {
                segment_id: media.id.clone(),
                order_index: media.order_index,
                src: media.src.clone(),
                media_type,
                width,
                height,
            })
            .collect();
        parts.push(UnitPart::Media(MediaRow { height, cells }));
    }
}
