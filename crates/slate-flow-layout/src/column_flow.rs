//! Deterministic headless measurement oracle.
//!
//! Simulates `column-fill: auto` multi-column flow: elements stack top to
//! bottom in a column and move to the next column when they do not fit.
//! Text height comes from an average-advance glyph estimate, so results are
//! stable across machines. Useful for tests, benches and server-side
//! pre-pagination where no real rendering surface exists.

use std::collections::BTreeMap;

use slate_flow::plain_text;

use crate::block_compiler::{ElementKey, SpacerKind, TextRun, UnitBody, UnitKey, UnitPart, VisualUnit};
use crate::layout_ir::Rect;
use crate::oracle::{MeasurementOracle, OracleError, SurfaceSpec};

/// Metric knobs for [`ColumnFlowOracle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowMetrics {
    /// Average glyph advance as a fraction of the font size.
    pub advance_em: f32,
    /// Vertical gap after every stacked element.
    pub block_gap_px: f32,
    /// Height of a line-break spacer.
    pub line_spacer_px: f32,
    /// Height of a column-break spacer.
    pub column_spacer_px: f32,
}

impl Default for FlowMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.5,
            block_gap_px: 8.0,
            line_spacer_px: 32.0,
            column_spacer_px: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
struct FlowSurface {
    spec: SurfaceSpec,
    units: Vec<VisualUnit>,
    settled: BTreeMap<ElementKey, Rect>,
    overflowing: bool,
}

/// Flow cursor over the columns of one surface.
struct FlowCursor<'a> {
    spec: &'a SurfaceSpec,
    origin: (f32, f32),
    gap_after: f32,
    column: usize,
    y: f32,
    overflowing: bool,
}

impl FlowCursor<'_> {
    /// Place a box of `width` x `height` and return its rect.
    fn place(&mut self, width: f32, height: f32) -> Rect {
        if self.y > 0.0 && self.y + height > self.spec.height {
            self.column += 1;
            self.y = 0.0;
        }
        if self.column >= self.spec.column_count || self.y + height > self.spec.height {
            self.overflowing = true;
        }
        let rect = Rect::new(
            self.origin.0 + self.column as f32 * self.spec.column_stride(),
            self.origin.1 + self.y,
            width,
            height,
        );
        self.y += height + self.gap_after;
        rect
    }

    fn break_column(&mut self) {
        self.column += 1;
        self.y = 0.0;
    }
}

/// Headless column-flow oracle.
#[derive(Clone, Debug)]
pub struct ColumnFlowOracle {
    metrics: FlowMetrics,
    origin: (f32, f32),
    surface: Option<FlowSurface>,
    attach_count: usize,
    detach_count: usize,
    settle_count: usize,
}

impl Default for ColumnFlowOracle {
    fn default() -> Self {
        Self::new(FlowMetrics::default())
    }
}

impl ColumnFlowOracle {
    pub fn new(metrics: FlowMetrics) -> Self {
        Self {
            metrics,
            origin: (0.0, 0.0),
            surface: None,
            attach_count: 0,
            detach_count: 0,
            settle_count: 0,
        }
    }

    /// Report surface geometry offset by `(left, top)`, like a surface that
    /// lives somewhere inside a larger document.
    pub fn with_origin(mut self, left: f32, top: f32) -> Self {
        self.origin = (left, top);
        self
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }

    pub fn settle_count(&self) -> usize {
        self.settle_count
    }

    fn reflow(&mut self) {
        let metrics = self.metrics;
        let origin = self.origin;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let column_width = surface.spec.column_width();
        let mut cursor = FlowCursor {
            spec: &surface.spec,
            origin,
            gap_after: metrics.block_gap_px,
            column: 0,
            y: 0.0,
            overflowing: false,
        };
        let mut settled = BTreeMap::new();

        for unit in &surface.units {
            let step_index = unit.step_index();
            match &unit.body {
                UnitBody::Spacer(kind) => {
                    let height = match kind {
                        SpacerKind::Line => metrics.line_spacer_px,
                        SpacerKind::Column => metrics.column_spacer_px,
                    };
                    let rect = cursor.place(column_width, height);
                    settled.insert(ElementKey::Spacer { step_index }, rect);
                    if *kind == SpacerKind::Column {
                        cursor.break_column();
                    }
                }
                UnitBody::Flow(parts) => {
                    for part in parts {
                        match part {
                            UnitPart::Text(run) => {
                                let (width, height) = estimate_text(&metrics, run, column_width);
                                let rect = cursor.place(width, height);
                                settled.insert(
                                    ElementKey::Segment {
                                        step_index,
                                        segment_id: run.segment_id.clone(),
                                    },
                                    rect,
                                );
                            }
                            UnitPart::Media(row) => {
                                let row_rect =
                                    cursor.place(row.total_width(cursor.spec.gap), row.height);
                                let mut left = row_rect.left;
                                for cell in &row.cells {
                                    settled.insert(
                                        ElementKey::Segment {
                                            step_index,
                                            segment_id: cell.segment_id.clone(),
                                        },
                                        Rect::new(left, row_rect.top, cell.width, cell.height),
                                    );
                                    left += cell.width + cursor.spec.gap;
                                }
                            }
                        }
                    }
                }
            }
        }

        surface.overflowing = cursor.overflowing;
        surface.settled = settled;
    }
}

fn estimate_text(metrics: &FlowMetrics, run: &TextRun, column_width: f32) -> (f32, f32) {
    let text = plain_text(run.display_html());
    let advance = run.style.font_size_px * metrics.advance_em;
    let mut lines = 0usize;
    let mut widest = 0.0f32;
    for paragraph in text.split('\n') {
        let chars = paragraph.chars().count().max(1);
        let width = chars as f32 * advance;
        lines += ((width / column_width).ceil() as usize).max(1);
        widest = widest.max(width.min(column_width));
    }
    (widest, lines as f32 * run.style.line_height_px())
}

impl MeasurementOracle for ColumnFlowOracle {
    fn attach_surface(&mut self, spec: &SurfaceSpec) -> Result<(), OracleError> {
        if self.surface.is_some() {
            return Err(OracleError::SurfaceBusy);
        }
        if !(spec.width > 0.0 && spec.height > 0.0) {
            return Err(OracleError::SurfaceUnavailable(format!(
                "degenerate surface {}x{}",
                spec.width, spec.height
            )));
        }
        self.surface = Some(FlowSurface {
            spec: SurfaceSpec {
                column_count: spec.column_count.max(1),
                ..*spec
            },
            units: Vec::with_capacity(16),
            settled: BTreeMap::new(),
            overflowing: false,
        });
        self.attach_count += 1;
        Ok(())
    }

    fn detach_surface(&mut self) {
        if self.surface.take().is_some() {
            self.detach_count += 1;
        }
    }

    fn clear_surface(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.units.clear();
            surface.settled.clear();
            surface.overflowing = false;
        }
    }

    fn append_unit(&mut self, unit: &VisualUnit) {
        if let Some(surface) = self.surface.as_mut() {
            surface.units.push(unit.clone());
        }
    }

    fn remove_unit(&mut self, key: UnitKey) {
        if let Some(surface) = self.surface.as_mut() {
            surface.units.retain(|unit| unit.key != key);
            surface
                .settled
                .retain(|element, _| element.step_index() != key.0);
        }
    }

    fn surface_bounds(&self) -> Option<Rect> {
        self.surface.as_ref().map(|surface| {
            Rect::new(
                self.origin.0,
                self.origin.1,
                surface.spec.width,
                surface.spec.height,
            )
        })
    }

    fn measure_rect(&self, element: &ElementKey) -> Option<Rect> {
        self.surface.as_ref()?.settled.get(element).copied()
    }

    fn is_overflowing(&self) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.overflowing)
    }

    async fn await_layout_settled(&mut self) {
        self.reflow();
        self.settle_count += 1;
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_compiler::{MediaCell, MediaRow};
    use slate_flow::{DefaultStyleResolver, MediaType, SegmentStyle, StyleResolver};

    fn spec(column_count: usize) -> SurfaceSpec {
        SurfaceSpec {
            width: 1216.0,
            height: 656.0,
            column_count,
            gap: 24.0,
        }
    }

    fn text_unit(step_index: usize, segment_id: &str, text: &str) -> VisualUnit {
        let style = DefaultStyleResolver::default().to_render_style(&SegmentStyle::default());
        VisualUnit {
            key: UnitKey(step_index),
            block_id: format!("b{step_index}"),
            body: UnitBody::Flow(vec![UnitPart::Text(TextRun {
                segment_id: segment_id.to_string(),
                order_index: 0,
                html: text.to_string(),
                style,
                typeset_html: None,
            })]),
        }
    }

    fn segment_key(step_index: usize, segment_id: &str) -> ElementKey {
        ElementKey::Segment {
            step_index,
            segment_id: segment_id.to_string(),
        }
    }

    #[tokio::test]
    async fn measurements_appear_only_after_settle() {
        let mut oracle = ColumnFlowOracle::default().with_origin(100.0, 50.0);
        oracle.attach_surface(&spec(1)).expect("attach should pass");
        oracle.append_unit(&text_unit(0, "s0", "<b>Hello</b>"));
        assert!(oracle.measure_rect(&segment_key(0, "s0")).is_none());

        oracle.await_layout_settled().await;
        let rect = oracle
            .measure_rect(&segment_key(0, "s0"))
            .expect("settled element should measure");
        assert_eq!((rect.left, rect.top), (100.0, 50.0));
        assert_eq!(rect.width, 5.0 * 14.0);
        assert!((rect.height - 39.2).abs() < 1e-3);
        assert!(!oracle.is_overflowing());
        assert_eq!(oracle.settle_count(), 1);
    }

    #[tokio::test]
    async fn long_text_wraps_into_multiple_lines() {
        let mut oracle = ColumnFlowOracle::default();
        oracle.attach_surface(&spec(1)).expect("attach should pass");
        let text = "x".repeat(200);
        oracle.append_unit(&text_unit(0, "s0", &text));
        oracle.await_layout_settled().await;
        let rect = oracle
            .measure_rect(&segment_key(0, "s0"))
            .expect("settled element should measure");
        // 200 glyphs * 14px = 2800px over a 1216px column -> 3 lines.
        assert_eq!(rect.width, 1216.0);
        assert!((rect.height - 3.0 * 39.2).abs() < 1e-3);
    }

    #[tokio::test]
    async fn content_flows_into_next_column_then_overflows() {
        let mut oracle = ColumnFlowOracle::default();
        oracle.attach_surface(&spec(2)).expect("attach should pass");
        for step in 0..14 {
            oracle.append_unit(&text_unit(step, &format!("s{step}"), "line"));
        }
        oracle.await_layout_settled().await;
        assert!(!oracle.is_overflowing());
        let last_in_first = oracle
            .measure_rect(&segment_key(13, "s13"))
            .expect("measured");
        assert_eq!(last_in_first.left, 0.0);

        oracle.append_unit(&text_unit(14, "s14", "line"));
        oracle.await_layout_settled().await;
        let wrapped = oracle.measure_rect(&segment_key(14, "s14")).expect("measured");
        assert_eq!((wrapped.left, wrapped.top), (620.0, 0.0));
        assert!(!oracle.is_overflowing());

        for step in 15..28 {
            oracle.append_unit(&text_unit(step, &format!("s{step}"), "line"));
        }
        oracle.await_layout_settled().await;
        assert!(!oracle.is_overflowing());
        oracle.append_unit(&text_unit(28, "s28", "line"));
        oracle.await_layout_settled().await;
        assert!(oracle.is_overflowing());

        oracle.remove_unit(UnitKey(28));
        assert!(oracle.measure_rect(&segment_key(28, "s28")).is_none());
        oracle.await_layout_settled().await;
        assert!(!oracle.is_overflowing());
    }

    #[tokio::test]
    async fn column_spacer_pushes_following_content_to_next_column() {
        let mut oracle = ColumnFlowOracle::default();
        oracle.attach_surface(&spec(2)).expect("attach should pass");
        oracle.append_unit(&text_unit(0, "s0", "a"));
        oracle.append_unit(&VisualUnit {
            key: UnitKey(1),
            block_id: "brk".to_string(),
            body: UnitBody::Spacer(SpacerKind::Column),
        });
        oracle.append_unit(&text_unit(2, "s2", "b"));
        oracle.await_layout_settled().await;
        let spacer = oracle
            .measure_rect(&ElementKey::Spacer { step_index: 1 })
            .expect("spacer measured");
        assert_eq!(spacer.left, 0.0);
        let after = oracle.measure_rect(&segment_key(2, "s2")).expect("measured");
        assert_eq!((after.left, after.top), (620.0, 0.0));

        oracle.append_unit(&VisualUnit {
            key: UnitKey(3),
            block_id: "brk2".to_string(),
            body: UnitBody::Spacer(SpacerKind::Column),
        });
        oracle.append_unit(&text_unit(4, "s4", "c"));
        oracle.await_layout_settled().await;
        assert!(oracle.is_overflowing());
    }

    #[tokio::test]
    async fn media_row_cells_are_placed_side_by_side() {
        let mut oracle = ColumnFlowOracle::default();
        oracle.attach_surface(&spec(1)).expect("attach should pass");
        let cell = |id: &str, width: f32| MediaCell {
            segment_id: id.to_string(),
            order_index: 0,
            src: format!("{id}.png"),
            media_type: MediaType::Image,
            width,
            height: 200.0,
        };
        oracle.append_unit(&VisualUnit {
            key: UnitKey(0),
            block_id: "b0".to_string(),
            body: UnitBody::Flow(vec![UnitPart::Media(MediaRow {
                height: 200.0,
                cells: vec![cell("m0", 300.0), cell("m1", 150.0)],
            })]),
        });
        oracle.await_layout_settled().await;
        let second = oracle.measure_rect(&segment_key(0, "m1")).expect("measured");
        assert_eq!(second, Rect::new(324.0, 0.0, 150.0, 200.0));
    }

    #[test]
    fn attach_twice_is_rejected_and_detach_is_idempotent() {
        let mut oracle = ColumnFlowOracle::default();
        oracle.attach_surface(&spec(1)).expect("attach should pass");
        assert_eq!(
            oracle.attach_surface(&spec(1)),
            Err(OracleError::SurfaceBusy)
        );
        oracle.detach_surface();
        oracle.detach_surface();
        assert_eq!(oracle.detach_count(), 1);
        assert!(oracle.surface_bounds().is_none());
    }

    #[test]
    fn degenerate_surfaces_are_unavailable() {
        let mut oracle = ColumnFlowOracle::default();
        let spec = SurfaceSpec {
            width: 0.0,
            ..spec(1)
        };
        assert!(matches!(
            oracle.attach_surface(&spec),
            Err(OracleError::SurfaceUnavailable(_))
        ));
        assert!(!oracle.is_attached());
    }
}
