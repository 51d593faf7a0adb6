#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use slate_flow::{BlockKind, SegmentStyle, StepBlock, StepSegment};
use slate_flow_layout::{
    AutoLayoutEngine, ColumnFlowOracle, ElementKey, LayoutContext, LayoutDiagnostic,
    LayoutOptions, MeasurementOracle, OracleError, PageRatio, Rect, SurfaceSpec, UnitKey,
    VisualUnit,
};

pub fn text_block(id: &str, text: &str) -> StepBlock {
    StepBlock::content(
        id,
        vec![StepSegment::text(
            format!("{id}-t"),
            0,
            text,
            SegmentStyle::default(),
        )],
    )
}

pub fn image_block(id: &str, width: f32, height: f32) -> StepBlock {
    StepBlock::content(
        id,
        vec![StepSegment::image(
            format!("{id}-img"),
            0,
            format!("{id}.png"),
            Some((width, height)),
        )],
    )
}

pub fn marker(id: &str, kind: BlockKind) -> StepBlock {
    StepBlock::marker(id, kind)
}

/// `count` one-line text blocks named `b0..`.
pub fn short_blocks(count: usize) -> Vec<StepBlock> {
    (0..count)
        .map(|idx| text_block(&format!("b{idx}"), "line"))
        .collect()
}

pub fn widescreen(column_count: usize) -> LayoutContext {
    LayoutContext::new(PageRatio::Widescreen, column_count, "slide")
}

pub fn engine() -> AutoLayoutEngine<ColumnFlowOracle> {
    AutoLayoutEngine::new(ColumnFlowOracle::default(), LayoutOptions::default())
}

pub fn engine_with(opts: LayoutOptions) -> AutoLayoutEngine<ColumnFlowOracle> {
    AutoLayoutEngine::new(ColumnFlowOracle::default(), opts)
}

pub type Diagnostics = Arc<Mutex<Vec<LayoutDiagnostic>>>;

/// Attach a collecting diagnostics sink.
pub fn collect_diagnostics<O, T, F>(engine: &mut AutoLayoutEngine<O, T, F>) -> Diagnostics {
    let seen: Diagnostics = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.set_diagnostic_sink(move |diagnostic| {
        sink.lock().expect("diagnostics lock").push(diagnostic);
    });
    seen
}

/// Oracle that loses track of one segment id.
#[derive(Debug, Default)]
pub struct BlindSpotOracle {
    pub inner: ColumnFlowOracle,
    pub hidden_segment: String,
}

impl MeasurementOracle for BlindSpotOracle {
    fn attach_surface(&mut self, spec: &SurfaceSpec) -> Result<(), OracleError> {
        self.inner.attach_surface(spec)
    }

    fn detach_surface(&mut self) {
        self.inner.detach_surface();
    }

    fn clear_surface(&mut self) {
        self.inner.clear_surface();
    }

    fn append_unit(&mut self, unit: &VisualUnit) {
        self.inner.append_unit(unit);
    }

    fn remove_unit(&mut self, key: UnitKey) {
        self.inner.remove_unit(key);
    }

    fn surface_bounds(&self) -> Option<Rect> {
        self.inner.surface_bounds()
    }

    fn measure_rect(&self, element: &ElementKey) -> Option<Rect> {
        match element {
            ElementKey::Segment { segment_id, .. } if *segment_id == self.hidden_segment => None,
            _ => self.inner.measure_rect(element),
        }
    }

    fn is_overflowing(&self) -> bool {
        self.inner.is_overflowing()
    }

    async fn await_layout_settled(&mut self) {
        self.inner.await_layout_settled().await;
    }
}
