//! Auto-layout engine: flows timeline blocks onto fixed-size pages.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use slate_flow::{
    AllowListSanitizer, BlockKind, DefaultStyleResolver, HtmlSanitizer, StepBlock, StyleResolver,
};

use crate::anchor_index::{page_break_anchor, place_unit, spacer_anchor, AnchorFrame};
use crate::block_compiler::{BlockCompiler, ElementKey, MediaRowLimits, SpacerKind, VisualUnit};
use crate::layout_ir::{
    AnchorMap, AnchorPosition, AutoLayoutResult, CanvasItem, IdSource, LayoutProfileId, PageId,
    Rect, SequentialIds,
};
use crate::oracle::{
    FontGate, FontsReady, MeasurementOracle, OracleError, ScratchSurface, SurfaceSpec,
};
use crate::typeset::{MathTypesetter, PassthroughTypesetter, TypesetError};

/// Largest supported column count per page.
pub const MAX_COLUMNS: usize = 4;

/// Cancellation hook for long-running layout runs.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Never-cancel token for default call paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared flag that can be flipped from another task or thread.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl CancelToken for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runtime diagnostics from a layout run.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutDiagnostic {
    LayoutTimeMs(u32),
    Cancelled,
    /// A block did not fit and was retried on a fresh page.
    Repaginated { step_index: usize, page_id: PageId },
    /// The surface reported no rect for an element; it was skipped.
    SegmentUnmeasured {
        step_index: usize,
        segment_id: String,
    },
    /// A block was placed even though it still overflows its page.
    ForcedOverflow { step_index: usize, block_id: String },
    /// Typesetting failed and the block was laid out from source markup.
    TypesetFallback { step_index: usize, block_id: String },
    /// Segments of unknown kind were left out of a block.
    UnknownSegmentsDropped { step_index: usize, count: usize },
}

type DiagnosticCallback = Arc<Mutex<Box<dyn FnMut(LayoutDiagnostic) + Send + 'static>>>;
type DiagnosticSink = Option<DiagnosticCallback>;

/// Target page size class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageRatio {
    /// 16:9, 1280x720.
    #[default]
    Widescreen,
    /// 4:3, 1024x768.
    Standard,
    /// 1:1, 900x900.
    Square,
    /// A4-like portrait, 794x1123.
    Portrait,
    Custom { width: f32, height: f32 },
}

impl PageRatio {
    /// Page `(width, height)` in pixels.
    pub fn page_size(&self) -> (f32, f32) {
        match *self {
            Self::Widescreen => (1280.0, 720.0),
            Self::Standard => (1024.0, 768.0),
            Self::Square => (900.0, 900.0),
            Self::Portrait => (794.0, 1123.0),
            Self::Custom { width, height } => (width, height),
        }
    }
}

/// Per-document layout inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutContext {
    pub ratio: PageRatio,
    /// Requested columns per page; clamped to `1..=4`.
    pub column_count: usize,
    /// Id of the first page.
    pub base_page_id: PageId,
}

impl LayoutContext {
    pub fn new(ratio: PageRatio, column_count: usize, base_page_id: impl Into<PageId>) -> Self {
        Self {
            ratio,
            column_count,
            base_page_id: base_page_id.into(),
        }
    }

    /// Column count actually used for every page of the run.
    pub fn effective_column_count(&self) -> usize {
        self.column_count.clamp(1, MAX_COLUMNS)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.base_page_id.trim().is_empty() {
            return Err(LayoutError::InvalidContext("base page id is empty"));
        }
        let (width, height) = self.ratio.page_size();
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(LayoutError::InvalidContext("page size must be positive"));
        }
        Ok(())
    }
}

/// What to do when a block still overflows after the retry budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Place the block on its page anyway and report it.
    #[default]
    ForcePlace,
    /// Abort the run with [`LayoutError::BlockTooLarge`].
    Fail,
}

/// What to do when math typesetting fails or times out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypesetFailurePolicy {
    /// Abort the run with [`LayoutError::Typeset`].
    #[default]
    Propagate,
    /// Lay the block out from its untypeset source markup.
    FallBackToSource,
}

/// Engine options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Padding on every page edge.
    pub page_padding: f32,
    /// Gap between columns and between media cells.
    pub column_gap: f32,
    /// Lower bound for media row height.
    pub min_row_height: f32,
    /// Lower bound for media cell width/height.
    pub min_cell: f32,
    /// Fresh-page retries allowed per block before the overflow policy applies.
    pub max_repagination_retries: usize,
    pub overflow_policy: OverflowPolicy,
    pub typeset_failure_policy: TypesetFailurePolicy,
    /// Upper bound for one typesetting call; `None` waits indefinitely.
    pub typeset_timeout: Option<Duration>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_padding: 32.0,
            column_gap: 24.0,
            min_row_height: 120.0,
            min_cell: 60.0,
            max_repagination_retries: 1,
            overflow_policy: OverflowPolicy::default(),
            typeset_failure_policy: TypesetFailurePolicy::default(),
            typeset_timeout: None,
        }
    }
}

impl LayoutOptions {
    /// Scratch surface geometry for a context.
    pub fn surface_spec(&self, ctx: &LayoutContext) -> SurfaceSpec {
        let (width, height) = ctx.ratio.page_size();
        SurfaceSpec {
            width: (width - 2.0 * self.page_padding).max(1.0),
            height: (height - 2.0 * self.page_padding).max(1.0),
            column_count: ctx.effective_column_count(),
            gap: self.column_gap,
        }
    }

    fn media_limits(&self, spec: &SurfaceSpec) -> MediaRowLimits {
        MediaRowLimits {
            column_width: spec.column_width(),
            gap: self.column_gap,
            min_row_height: self.min_row_height,
            min_cell: self.min_cell,
        }
    }
}

/// Per-run configuration.
#[derive(Clone, Copy, Default)]
pub struct RunConfig<'a> {
    cancel: Option<&'a dyn CancelToken>,
}

impl<'a> RunConfig<'a> {
    /// Attach a cancellation token checked at every suspension point.
    pub fn with_cancel(mut self, cancel: &'a dyn CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Layout run error.
#[derive(Debug)]
pub enum LayoutError {
    /// The run was cancelled.
    Cancelled,
    /// A block overflowed a page after every allowed retry.
    BlockTooLarge {
        block_id: String,
        step_index: usize,
        attempts: usize,
    },
    /// Math typesetting failed under the propagate policy.
    Typeset {
        block_id: String,
        step_index: usize,
        source: TypesetError,
    },
    /// The measurement surface could not be set up.
    Surface(OracleError),
    InvalidContext(&'static str),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "layout cancelled"),
            Self::BlockTooLarge {
                block_id,
                step_index,
                attempts,
            } => write!(
                f,
                "block {} (step {}) does not fit on a page after {} attempts",
                block_id, step_index, attempts
            ),
            Self::Typeset {
                block_id,
                step_index,
                source,
            } => write!(f, "block {} (step {}): {}", block_id, step_index, source),
            Self::Surface(err) => write!(f, "measurement surface error: {}", err),
            Self::InvalidContext(reason) => write!(f, "invalid layout context: {}", reason),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Typeset { source, .. } => Some(source),
            Self::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OracleError> for LayoutError {
    fn from(value: OracleError) -> Self {
        Self::Surface(value)
    }
}

struct EngineSlot<O> {
    oracle: O,
    ids: Box<dyn IdSource + Send>,
}

/// Flows blocks onto pages using a measurement oracle as ground truth.
///
/// Runs are serialized: concurrent calls queue on an internal async mutex
/// and execute one at a time in arrival order.
pub struct AutoLayoutEngine<O, T = PassthroughTypesetter, F = FontsReady> {
    opts: LayoutOptions,
    slot: tokio::sync::Mutex<EngineSlot<O>>,
    sanitizer: Arc<dyn HtmlSanitizer>,
    styles: Arc<dyn StyleResolver>,
    typesetter: T,
    fonts: F,
    diagnostic_sink: DiagnosticSink,
}

impl<O, T, F> fmt::Debug for AutoLayoutEngine<O, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoLayoutEngine")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl<O: MeasurementOracle> AutoLayoutEngine<O> {
    /// Create an engine with the default sanitizer, style resolver, no math
    /// typesetting and always-ready fonts.
    pub fn new(oracle: O, opts: LayoutOptions) -> Self {
        Self {
            opts,
            slot: tokio::sync::Mutex::new(EngineSlot {
                oracle,
                ids: Box::new(SequentialIds::default()),
            }),
            sanitizer: Arc::new(AllowListSanitizer::new()),
            styles: Arc::new(DefaultStyleResolver::default()),
            typesetter: PassthroughTypesetter,
            fonts: FontsReady,
            diagnostic_sink: None,
        }
    }
}

impl<O, T, F> AutoLayoutEngine<O, T, F> {
    pub fn with_typesetter<T2>(self, typesetter: T2) -> AutoLayoutEngine<O, T2, F> {
        AutoLayoutEngine {
            opts: self.opts,
            slot: self.slot,
            sanitizer: self.sanitizer,
            styles: self.styles,
            typesetter,
            fonts: self.fonts,
            diagnostic_sink: self.diagnostic_sink,
        }
    }

    pub fn with_font_gate<F2>(self, fonts: F2) -> AutoLayoutEngine<O, T, F2> {
        AutoLayoutEngine {
            opts: self.opts,
            slot: self.slot,
            sanitizer: self.sanitizer,
            styles: self.styles,
            typesetter: self.typesetter,
            fonts,
            diagnostic_sink: self.diagnostic_sink,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_style_resolver(mut self, styles: Arc<dyn StyleResolver>) -> Self {
        self.styles = styles;
        self
    }

    /// Replace the page/item id generator.
    pub fn with_id_source<I>(mut self, ids: I) -> Self
    where
        I: IdSource + Send + 'static,
    {
        self.slot.get_mut().ids = Box::new(ids);
        self
    }

    /// Register or replace the diagnostics sink.
    pub fn set_diagnostic_sink<S>(&mut self, sink: S)
    where
        S: FnMut(LayoutDiagnostic) + Send + 'static,
    {
        self.diagnostic_sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    fn emit_diagnostic(&self, diagnostic: LayoutDiagnostic) {
        let Some(sink) = &self.diagnostic_sink else {
            return;
        };
        if let Ok(mut sink) = sink.lock() {
            sink(diagnostic);
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.opts
    }

    /// Stable fingerprint for all layout-affecting settings of a context.
    pub fn layout_profile_id(&self, ctx: &LayoutContext) -> LayoutProfileId {
        let payload = format!("{:?}|{:?}", self.opts, ctx);
        LayoutProfileId::from_bytes(payload.as_bytes())
    }

    /// Give the oracle back, e.g. to inspect a test oracle after runs.
    pub fn into_oracle(self) -> O {
        self.slot.into_inner().oracle
    }

    fn check_cancel<C: CancelToken + ?Sized>(&self, cancel: &C) -> Result<(), LayoutError> {
        if cancel.is_cancelled() {
            self.emit_diagnostic(LayoutDiagnostic::Cancelled);
            return Err(LayoutError::Cancelled);
        }
        Ok(())
    }
}

impl<O, T, F> AutoLayoutEngine<O, T, F>
where
    O: MeasurementOracle,
    T: MathTypesetter,
    F: FontGate,
{
    /// Lay `blocks` out on pages for `ctx`.
    pub async fn run_auto_layout(
        &self,
        blocks: &[StepBlock],
        ctx: &LayoutContext,
    ) -> Result<AutoLayoutResult, LayoutError> {
        self.run_auto_layout_with_config(blocks, ctx, RunConfig::default())
            .await
    }

    /// Lay `blocks` out with per-run configuration.
    pub async fn run_auto_layout_with_config(
        &self,
        blocks: &[StepBlock],
        ctx: &LayoutContext,
        config: RunConfig<'_>,
    ) -> Result<AutoLayoutResult, LayoutError> {
        let cancel = config.cancel.unwrap_or(&NeverCancel);
        ctx.validate()?;
        let mut slot = self.slot.lock().await;
        let started = Instant::now();
        self.check_cancel(cancel)?;

        let slot = &mut *slot;
        slot.ids.begin_run();
        let spec = self.opts.surface_spec(ctx);
        let state = {
            let mut surface = ScratchSurface::attach(&mut slot.oracle, spec)?;
            self.paginate(&mut surface, slot.ids.as_mut(), blocks, ctx, cancel)
                .await?
        };

        let elapsed = started.elapsed().as_millis().min(u32::MAX as u128) as u32;
        self.emit_diagnostic(LayoutDiagnostic::LayoutTimeMs(elapsed));
        log::debug!(
            "laid out {} blocks on {} pages in {}ms",
            blocks.len(),
            state.page_order.len(),
            elapsed
        );
        Ok(state.into_result(self.layout_profile_id(ctx)))
    }

    async fn paginate<C: CancelToken + ?Sized>(
        &self,
        surface: &mut ScratchSurface<'_, O>,
        ids: &mut dyn IdSource,
        blocks: &[StepBlock],
        ctx: &LayoutContext,
        cancel: &C,
    ) -> Result<PaginationState, LayoutError> {
        let spec = *surface.spec();
        let compiler = BlockCompiler::new(
            self.sanitizer.as_ref(),
            self.styles.as_ref(),
            self.opts.media_limits(&spec),
        );
        let mut state = PaginationState::new(ctx);
        let mut fonts_ready = false;

        for block in blocks {
            self.check_cancel(cancel)?;
            let step_index = state.current_step_index;
            match &block.kind {
                BlockKind::PageBreak => {
                    surface.clear();
                    state.start_page(ids);
                    let frame = state.frame(surface.bounds(), &spec, self.opts.page_padding);
                    state.record(vec![page_break_anchor(&frame, &block.id)]);
                }
                BlockKind::LineBreak | BlockKind::ColumnBreak => {
                    let kind = if block.kind == BlockKind::ColumnBreak {
                        SpacerKind::Column
                    } else {
                        SpacerKind::Line
                    };
                    let unit = compiler.compile_spacer(block, step_index, kind);
                    surface.append_unit(&unit);
                    surface.await_layout_settled().await;
                    self.check_cancel(cancel)?;
                    let frame = state.frame(surface.bounds(), &spec, self.opts.page_padding);
                    match surface.measure_rect(&ElementKey::Spacer { step_index }) {
                        Some(rect) => state.record(vec![spacer_anchor(&frame, &block.id, &rect)]),
                        None => {
                            self.report_unmeasured(step_index, &block.id);
                            state.record(Vec::new());
                        }
                    }
                }
                BlockKind::Content => {
                    if !fonts_ready {
                        surface.await_fonts_ready(&self.fonts).await;
                        fonts_ready = true;
                        self.check_cancel(cancel)?;
                    }
                    let compiled = compiler.compile_content(block, step_index);
                    if compiled.dropped_segments > 0 {
                        self.emit_diagnostic(LayoutDiagnostic::UnknownSegmentsDropped {
                            step_index,
                            count: compiled.dropped_segments,
                        });
                    }
                    let unit = compiled.unit;
                    self.fit_unit(surface, &mut state, ids, block, unit, cancel)
                        .await?;
                }
                BlockKind::Unknown(kind) => {
                    log::warn!(
                        "skipping block {} with unknown kind {:?} at step {}",
                        block.id,
                        kind,
                        step_index
                    );
                    state.record(Vec::new());
                }
            }
            state.current_step_index += 1;
        }
        Ok(state)
    }

    /// Place a content unit, repaginating while it overflows.
    async fn fit_unit<C: CancelToken + ?Sized>(
        &self,
        surface: &mut ScratchSurface<'_, O>,
        state: &mut PaginationState,
        ids: &mut dyn IdSource,
        block: &StepBlock,
        mut unit: VisualUnit,
        cancel: &C,
    ) -> Result<(), LayoutError> {
        let step_index = unit.step_index();
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            if unit.has_text() {
                self.typeset(&mut unit, block).await?;
                self.check_cancel(cancel)?;
            }
            surface.append_unit(&unit);
            surface.await_layout_settled().await;
            self.check_cancel(cancel)?;
            if !surface.is_overflowing() {
                break;
            }

            let alone = surface.unit_count() <= 1;
            if alone || attempts > self.opts.max_repagination_retries {
                match self.opts.overflow_policy {
                    OverflowPolicy::ForcePlace => {
                        log::warn!(
                            "block {} overflows page {} after {} attempts; placing anyway",
                            block.id,
                            state.current_page_id,
                            attempts
                        );
                        self.emit_diagnostic(LayoutDiagnostic::ForcedOverflow {
                            step_index,
                            block_id: block.id.clone(),
                        });
                        break;
                    }
                    OverflowPolicy::Fail => {
                        return Err(LayoutError::BlockTooLarge {
                            block_id: block.id.clone(),
                            step_index,
                            attempts,
                        });
                    }
                }
            }

            surface.remove_unit(unit.key);
            surface.clear();
            let page_id = state.start_page(ids);
            self.emit_diagnostic(LayoutDiagnostic::Repaginated {
                step_index,
                page_id,
            });
        }

        let frame = state.frame(surface.bounds(), surface.spec(), self.opts.page_padding);
        let placement = place_unit(
            &frame,
            &unit,
            state.current_z_index,
            |key| surface.measure_rect(key),
            ids,
        );
        for segment_id in &placement.unmeasured {
            self.report_unmeasured(step_index, segment_id);
        }
        state.current_z_index = placement.next_z(state.current_z_index);
        state.push_items(placement.items);
        state.record(placement.anchors);
        Ok(())
    }

    async fn typeset(&self, unit: &mut VisualUnit, block: &StepBlock) -> Result<(), LayoutError> {
        let outcome = match self.opts.typeset_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.typesetter.typeset(unit)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(TypesetError::TimedOut {
                    after_ms: limit.as_millis().min(u64::MAX as u128) as u64,
                }),
            },
            None => self.typesetter.typeset(unit).await,
        };
        let Err(err) = outcome else {
            return Ok(());
        };
        let step_index = unit.step_index();
        match self.opts.typeset_failure_policy {
            TypesetFailurePolicy::Propagate => Err(LayoutError::Typeset {
                block_id: block.id.clone(),
                step_index,
                source: err,
            }),
            TypesetFailurePolicy::FallBackToSource => {
                log::warn!(
                    "typesetting block {} failed ({}); using source markup",
                    block.id,
                    err
                );
                unit.clear_typeset();
                self.emit_diagnostic(LayoutDiagnostic::TypesetFallback {
                    step_index,
                    block_id: block.id.clone(),
                });
                Ok(())
            }
        }
    }

    fn report_unmeasured(&self, step_index: usize, segment_id: &str) {
        log::warn!(
            "no measurement for {} at step {}; skipping",
            segment_id,
            step_index
        );
        self.emit_diagnostic(LayoutDiagnostic::SegmentUnmeasured {
            step_index,
            segment_id: segment_id.to_string(),
        });
    }
}

/// Mutable cursor and accumulated output of one run.
#[derive(Debug)]
struct PaginationState {
    base_page_id: PageId,
    current_page_id: PageId,
    current_step_index: usize,
    current_z_index: u32,
    column_count: usize,
    pages: BTreeMap<PageId, Vec<CanvasItem>>,
    page_order: Vec<PageId>,
    page_column_counts: BTreeMap<PageId, usize>,
    anchor_map: AnchorMap,
    next_page_ordinal: usize,
}

impl PaginationState {
    fn new(ctx: &LayoutContext) -> Self {
        let mut state = Self {
            base_page_id: ctx.base_page_id.clone(),
            current_page_id: ctx.base_page_id.clone(),
            current_step_index: 0,
            current_z_index: 0,
            column_count: ctx.effective_column_count(),
            pages: BTreeMap::new(),
            page_order: Vec::new(),
            page_column_counts: BTreeMap::new(),
            anchor_map: AnchorMap::new(),
            next_page_ordinal: 0,
        };
        state.register_page(ctx.base_page_id.clone());
        state
    }

    fn register_page(&mut self, page_id: PageId) {
        self.pages.insert(page_id.clone(), Vec::new());
        self.page_column_counts
            .insert(page_id.clone(), self.column_count);
        self.anchor_map.insert(page_id.clone(), BTreeMap::new());
        self.page_order.push(page_id.clone());
        self.current_page_id = page_id;
        self.current_z_index = 0;
    }

    /// Allocate and switch to a new page; ids never repeat within a run.
    fn start_page(&mut self, ids: &mut dyn IdSource) -> PageId {
        self.next_page_ordinal += 1;
        let candidate = ids.page_id(&self.base_page_id, self.next_page_ordinal);
        let mut page_id = candidate.clone();
        let mut suffix = 1usize;
        while self.pages.contains_key(&page_id) {
            page_id = format!("{candidate}-{suffix}");
            suffix += 1;
        }
        log::debug!("starting page {}", page_id);
        self.register_page(page_id.clone());
        page_id
    }

    fn frame(&self, bounds: Rect, spec: &SurfaceSpec, padding: f32) -> AnchorFrame {
        AnchorFrame {
            page_id: self.current_page_id.clone(),
            step_index: self.current_step_index,
            surface_left: bounds.left,
            surface_top: bounds.top,
            padding,
            column_width: spec.column_width(),
            gap: spec.gap,
            column_count: self.column_count,
        }
    }

    fn push_items(&mut self, items: Vec<CanvasItem>) {
        self.pages
            .entry(self.current_page_id.clone())
            .or_default()
            .extend(items);
    }

    /// Record anchors for the current step; an empty list still marks the
    /// step as consumed on this page.
    fn record(&mut self, anchors: Vec<AnchorPosition>) {
        self.anchor_map
            .entry(self.current_page_id.clone())
            .or_default()
            .entry(self.current_step_index)
            .or_default()
            .extend(anchors);
    }

    fn into_result(self, profile: LayoutProfileId) -> AutoLayoutResult {
        AutoLayoutResult {
            pages: self.pages,
            page_order: self.page_order,
            page_column_counts: self.page_column_counts,
            anchor_map: self.anchor_map,
            profile,
        }
    }
}
