//! Content flow layout and pagination for `slate-flow` timelines.
//!
//! Blocks are compiled into visual units, measured on a scratch surface
//! hosted by a [`MeasurementOracle`], and flowed onto fixed-size pages. The
//! result maps every step of the timeline to where it physically landed.
//!
//! The async traits here ([`MeasurementOracle`], [`MathTypesetter`],
//! [`FontGate`]) do not require `Send` futures, so a layout run is driven on
//! the task that owns the engine (a current-thread runtime or a `LocalSet`)
//! rather than handed to `tokio::spawn` on a multi-thread runtime.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]
#![allow(async_fn_in_trait)]

mod anchor_index;
mod block_compiler;
mod column_flow;
mod layout_engine;
mod layout_ir;
mod oracle;
mod typeset;

pub use block_compiler::{
    ElementKey, MediaCell, MediaRow, SpacerKind, TextRun, UnitBody, UnitKey, UnitPart, VisualUnit,
    DEFAULT_MEDIA_RATIO, DEFAULT_VIDEO_RATIO,
};
pub use column_flow::{ColumnFlowOracle, FlowMetrics};
pub use layout_engine::{
    AutoLayoutEngine, CancelFlag, CancelToken, LayoutContext, LayoutDiagnostic, LayoutError,
    LayoutOptions, NeverCancel, OverflowPolicy, PageRatio, RunConfig, TypesetFailurePolicy,
    MAX_COLUMNS,
};
pub use layout_ir::{
    AnchorMap, AnchorPosition, AutoLayoutResult, CanvasItem, IdSource, LayoutProfileId, MediaItem,
    PageId, Rect, SequentialIds, TextItem,
};
pub use oracle::{FontGate, FontsReady, MeasurementOracle, OracleError, ScratchSurface, SurfaceSpec};
pub use typeset::{MathTypesetter, PassthroughTypesetter, TypesetError};
