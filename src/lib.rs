//! Step timeline model and content preparation for the slate lecture editor.
//!
//! This crate holds the authored block/segment model plus the synchronous
//! collaborators layout relies on: HTML sanitization and style resolution.
//! Pagination itself lives in `slate-flow-layout`.

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

pub mod model;
pub mod sanitize;
pub mod style;

pub use model::{
    BlockKind, MediaSegment, MediaType, SegmentStyle, StepBlock, StepSegment, TextSegment,
};
pub use sanitize::{plain_text, AllowListSanitizer, HtmlSanitizer, EMPTY_TEXT_PLACEHOLDER};
pub use style::{parse_font_weight, DefaultStyleResolver, RenderTextStyle, StyleHints, StyleResolver};
