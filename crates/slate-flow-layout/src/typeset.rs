//! Math typesetting hook.
//!
//! Runs on a unit before it is measured so that typeset formulas occupy
//! their real size on the surface. The pagination loop owns failure policy
//! and timeouts.

use core::fmt;

use crate::block_compiler::VisualUnit;

/// Typesetting failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypesetError {
    /// The typesetter reported an error.
    Failed(String),
    /// Typesetting did not finish within the configured timeout.
    TimedOut { after_ms: u64 },
}

impl fmt::Display for TypesetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "math typesetting failed: {}", reason),
            Self::TimedOut { after_ms } => {
                write!(f, "math typesetting timed out after {}ms", after_ms)
            }
        }
    }
}

impl std::error::Error for TypesetError {}

/// Rewrites math notation inside a unit's text runs.
///
/// Implementations set [`TextRun::typeset_html`](crate::TextRun::typeset_html)
/// and must leave the sanitized source in `html` untouched.
pub trait MathTypesetter {
    async fn typeset(&self, unit: &mut VisualUnit) -> Result<(), TypesetError>;
}

/// Typesetter that leaves every run as plain source markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughTypesetter;

impl MathTypesetter for PassthroughTypesetter {
    async fn typeset(&self, _unit: &mut VisualUnit) -> Result<(), TypesetError> {
        Ok(())
    }
}
