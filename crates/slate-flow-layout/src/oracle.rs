//! Measurement oracle adapter.
//!
//! Layout never computes line breaks or glyph metrics itself. It appends
//! [`VisualUnit`]s to a scratch surface hosted by a [`MeasurementOracle`],
//! waits for the surface to settle and reads rectangles back.

use core::fmt;

use crate::block_compiler::{ElementKey, UnitKey, VisualUnit};
use crate::layout_ir::Rect;

/// Geometry of a scratch surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSpec {
    /// Content width (page width minus horizontal padding).
    pub width: f32,
    /// Content height (page height minus vertical padding).
    pub height: f32,
    /// Number of flow columns, at least 1.
    pub column_count: usize,
    /// Gap between columns.
    pub gap: f32,
}

impl SurfaceSpec {
    /// Width of a single column.
    pub fn column_width(&self) -> f32 {
        let columns = self.column_count.max(1) as f32;
        ((self.width - self.gap * (columns - 1.0)) / columns).max(1.0)
    }

    /// Horizontal distance between the left edges of adjacent columns.
    pub fn column_stride(&self) -> f32 {
        self.column_width() + self.gap
    }
}

/// Errors raised by oracle surface management.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleError {
    /// The rendering surface could not host a scratch container.
    SurfaceUnavailable(String),
    /// A scratch surface is already attached.
    SurfaceBusy,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable(reason) => {
                write!(f, "scratch surface unavailable: {}", reason)
            }
            Self::SurfaceBusy => write!(f, "scratch surface already attached"),
        }
    }
}

impl std::error::Error for OracleError {}

/// Rendering surface able to lay out units invisibly and report geometry.
///
/// Implementations host at most one scratch surface at a time. Geometry
/// queries reflect the state as of the last
/// [`await_layout_settled`](Self::await_layout_settled).
///
/// The returned futures carry no `Send` bound; rendering surfaces are
/// usually tied to one thread, and so is the layout run awaiting them.
pub trait MeasurementOracle {
    /// Build an invisible surface detached from anything the user sees.
    fn attach_surface(&mut self, spec: &SurfaceSpec) -> Result<(), OracleError>;

    /// Tear the surface down. Must be safe to call when nothing is attached.
    fn detach_surface(&mut self);

    /// Remove every unit from the attached surface.
    fn clear_surface(&mut self);

    fn append_unit(&mut self, unit: &VisualUnit);

    fn remove_unit(&mut self, key: UnitKey);

    /// Surface content box in the oracle's coordinate space.
    fn surface_bounds(&self) -> Option<Rect>;

    /// Rectangle of an attached element, `None` when it is not attached or
    /// has not been laid out yet.
    fn measure_rect(&self, element: &ElementKey) -> Option<Rect>;

    /// True when attached content exceeds the surface's column area.
    fn is_overflowing(&self) -> bool;

    /// Wait one layout frame.
    async fn await_layout_settled(&mut self);
}

/// Resolves once glyph metrics are stable.
pub trait FontGate {
    async fn ready(&self);
}

/// Gate for environments whose fonts are always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontsReady;

impl FontGate for FontsReady {
    async fn ready(&self) {}
}

/// Scoped scratch surface.
///
/// The surface is detached when the guard drops, whichever way the owning
/// layout run exits.
pub struct ScratchSurface<'o, O: MeasurementOracle> {
    oracle: &'o mut O,
    spec: SurfaceSpec,
    units: Vec<UnitKey>,
}

impl<'o, O: MeasurementOracle> ScratchSurface<'o, O> {
    /// Attach a scratch surface on `oracle`.
    pub fn attach(oracle: &'o mut O, spec: SurfaceSpec) -> Result<Self, OracleError> {
        oracle.attach_surface(&spec)?;
        log::debug!(
            "scratch surface attached ({}x{}, {} columns)",
            spec.width,
            spec.height,
            spec.column_count
        );
        Ok(Self {
            oracle,
            spec,
            units: Vec::with_capacity(16),
        })
    }

    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    /// Units currently attached.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn append_unit(&mut self, unit: &VisualUnit) {
        self.oracle.append_unit(unit);
        self.units.push(unit.key);
    }

    pub fn remove_unit(&mut self, key: UnitKey) {
        self.oracle.remove_unit(key);
        self.units.retain(|attached| *attached != key);
    }

    pub fn clear(&mut self) {
        self.oracle.clear_surface();
        self.units.clear();
    }

    /// Surface origin used to translate measurements into page space.
    pub fn bounds(&self) -> Rect {
        self.oracle
            .surface_bounds()
            .unwrap_or(Rect::new(0.0, 0.0, self.spec.width, self.spec.height))
    }

    pub fn measure_rect(&self, element: &ElementKey) -> Option<Rect> {
        self.oracle.measure_rect(element)
    }

    pub fn is_overflowing(&self) -> bool {
        self.oracle.is_overflowing()
    }

    pub async fn await_layout_settled(&mut self) {
        self.oracle.await_layout_settled().await;
    }

    pub async fn await_fonts_ready<F: FontGate>(&self, fonts: &F) {
        fonts.ready().await;
    }
}

impl<O: MeasurementOracle> Drop for ScratchSurface<'_, O> {
    fn drop(&mut self) {
        self.oracle.detach_surface();
        log::debug!(
            "scratch surface detached ({} units attached)",
            self.units.len()
        );
    }
}

impl<O: MeasurementOracle> fmt::Debug for ScratchSurface<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchSurface")
            .field("spec", &self.spec)
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}
