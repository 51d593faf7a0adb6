//! Resolution of authored segment styles into concrete render styles.

use serde::{Deserialize, Serialize};

use crate::model::SegmentStyle;

/// Concrete style handed to measurement and rendering surfaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTextStyle {
    /// Font family stack.
    pub font_family: String,
    /// Size in pixels.
    pub font_size_px: f32,
    /// Numeric weight (100..=900).
    pub font_weight: u16,
    /// CSS color string.
    pub color: String,
    /// Line height multiplier.
    pub line_height: f32,
}

impl RenderTextStyle {
    /// Line box height in pixels.
    pub fn line_height_px(&self) -> f32 {
        self.font_size_px * self.line_height
    }
}

/// Defaults and clamps for style normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleHints {
    pub default_family: String,
    pub default_size_px: f32,
    pub min_size_px: f32,
    pub max_size_px: f32,
    pub default_weight: u16,
    pub default_color: String,
    pub line_height: f32,
}

impl Default for StyleHints {
    fn default() -> Self {
        Self {
            default_family: "KaTeX_Main, \"Times New Roman\", serif".to_string(),
            default_size_px: 28.0,
            min_size_px: 10.0,
            max_size_px: 160.0,
            default_weight: 400,
            default_color: "#1f2328".to_string(),
            line_height: 1.4,
        }
    }
}

/// Maps abstract authored styles to concrete render styles.
pub trait StyleResolver: Send + Sync {
    fn to_render_style(&self, style: &SegmentStyle) -> RenderTextStyle;
}

/// Resolver that fills defaults and clamps sizes/weights.
#[derive(Clone, Debug, Default)]
pub struct DefaultStyleResolver {
    hints: StyleHints,
}

impl DefaultStyleResolver {
    pub fn new(hints: StyleHints) -> Self {
        Self { hints }
    }

    pub fn hints(&self) -> &StyleHints {
        &self.hints
    }
}

impl StyleResolver for DefaultStyleResolver {
    fn to_render_style(&self, style: &SegmentStyle) -> RenderTextStyle {
        let hints = &self.hints;
        let font_family = style
            .font_family
            .as_deref()
            .map(str::trim)
            .filter(|family| !family.is_empty())
            .unwrap_or(hints.default_family.as_str())
            .to_string();
        let font_size_px = style
            .font_size
            .filter(|size| size.is_finite() && *size > 0.0)
            .unwrap_or(hints.default_size_px)
            .clamp(hints.min_size_px, hints.max_size_px);
        let font_weight = style
            .font_weight
            .as_deref()
            .and_then(parse_font_weight)
            .unwrap_or(hints.default_weight);
        let color = style
            .color
            .as_deref()
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .unwrap_or(hints.default_color.as_str())
            .to_string();
        RenderTextStyle {
            font_family,
            font_size_px,
            font_weight,
            color,
            line_height: hints.line_height,
        }
    }
}

/// Parse a CSS `font-weight` value into the numeric 100..=900 range.
pub fn parse_font_weight(value: &str) -> Option<u16> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "normal" => return Some(400),
        "bold" => return Some(700),
        "lighter" => return Some(300),
        "bolder" => return Some(800),
        _ => {}
    }
    let numeric: u16 = value.parse().ok()?;
    if numeric == 0 {
        return None;
    }
    Some(numeric.clamp(100, 900))
}
