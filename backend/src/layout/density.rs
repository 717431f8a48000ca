//! Date-axis sizing by density band.

use serde::{Deserialize, Serialize};

/// Canvas height for every band.
pub const CANVAS_HEIGHT: u32 = 600;

/// Narrowest canvas.
pub const MIN_CANVAS_WIDTH: u32 = 800;

/// Fixed width reserved for the y axis and legend.
const CANVAS_MARGIN: u32 = 120;

/// Width added per distinct date.
const WIDTH_PER_DATE: u32 = 40;

/// Threshold-selected bucket of tick presentation parameters.
///
/// | band    | dates | font scale | rotation |
/// |---------|-------|------------|----------|
/// | Sparse  | ≤10   | 1.0        | 0°       |
/// | Medium  | ≤20   | 0.9        | -30°     |
/// | Dense   | ≤31   | 0.8        | -45°     |
/// | Crowded | >31   | 0.65       | -90°     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityBand {
    Sparse,
    Medium,
    Dense,
    Crowded,
}

impl DensityBand {
    pub fn for_date_count(dates: usize) -> Self {
        match dates {
            0..=10 => DensityBand::Sparse,
            11..=20 => DensityBand::Medium,
            21..=31 => DensityBand::Dense,
            _ => DensityBand::Crowded,
        }
    }

    /// Tick font size relative to the base size.
    pub fn font_scale(self) -> f64 {
        match self {
            DensityBand::Sparse => 1.0,
            DensityBand::Medium => 0.9,
            DensityBand::Dense => 0.8,
            DensityBand::Crowded => 0.65,
        }
    }

    /// Tick label rotation in degrees.
    pub fn rotation(self) -> i32 {
        match self {
            DensityBand::Sparse => 0,
            DensityBand::Medium => -30,
            DensityBand::Dense => -45,
            DensityBand::Crowded => -90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Grows with the date count, never below [`MIN_CANVAS_WIDTH`].
    pub fn for_date_count(dates: usize) -> Self {
        let dates = u32::try_from(dates).unwrap_or(u32::MAX);
        let width = CANVAS_MARGIN.saturating_add(WIDTH_PER_DATE.saturating_mul(dates));
        Self {
            width: width.max(MIN_CANVAS_WIDTH),
            height: CANVAS_HEIGHT,
        }
    }
}
