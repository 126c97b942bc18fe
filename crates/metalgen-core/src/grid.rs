//! Snapping primitives for the length, tip-to-tip, via and manufacturing grids.
//!
//! A [`Grid`] can only be built from a strictly positive, finite pitch, so all
//! of its snapping operations are total.

use crate::geometry::EPSILON;
use crate::rules::RuleError;

/// Relative slack applied before flooring/ceiling, so values that are already
/// on the grid up to float noise stay where they are.
const RELATIVE_SLACK: f64 = 1e-9;

/// A validated, strictly positive grid pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pitch: f64,
}

impl Grid {
    pub fn new(pitch: f64) -> Result<Self, RuleError> {
        Self::named("grid", pitch)
    }

    /// Like [`Grid::new`], reporting `name` in the error.
    pub fn named(name: &str, pitch: f64) -> Result<Self, RuleError> {
        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(RuleError::InvalidGrid {
                name: name.to_string(),
                value: pitch,
            });
        }
        Ok(Self { pitch })
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Nearest multiple of the pitch; exact ties go to the lower multiple.
    pub fn snap(&self, value: f64) -> f64 {
        (value / self.pitch - 0.5).ceil() * self.pitch
    }

    /// Largest multiple of the pitch not above `value`.
    pub fn snap_down(&self, value: f64) -> f64 {
        (value / self.pitch + RELATIVE_SLACK).floor() * self.pitch
    }

    /// Smallest multiple of the pitch not below `value`.
    pub fn snap_up(&self, value: f64) -> f64 {
        (value / self.pitch - RELATIVE_SLACK).ceil() * self.pitch
    }

    /// Whether `value` is a multiple of the pitch, within [`EPSILON`].
    pub fn contains(&self, value: f64) -> bool {
        (value - (value / self.pitch).round() * self.pitch).abs() <= EPSILON
    }

    /// The smallest and largest grid multiples inside `[lo, hi]`, if any.
    pub fn multiples_within(&self, lo: f64, hi: f64) -> Option<(f64, f64)> {
        let first = self.snap_up(lo);
        let last = self.snap_down(hi);
        (first <= last + EPSILON).then_some((first, last))
    }

    /// Snap `value`, then pull it back into `[lo, hi]` where `lo` and `hi`
    /// are themselves grid multiples.
    pub fn snap_within(&self, value: f64, lo: f64, hi: f64) -> f64 {
        self.snap(value).clamp(lo, hi)
    }
}

/// Snap `value` to the nearest multiple of `grid` (ties toward the lower
/// multiple). Fails with [`RuleError::InvalidGrid`] when `grid ≤ 0`.
pub fn snap(value: f64, grid: f64) -> Result<f64, RuleError> {
    Ok(Grid::new(grid)?.snap(value))
}
