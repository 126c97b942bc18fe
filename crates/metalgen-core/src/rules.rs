//! Design rules: the raw serde record ([`RuleSpec`]) and its validated,
//! immutable form ([`DesignRules`]).

use std::collections::HashSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{BBox, Point};
use crate::grid::Grid;
use crate::layer::{FillStyle, LayerStack, MetalLayer, Orientation, ViaLayer};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Invalid grid `{name}`: {value} (must be positive and finite)")]
    InvalidGrid { name: String, value: f64 },

    #[error("Invalid design rules: {0}")]
    InvalidRules(String),
}

fn default_manufacturing_grid() -> f64 {
    0.5
}

/// Every named design-rule parameter, as read from a rule deck.
///
/// All lengths are in nanometers. Nothing is checked here; convert into
/// [`DesignRules`] to validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Wire critical dimension (width of every segment).
    pub wire_cd: f64,
    pub min_t2t: f64,
    pub max_t2t: f64,
    pub t2t_grid: f64,
    pub min_length: f64,
    pub max_length: f64,
    /// Grid for segment lengths; falls back to `t2t_grid`.
    #[serde(default)]
    pub length_grid: Option<f64>,
    pub total_x: f64,
    pub total_y: f64,
    pub via_x: f64,
    pub via_y: f64,
    /// Probability that an admissible via candidate is realized.
    pub density: f64,
    pub enclosure_x: f64,
    pub enclosure_y: f64,
    pub via_pitch_x: f64,
    pub via_pitch_y: f64,
    /// Grid every emitted coordinate is snapped to.
    #[serde(default = "default_manufacturing_grid")]
    pub manufacturing_grid: f64,
    pub layers: LayerStack,
}

impl RuleSpec {
    /// The reference two-metal benchmark: horizontal M1 rails under a
    /// randomly cut vertical M2, joined through V1.
    pub fn reference() -> Self {
        let layers = LayerStack::new()
            .with_metal(
                MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110)
                    .with_fill(FillStyle::Continuous),
            )
            .with_metal(MetalLayer::new(2, "M2", Orientation::Vertical, 31.5, 111))
            .with_via(ViaLayer::new(3, "V1", 1, 2, 112));
        Self {
            wire_cd: 21.0,
            min_t2t: 42.0,
            max_t2t: 315.0,
            t2t_grid: 21.0,
            min_length: 42.0,
            max_length: 378.0,
            length_grid: None,
            total_x: 5533.0,
            total_y: 5187.0,
            via_x: 21.0,
            via_y: 21.0,
            density: 0.5,
            enclosure_x: 5.0,
            enclosure_y: 5.0,
            via_pitch_x: 32.5,
            via_pitch_y: 22.0,
            manufacturing_grid: default_manufacturing_grid(),
            layers,
        }
    }
}

/// The grids and legal ranges derived while validating a [`RuleSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grids {
    pub length: Grid,
    pub t2t: Grid,
    pub manufacturing: Grid,
    /// Smallest and largest legal segment lengths on the length grid.
    pub length_range: (f64, f64),
    /// Smallest and largest legal gaps on the tip-to-tip grid.
    pub t2t_range: (f64, f64),
}

/// A validated, immutable set of design rules.
///
/// Dereferences to the underlying [`RuleSpec`] for read access. Serializes as
/// a plain `RuleSpec` and re-validates on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub struct DesignRules {
    spec: RuleSpec,
    grids: Grids,
}

impl DesignRules {
    pub fn new(spec: RuleSpec) -> Result<Self, RuleError> {
        let grids = validate(&spec)?;
        Ok(Self { spec, grids })
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    pub fn grids(&self) -> &Grids {
        &self.grids
    }

    pub fn layers(&self) -> &LayerStack {
        &self.spec.layers
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            Point::new(0.0, 0.0),
            Point::new(self.spec.total_x, self.spec.total_y),
        )
    }

    /// Extent along the direction tracks of `orientation` run.
    pub fn track_length(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.spec.total_x,
            Orientation::Vertical => self.spec.total_y,
        }
    }

    /// Extent across which tracks of `orientation` are stacked.
    pub fn track_extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.spec.total_y,
            Orientation::Vertical => self.spec.total_x,
        }
    }

    /// Via pitch between neighbours along `orientation`'s axis.
    pub fn via_pitch_along(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.spec.via_pitch_x,
            Orientation::Vertical => self.spec.via_pitch_y,
        }
    }
}

impl Deref for DesignRules {
    type Target = RuleSpec;

    fn deref(&self) -> &RuleSpec {
        &self.spec
    }
}

impl TryFrom<RuleSpec> for DesignRules {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, RuleError> {
        Self::new(spec)
    }
}

impl From<DesignRules> for RuleSpec {
    fn from(rules: DesignRules) -> Self {
        rules.spec
    }
}

fn invalid(reason: impl Into<String>) -> RuleError {
    RuleError::InvalidRules(reason.into())
}

fn positive(name: &str, value: f64) -> Result<(), RuleError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("`{name}` must be positive, got {value}")))
    }
}

fn ordered(name: &str, min: f64, max: f64) -> Result<(), RuleError> {
    if min <= max {
        Ok(())
    } else {
        Err(invalid(format!("`min_{name}` ({min}) exceeds `max_{name}` ({max})")))
    }
}

fn validate(spec: &RuleSpec) -> Result<Grids, RuleError> {
    let t2t = Grid::named("t2t_grid", spec.t2t_grid)?;
    let length = Grid::named("length_grid", spec.length_grid.unwrap_or(spec.t2t_grid))?;
    let manufacturing = Grid::named("manufacturing_grid", spec.manufacturing_grid)?;

    for (name, value) in [
        ("wire_cd", spec.wire_cd),
        ("min_t2t", spec.min_t2t),
        ("max_t2t", spec.max_t2t),
        ("min_length", spec.min_length),
        ("max_length", spec.max_length),
        ("total_x", spec.total_x),
        ("total_y", spec.total_y),
        ("via_x", spec.via_x),
        ("via_y", spec.via_y),
        ("density", spec.density),
        ("enclosure_x", spec.enclosure_x),
        ("enclosure_y", spec.enclosure_y),
        ("via_pitch_x", spec.via_pitch_x),
        ("via_pitch_y", spec.via_pitch_y),
    ] {
        positive(name, value)?;
    }
    ordered("t2t", spec.min_t2t, spec.max_t2t)?;
    ordered("length", spec.min_length, spec.max_length)?;

    if spec.density > 1.0 {
        return Err(invalid(format!(
            "`density` must lie in (0, 1], got {}",
            spec.density
        )));
    }
    if spec.via_x > spec.wire_cd || spec.via_y > spec.wire_cd {
        return Err(invalid(format!(
            "via {}x{} does not fit inside a {} wide wire",
            spec.via_x, spec.via_y, spec.wire_cd
        )));
    }

    let length_range = length
        .multiples_within(spec.min_length, spec.max_length)
        .ok_or_else(|| {
            invalid(format!(
                "no multiple of length grid {} within [{}, {}]",
                length.pitch(),
                spec.min_length,
                spec.max_length
            ))
        })?;
    let t2t_range = t2t
        .multiples_within(spec.min_t2t, spec.max_t2t)
        .ok_or_else(|| {
            invalid(format!(
                "no multiple of t2t grid {} within [{}, {}]",
                t2t.pitch(),
                spec.min_t2t,
                spec.max_t2t
            ))
        })?;

    validate_stack(spec)?;

    let coarse = [
        ("t2t_grid".to_string(), t2t.pitch()),
        ("length_grid".to_string(), length.pitch()),
        ("wire_cd / 2".to_string(), spec.wire_cd / 2.0),
        ("total_x".to_string(), spec.total_x),
        ("total_y".to_string(), spec.total_y),
    ];
    let pitches = spec
        .layers
        .metals()
        .iter()
        .map(|m| (format!("{}.track_pitch", m.name), m.track_pitch));
    for (name, value) in coarse.into_iter().chain(pitches) {
        if !manufacturing.contains(value) {
            return Err(invalid(format!(
                "`{name}` ({value}) is not a multiple of the manufacturing grid {}",
                manufacturing.pitch()
            )));
        }
    }

    Ok(Grids {
        length,
        t2t,
        manufacturing,
        length_range,
        t2t_range,
    })
}

fn validate_stack(spec: &RuleSpec) -> Result<(), RuleError> {
    let stack = &spec.layers;
    if stack.metals().is_empty() {
        return Err(invalid("layer stack has no metal layers"));
    }

    let mut ids = HashSet::new();
    let all_ids = stack
        .metals()
        .iter()
        .map(|m| m.id)
        .chain(stack.vias().iter().map(|v| v.id));
    for id in all_ids {
        if !ids.insert(id) {
            return Err(invalid(format!("duplicate layer id {id}")));
        }
    }

    for metal in stack.metals() {
        positive(&format!("{}.track_pitch", metal.name), metal.track_pitch)?;
        if metal.track_pitch < spec.wire_cd {
            return Err(invalid(format!(
                "track pitch {} of {} is below wire_cd {}; tracks would overlap",
                metal.track_pitch, metal.name, spec.wire_cd
            )));
        }
    }

    for pair in stack.metals().windows(2) {
        if pair[0].orientation == pair[1].orientation {
            return Err(invalid(format!(
                "metals {} and {} are adjacent but share an orientation",
                pair[0].name, pair[1].name
            )));
        }
    }

    for via in stack.vias() {
        let bottom = stack.metal(via.bottom).ok_or_else(|| {
            invalid(format!("via layer {} references unknown metal {}", via.name, via.bottom))
        })?;
        let top = stack.metal(via.top).ok_or_else(|| {
            invalid(format!("via layer {} references unknown metal {}", via.name, via.top))
        })?;
        if bottom.orientation == top.orientation {
            return Err(invalid(format!(
                "via layer {} joins {} and {} which share an orientation",
                via.name, bottom.name, top.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_rules_validate() {
        let rules = DesignRules::new(RuleSpec::reference()).unwrap();
        assert_relative_eq!(rules.grids().length.pitch(), 21.0);
        assert_eq!(rules.grids().length_range, (42.0, 378.0));
        assert_eq!(rules.grids().t2t_range, (42.0, 315.0));
        assert_relative_eq!(rules.track_length(Orientation::Vertical), 5187.0);
        assert_relative_eq!(rules.track_extent(Orientation::Vertical), 5533.0);
        assert_relative_eq!(rules.via_pitch_along(Orientation::Horizontal), 32.5);
    }

    #[test]
    fn test_non_positive_grid_is_invalid_grid() {
        let mut spec = RuleSpec::reference();
        spec.t2t_grid = 0.0;
        assert!(matches!(
            DesignRules::new(spec),
            Err(RuleError::InvalidGrid { name, .. }) if name == "t2t_grid"
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut spec = RuleSpec::reference();
        spec.min_length = 400.0;
        assert!(matches!(
            DesignRules::new(spec),
            Err(RuleError::InvalidRules(_))
        ));
    }

    #[test]
    fn test_non_positive_parameter_rejected() {
        let mut spec = RuleSpec::reference();
        spec.enclosure_y = -1.0;
        assert!(DesignRules::new(spec).is_err());

        let mut spec = RuleSpec::reference();
        spec.density = 1.5;
        assert!(DesignRules::new(spec).is_err());
    }

    #[test]
    fn test_no_grid_multiple_in_range() {
        let mut spec = RuleSpec::reference();
        spec.min_length = 43.0;
        spec.max_length = 60.0;
        assert!(DesignRules::new(spec).is_err());
    }

    #[test]
    fn test_stack_consistency() {
        let mut spec = RuleSpec::reference();
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110))
            .with_metal(MetalLayer::new(2, "M2", Orientation::Horizontal, 42.0, 111))
            .with_via(ViaLayer::new(3, "V1", 1, 2, 112));
        assert!(DesignRules::new(spec).is_err());

        let mut spec = RuleSpec::reference();
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 20.0, 110));
        assert!(DesignRules::new(spec).is_err());
    }

    #[test]
    fn test_adjacent_metals_must_alternate() {
        let mut spec = RuleSpec::reference();
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110))
            .with_metal(MetalLayer::new(2, "M2", Orientation::Horizontal, 42.0, 111));
        assert!(DesignRules::new(spec).is_err());

        let mut spec = RuleSpec::reference();
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Vertical, 42.0, 110))
            .with_metal(MetalLayer::new(2, "M2", Orientation::Horizontal, 42.0, 111));
        assert!(DesignRules::new(spec).is_ok());
    }

    #[test]
    fn test_coarse_grids_must_sit_on_manufacturing_grid() {
        let mut spec = RuleSpec::reference();
        spec.layers.metal_mut(2).unwrap().track_pitch = 31.3;
        assert!(DesignRules::new(spec).is_err());

        let mut spec = RuleSpec::reference();
        spec.manufacturing_grid = 2.0;
        assert!(DesignRules::new(spec).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let mut spec = RuleSpec::reference();
        spec.wire_cd = 0.0;
        let json = serde_json::to_string(&spec).unwrap();
        assert!(serde_json::from_str::<DesignRules>(&json).is_err());

        let json = serde_json::to_string(&RuleSpec::reference()).unwrap();
        let rules: DesignRules = serde_json::from_str(&json).unwrap();
        assert_eq!(rules.spec(), &RuleSpec::reference());
    }
}
