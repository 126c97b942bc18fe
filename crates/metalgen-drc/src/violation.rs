use std::fmt;

use metalgen_core::{BBox, LayerId, SegmentId};
use serde::{Deserialize, Serialize};

/// The design rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    BoundingBox,
    UnknownLayer,
    TrackOrientation,
    TrackOffset,
    TrackBounds,
    TrackLength,
    TrackOverlap,
    WireWidth,
    SegmentBounds,
    SegmentOrder,
    MinLength,
    MaxLength,
    LengthGrid,
    RailSpan,
    MinTipToTip,
    MaxTipToTip,
    TipToTipGrid,
    OffGrid,
    ViaSize,
    ViaLayer,
    ViaOverlap,
    EnclosureX,
    EnclosureY,
    ViaPitchX,
    ViaPitchY,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::BoundingBox => "bounding_box",
            Rule::UnknownLayer => "unknown_layer",
            Rule::TrackOrientation => "track_orientation",
            Rule::TrackOffset => "track_offset",
            Rule::TrackBounds => "track_bounds",
            Rule::TrackLength => "track_length",
            Rule::TrackOverlap => "track_overlap",
            Rule::WireWidth => "wire_width",
            Rule::SegmentBounds => "segment_bounds",
            Rule::SegmentOrder => "segment_order",
            Rule::MinLength => "min_length",
            Rule::MaxLength => "max_length",
            Rule::LengthGrid => "length_grid",
            Rule::RailSpan => "rail_span",
            Rule::MinTipToTip => "min_t2t",
            Rule::MaxTipToTip => "max_t2t",
            Rule::TipToTipGrid => "t2t_grid",
            Rule::OffGrid => "manufacturing_grid",
            Rule::ViaSize => "via_size",
            Rule::ViaLayer => "via_layer",
            Rule::ViaOverlap => "via_overlap",
            Rule::EnclosureX => "enclosure_x",
            Rule::EnclosureY => "enclosure_y",
            Rule::ViaPitchX => "via_pitch_x",
            Rule::ViaPitchY => "via_pitch_y",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A layout entity involved in a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    Layout,
    Track { layer: LayerId, index: usize },
    Segment(SegmentId),
    /// Index into the layout's via list.
    Via(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Layout => write!(f, "layout"),
            EntityRef::Track { layer, index } => write!(f, "track {layer}/{index}"),
            EntityRef::Segment(id) => write!(f, "segment {}/{}/{}", id.layer, id.track, id.index),
            EntityRef::Via(index) => write!(f, "via #{index}"),
        }
    }
}

/// A single design-rule violation with its measured value and the bound it broke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: Rule,
    pub entities: Vec<EntityRef>,
    pub measured: f64,
    pub bound: f64,
    pub layer_id: Option<LayerId>,
    /// Bounding box of the violation region: [min_x, min_y, max_x, max_y]
    pub bbox: Option<[f64; 4]>,
    pub message: String,
}

impl Violation {
    pub fn new(rule: Rule, measured: f64, bound: f64) -> Self {
        Self {
            rule,
            entities: Vec::new(),
            measured,
            bound,
            layer_id: None,
            bbox: None,
            message: String::new(),
        }
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer_id = Some(layer);
        self
    }

    pub fn with_bbox(mut self, bbox: &BBox) -> Self {
        self.bbox = Some(bbox.to_array());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] measured {} vs bound {}",
            self.rule, self.measured, self.bound
        )?;
        for entity in &self.entities {
            write!(f, " {entity}")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Outcome of verifying a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Invalid(Vec<Violation>),
}

impl Verdict {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Verdict::Valid
        } else {
            Verdict::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Verdict::Valid => &[],
            Verdict::Invalid(v) => v,
        }
    }

    /// Violated rules, in order of appearance.
    pub fn rules(&self) -> Vec<Rule> {
        self.violations().iter().map(|v| v.rule).collect()
    }
}
