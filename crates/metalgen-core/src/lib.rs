//! # Metalgen Core
//!
//! Design-rule-constrained synthesis of metal interconnect layouts: tracks per
//! metal layer, random segment/gap walks along each track, via candidates at
//! segment crossings with line-end enclosure, and density-controlled,
//! pitch-constrained via selection.
//!
//! Every random decision draws from a stream seeded by the global seed and the
//! coordinates of the unit being generated, so layouts are reproducible and
//! the per-track and per-column work runs in parallel.

pub mod geometry;
pub mod grid;
pub mod layer;
pub mod rules;
pub mod rng;
pub mod tracks;
pub mod walker;
pub mod spatial;
pub mod candidates;
pub mod sampler;
pub mod layout;
pub mod generator;

pub use candidates::ViaCandidate;
pub use generator::{generate, Generator};
pub use geometry::{BBox, Point, Rect, Via};
pub use grid::{snap, Grid};
pub use layer::{FillStyle, LayerId, LayerStack, MetalLayer, Orientation, ViaLayer};
pub use layout::{Layout, LayoutNote, LayoutStats};
pub use rules::{DesignRules, RuleError, RuleSpec};
pub use tracks::{SegmentId, Track, WireSegment};
