use serde::{Deserialize, Serialize};

use crate::candidates::ViaCandidate;
use crate::geometry::{BBox, Rect, Via};
use crate::layer::FillStyle;
use crate::rules::DesignRules;
use crate::tracks::{SegmentId, Track, WireSegment};
use crate::LayerId;

/// A non-fatal condition recorded during generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutNote {
    /// A randomly filled track too short for a single legal segment.
    InsufficientSpace { layer: LayerId, track: usize },
}

/// A generated (or hand-built) layout: tracks with their segments, vias, and
/// the candidate set the vias were selected from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Benchmark or cell name.
    pub name: String,
    /// Seed the layout was generated from.
    pub seed: u64,
    rules: DesignRules,
    bbox: BBox,
    /// Tracks ordered by metal (stack order), then index.
    tracks: Vec<Track>,
    vias: Vec<Via>,
    candidates: Vec<ViaCandidate>,
    notes: Vec<LayoutNote>,
}

impl Layout {
    pub fn new(name: &str, rules: DesignRules, seed: u64) -> Self {
        let bbox = rules.bbox();
        Self {
            name: name.to_string(),
            seed,
            rules,
            bbox,
            tracks: Vec::new(),
            vias: Vec::new(),
            candidates: Vec::new(),
            notes: Vec::new(),
        }
    }

    // ── Construction ─────────────────────────────────────────────────

    pub fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn push_via(&mut self, via: Via) {
        self.vias.push(via);
    }

    pub fn set_candidates(&mut self, candidates: Vec<ViaCandidate>) {
        self.candidates = candidates;
    }

    pub fn add_note(&mut self, note: LayoutNote) {
        self.notes.push(note);
    }

    /// Override the bounding box (hand-built layouts).
    pub fn set_bbox(&mut self, bbox: BBox) {
        self.bbox = bbox;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn rules(&self) -> &DesignRules {
        &self.rules
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tracks_on(&self, layer: LayerId) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.layer == layer)
    }

    pub fn track(&self, layer: LayerId, index: usize) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.layer == layer && t.index == index)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&WireSegment> {
        self.track(id.layer, id.track)?.segment(id.index)
    }

    pub fn vias(&self) -> &[Via] {
        &self.vias
    }

    pub fn candidates(&self) -> &[ViaCandidate] {
        &self.candidates
    }

    pub fn notes(&self) -> &[LayoutNote] {
        &self.notes
    }

    pub fn segment_count(&self) -> usize {
        self.tracks.iter().map(Track::segment_count).sum()
    }

    /// Every shape as a rectangle tagged with its metal or cut layer.
    pub fn rects(&self) -> Vec<Rect> {
        self.tracks
            .iter()
            .flat_map(Track::segment_rects)
            .chain(
                self.vias
                    .iter()
                    .map(|v| Rect::from_bbox(v.cut_layer, &v.bbox())),
            )
            .collect()
    }

    pub fn stats(&self) -> LayoutStats {
        let area = self.bbox.area();
        let layers = self
            .rules
            .layers()
            .metals()
            .iter()
            .map(|metal| {
                let tracks: Vec<&Track> = self.tracks_on(metal.id).collect();
                let wire_area: f64 = tracks
                    .iter()
                    .map(|t| t.wire_length() * self.rules.wire_cd)
                    .sum();
                LayerStats {
                    layer: metal.id,
                    name: metal.name.clone(),
                    fill: metal.fill,
                    tracks: tracks.len(),
                    empty_tracks: tracks.iter().filter(|t| t.is_empty()).count(),
                    segments: tracks.iter().map(|t| t.segment_count()).sum(),
                    wire_area,
                    fill_density: if area > 0.0 { wire_area / area } else { 0.0 },
                }
            })
            .collect();

        let candidates = self.candidates.len();
        let vias = self.vias.len();
        LayoutStats {
            layers,
            candidates,
            vias,
            realized_density: if candidates > 0 {
                vias as f64 / candidates as f64
            } else {
                0.0
            },
        }
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-metal fill statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub layer: LayerId,
    pub name: String,
    pub fill: FillStyle,
    pub tracks: usize,
    pub empty_tracks: usize,
    pub segments: usize,
    pub wire_area: f64,
    /// Wire area over bounding-box area.
    pub fill_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutStats {
    pub layers: Vec<LayerStats>,
    pub candidates: usize,
    pub vias: usize,
    /// Accepted vias over admissible candidates.
    pub realized_density: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::layer::Orientation;
    use crate::rules::RuleSpec;
    use approx::assert_relative_eq;

    fn small_layout() -> Layout {
        let mut spec = RuleSpec::reference();
        spec.total_x = 420.0;
        spec.total_y = 420.0;
        let rules = DesignRules::new(spec).unwrap();
        let mut layout = Layout::new("small", rules, 0);

        let mut m1 = Track::new(1, 0, 0.0, Orientation::Horizontal, FillStyle::Continuous, 420.0);
        m1.push_segment(WireSegment::new(0.0, 420.0, 21.0));
        let mut m2 = Track::new(2, 1, 31.5, Orientation::Vertical, FillStyle::Random, 420.0);
        m2.push_segment(WireSegment::new(0.0, 84.0, 21.0));
        m2.push_segment(WireSegment::new(126.0, 210.0, 21.0));
        layout.push_track(m1);
        layout.push_track(m2);
        layout.push_via(Via::new(
            3,
            SegmentId { layer: 1, track: 0, index: 0 },
            SegmentId { layer: 2, track: 1, index: 0 },
            Point::new(42.0, 10.5),
            21.0,
            21.0,
        ));
        layout
    }

    #[test]
    fn test_layout_create() {
        let rules = DesignRules::new(RuleSpec::reference()).unwrap();
        let layout = Layout::new("empty", rules, 3);
        assert_eq!(layout.segment_count(), 0);
        assert_relative_eq!(layout.bbox().width(), 5533.0);
        assert!(layout.vias().is_empty());
    }

    #[test]
    fn test_segment_lookup() {
        let layout = small_layout();
        let id = SegmentId { layer: 2, track: 1, index: 1 };
        assert_relative_eq!(layout.segment(id).unwrap().start, 126.0);
        assert!(layout.segment(SegmentId { layer: 2, track: 0, index: 0 }).is_none());
        assert_eq!(layout.tracks_on(2).count(), 1);
    }

    #[test]
    fn test_rects_include_vias() {
        let layout = small_layout();
        let rects = layout.rects();
        assert_eq!(rects.len(), 4);
        let via = rects.iter().find(|r| r.layer_id == 3).unwrap();
        assert_relative_eq!(via.lower_left.x, 31.5);
        assert_relative_eq!(via.area(), 441.0);
    }

    #[test]
    fn test_stats() {
        let layout = small_layout();
        let stats = layout.stats();
        let m2 = stats.layers.iter().find(|l| l.layer == 2).unwrap();
        assert_eq!(m2.segments, 2);
        assert_relative_eq!(m2.wire_area, 168.0 * 21.0);
        assert_relative_eq!(m2.fill_density, 168.0 * 21.0 / (420.0 * 420.0));
        assert_eq!(stats.vias, 1);
        assert_relative_eq!(stats.realized_density, 0.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let layout = small_layout();
        let json = layout.to_json().unwrap();
        let back = Layout::from_json(&json).unwrap();
        assert_eq!(back, layout);
    }
}
