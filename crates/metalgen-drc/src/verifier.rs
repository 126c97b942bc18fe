//! Design-rule verification of a finished layout.
//!
//! The checks here re-measure every shape from the layout's own tracks, segments
//! and vias. Nothing is taken from the generator's bookkeeping (candidate set,
//! derived grids), so a generator bug shows up as a violation rather than being
//! silently agreed with.

use std::collections::BTreeMap;

use metalgen_core::{BBox, DesignRules, FillStyle, Layout, Orientation, Track, Via};

use crate::violation::{EntityRef, Rule, Verdict, Violation};

/// Absolute tolerance for every comparison, in nanometers.
const TOLERANCE: f64 = 1e-6;

/// Whether `value` is an integer multiple of `pitch`.
fn on_grid(value: f64, pitch: f64) -> bool {
    let q = value / pitch;
    (q - q.round()).abs() * pitch <= TOLERANCE
}

/// Bucket key for grouping vias by a shared coordinate.
fn coord_key(value: f64) -> i64 {
    (value * 1e3).round() as i64
}

pub struct Verifier<'a> {
    rules: &'a DesignRules,
}

impl<'a> Verifier<'a> {
    pub fn new(rules: &'a DesignRules) -> Self {
        Self { rules }
    }

    /// Run every check and collect all violations. Pure and repeatable.
    pub fn verify(&self, layout: &Layout) -> Verdict {
        let mut violations = Vec::new();
        self.check_bbox(layout, &mut violations);
        for track in layout.tracks() {
            self.check_track(track, &mut violations);
        }
        self.check_track_overlap(layout.tracks(), &mut violations);
        for (index, via) in layout.vias().iter().enumerate() {
            self.check_via(layout, index, via, &mut violations);
        }
        self.check_via_pitch(layout.vias(), &mut violations);

        if violations.is_empty() {
            log::debug!("{}: clean", layout.name);
        } else {
            log::debug!("{}: {} violations", layout.name, violations.len());
        }
        Verdict::from_violations(violations)
    }

    fn length_grid(&self) -> f64 {
        self.rules.length_grid.unwrap_or(self.rules.t2t_grid)
    }

    fn check_bbox(&self, layout: &Layout, out: &mut Vec<Violation>) {
        let bbox = layout.bbox();
        let expected = [0.0, 0.0, self.rules.total_x, self.rules.total_y];
        for (measured, bound) in bbox.to_array().into_iter().zip(expected) {
            if (measured - bound).abs() > TOLERANCE {
                out.push(
                    Violation::new(Rule::BoundingBox, measured, bound)
                        .with_entity(EntityRef::Layout)
                        .with_bbox(&bbox)
                        .with_message("bounding box differs from total_x by total_y"),
                );
                return;
            }
        }
    }

    fn check_track(&self, track: &Track, out: &mut Vec<Violation>) {
        let entity = EntityRef::Track {
            layer: track.layer,
            index: track.index,
        };
        let Some(metal) = self.rules.layers().metal(track.layer) else {
            out.push(
                Violation::new(Rule::UnknownLayer, track.layer as f64, 0.0)
                    .with_entity(entity)
                    .with_layer(track.layer)
                    .with_message("track on a layer missing from the stack"),
            );
            return;
        };

        if track.orientation != metal.orientation {
            out.push(
                Violation::new(Rule::TrackOrientation, 0.0, 0.0)
                    .with_entity(entity)
                    .with_layer(track.layer)
                    .with_message(format!(
                        "{:?} track on {:?} layer {}",
                        track.orientation, metal.orientation, metal.name
                    )),
            );
            return;
        }

        let (along, across) = match track.orientation {
            Orientation::Horizontal => (self.rules.total_x, self.rules.total_y),
            Orientation::Vertical => (self.rules.total_y, self.rules.total_x),
        };
        let wire = self.rules.wire_cd;
        let mfg = self.rules.manufacturing_grid;

        let expected_offset = track.index as f64 * metal.track_pitch;
        if (track.offset - expected_offset).abs() > TOLERANCE {
            out.push(
                Violation::new(Rule::TrackOffset, track.offset, expected_offset)
                    .with_entity(entity)
                    .with_layer(track.layer),
            );
        }
        if !on_grid(track.offset, mfg) {
            out.push(
                Violation::new(Rule::OffGrid, track.offset, mfg)
                    .with_entity(entity)
                    .with_layer(track.layer)
                    .with_message("track offset"),
            );
        }
        if track.offset < -TOLERANCE || track.offset + wire > across + TOLERANCE {
            out.push(
                Violation::new(Rule::TrackBounds, track.offset + wire, across)
                    .with_entity(entity)
                    .with_layer(track.layer),
            );
        }
        if (track.length - along).abs() > TOLERANCE {
            out.push(
                Violation::new(Rule::TrackLength, track.length, along)
                    .with_entity(entity)
                    .with_layer(track.layer),
            );
        }

        if track.fill == FillStyle::Continuous {
            self.check_rail(track, along, out);
        }

        for (i, segment) in track.segments().iter().enumerate() {
            let id = EntityRef::Segment(track.segment_id(i));
            let bbox = track.segment_bbox(segment);
            let seg = |rule, measured, bound| {
                Violation::new(rule, measured, bound)
                    .with_entity(id)
                    .with_layer(track.layer)
                    .with_bbox(&bbox)
            };

            if (segment.width - wire).abs() > TOLERANCE {
                out.push(seg(Rule::WireWidth, segment.width, wire));
            }
            if segment.start < -TOLERANCE {
                out.push(seg(Rule::SegmentBounds, segment.start, 0.0));
            }
            if segment.end > along + TOLERANCE {
                out.push(seg(Rule::SegmentBounds, segment.end, along));
            }
            if segment.end <= segment.start + TOLERANCE {
                out.push(
                    seg(Rule::SegmentOrder, segment.end, segment.start)
                        .with_message("segment end does not follow its start"),
                );
                continue;
            }
            for coord in [segment.start, segment.end] {
                if !on_grid(coord, mfg) {
                    out.push(seg(Rule::OffGrid, coord, mfg).with_message("segment endpoint"));
                }
            }

            if track.fill == FillStyle::Random {
                let length = segment.length();
                if length < self.rules.min_length - TOLERANCE {
                    out.push(seg(Rule::MinLength, length, self.rules.min_length));
                }
                if length > self.rules.max_length + TOLERANCE {
                    out.push(seg(Rule::MaxLength, length, self.rules.max_length));
                }
                if !on_grid(length, self.length_grid()) {
                    out.push(seg(Rule::LengthGrid, length, self.length_grid()));
                }
            }
        }

        for (i, pair) in track.segments().windows(2).enumerate() {
            let gap = pair[1].start - pair[0].end;
            let make = |rule, bound| {
                Violation::new(rule, gap, bound)
                    .with_entity(EntityRef::Segment(track.segment_id(i)))
                    .with_entity(EntityRef::Segment(track.segment_id(i + 1)))
                    .with_layer(track.layer)
            };
            if gap <= TOLERANCE {
                out.push(make(Rule::SegmentOrder, 0.0).with_message("segments overlap or touch"));
                continue;
            }
            if gap < self.rules.min_t2t - TOLERANCE {
                out.push(make(Rule::MinTipToTip, self.rules.min_t2t));
            }
            if gap > self.rules.max_t2t + TOLERANCE {
                out.push(make(Rule::MaxTipToTip, self.rules.max_t2t));
            }
            if !on_grid(gap, self.rules.t2t_grid) {
                out.push(make(Rule::TipToTipGrid, self.rules.t2t_grid));
            }
        }
    }

    /// Tracks of one layer must not repeat an index, and neighbouring wires
    /// must not touch across the track axis.
    fn check_track_overlap(&self, tracks: &[Track], out: &mut Vec<Violation>) {
        let mut layers: BTreeMap<_, Vec<&Track>> = BTreeMap::new();
        for track in tracks {
            layers.entry(track.layer).or_default().push(track);
        }

        let wire = self.rules.wire_cd;
        for (layer, mut members) in layers {
            members.sort_by(|a, b| a.offset.total_cmp(&b.offset).then(a.index.cmp(&b.index)));
            for pair in members.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let spacing = b.offset - a.offset;
                let shared_index = a.index == b.index;
                if !shared_index && spacing >= wire - TOLERANCE {
                    continue;
                }
                let message = if shared_index {
                    format!("track index {} appears twice", a.index)
                } else {
                    format!("tracks {} and {} are {spacing}nm apart", a.index, b.index)
                };
                out.push(
                    Violation::new(Rule::TrackOverlap, spacing, wire)
                        .with_entity(EntityRef::Track { layer, index: a.index })
                        .with_entity(EntityRef::Track { layer, index: b.index })
                        .with_layer(layer)
                        .with_message(message),
                );
            }
        }
    }

    /// A continuous rail is exactly one segment covering the whole track.
    fn check_rail(&self, track: &Track, along: f64, out: &mut Vec<Violation>) {
        let entity = EntityRef::Track {
            layer: track.layer,
            index: track.index,
        };
        let covered = match track.segments() {
            [only] => only.start.abs() <= TOLERANCE && (only.end - along).abs() <= TOLERANCE,
            _ => false,
        };
        if !covered {
            out.push(
                Violation::new(Rule::RailSpan, track.wire_length(), along)
                    .with_entity(entity)
                    .with_layer(track.layer)
                    .with_message(format!("{} segments on a rail", track.segment_count())),
            );
        }
    }

    fn check_via(&self, layout: &Layout, index: usize, via: &Via, out: &mut Vec<Violation>) {
        let entity = EntityRef::Via(index);
        let bbox = via.bbox();
        let make = |rule, measured, bound| {
            Violation::new(rule, measured, bound)
                .with_entity(entity)
                .with_layer(via.cut_layer)
                .with_bbox(&bbox)
        };

        let Some(cut) = self.rules.layers().via_layer(via.cut_layer) else {
            out.push(make(Rule::ViaLayer, via.cut_layer as f64, 0.0).with_message("unknown cut layer"));
            return;
        };
        if via.bottom.layer != cut.bottom || via.top.layer != cut.top {
            out.push(make(Rule::ViaLayer, 0.0, 0.0).with_message(format!(
                "{} joins {}/{}, via lands on {}/{}",
                cut.name, cut.bottom, cut.top, via.bottom.layer, via.top.layer
            )));
            return;
        }

        if (via.width - self.rules.via_x).abs() > TOLERANCE {
            out.push(make(Rule::ViaSize, via.width, self.rules.via_x));
        }
        if (via.height - self.rules.via_y).abs() > TOLERANCE {
            out.push(make(Rule::ViaSize, via.height, self.rules.via_y));
        }
        let mfg = self.rules.manufacturing_grid;
        for coord in [via.position.x, via.position.y] {
            if !on_grid(coord, mfg) {
                out.push(make(Rule::OffGrid, coord, mfg).with_message("via center"));
            }
        }

        for id in [via.bottom, via.top] {
            let landing = layout
                .track(id.layer, id.track)
                .and_then(|track| Some((track, track.segment(id.index)?)));
            let Some((track, segment)) = landing else {
                out.push(
                    make(Rule::ViaLayer, 0.0, 0.0)
                        .with_entity(EntityRef::Segment(id))
                        .with_message("via references a missing segment"),
                );
                continue;
            };

            let wire = track.segment_bbox(segment);
            if !contains(&wire, &bbox) {
                out.push(
                    make(Rule::ViaOverlap, overhang(&wire, &bbox), 0.0)
                        .with_entity(EntityRef::Segment(id)),
                );
                continue;
            }

            let (rule, clearance, bound) = match track.orientation {
                Orientation::Horizontal => (
                    Rule::EnclosureX,
                    (bbox.min.x - segment.start).min(segment.end - bbox.max.x),
                    self.rules.enclosure_x,
                ),
                Orientation::Vertical => (
                    Rule::EnclosureY,
                    (bbox.min.y - segment.start).min(segment.end - bbox.max.y),
                    self.rules.enclosure_y,
                ),
            };
            if clearance < bound - TOLERANCE {
                out.push(make(rule, clearance, bound).with_entity(EntityRef::Segment(id)));
            }
        }
    }

    /// Neighbouring vias along a shared row must be `via_pitch_x` apart, along
    /// a shared column `via_pitch_y` apart.
    fn check_via_pitch(&self, vias: &[Via], out: &mut Vec<Violation>) {
        let mut rows: BTreeMap<_, Vec<usize>> = BTreeMap::new();
        let mut columns: BTreeMap<_, Vec<usize>> = BTreeMap::new();
        for (i, via) in vias.iter().enumerate() {
            rows.entry((via.cut_layer, coord_key(via.position.y)))
                .or_default()
                .push(i);
            columns
                .entry((via.cut_layer, coord_key(via.position.x)))
                .or_default()
                .push(i);
        }

        let scan = |groups: BTreeMap<_, Vec<usize>>,
                    coord: fn(&Via) -> f64,
                    rule: Rule,
                    pitch: f64,
                    out: &mut Vec<Violation>| {
            for (_, mut members) in groups {
                members.sort_by(|&a, &b| coord(&vias[a]).total_cmp(&coord(&vias[b])));
                for pair in members.windows(2) {
                    let (a, b) = (&vias[pair[0]], &vias[pair[1]]);
                    let distance = coord(b) - coord(a);
                    if distance < pitch - TOLERANCE {
                        out.push(
                            Violation::new(rule, distance, pitch)
                                .with_entity(EntityRef::Via(pair[0]))
                                .with_entity(EntityRef::Via(pair[1]))
                                .with_layer(a.cut_layer),
                        );
                    }
                }
            }
        };
        scan(rows, |v| v.position.x, Rule::ViaPitchX, self.rules.via_pitch_x, out);
        scan(columns, |v| v.position.y, Rule::ViaPitchY, self.rules.via_pitch_y, out);
    }
}

fn contains(outer: &BBox, inner: &BBox) -> bool {
    inner.min.x >= outer.min.x - TOLERANCE
        && inner.max.x <= outer.max.x + TOLERANCE
        && inner.min.y >= outer.min.y - TOLERANCE
        && inner.max.y <= outer.max.y + TOLERANCE
}

/// Largest distance `inner` sticks out of `outer` on any side.
fn overhang(outer: &BBox, inner: &BBox) -> f64 {
    [
        outer.min.x - inner.min.x,
        inner.max.x - outer.max.x,
        outer.min.y - inner.min.y,
        inner.max.y - outer.max.y,
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

/// Verify a layout against the rules it was generated with.
pub fn verify(layout: &Layout) -> Verdict {
    Verifier::new(layout.rules()).verify(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalgen_core::{
        generate, LayerStack, MetalLayer, Point, RuleSpec, SegmentId, ViaLayer, WireSegment,
    };

    /// Two 42nm-pitch metals over a 168nm square with 11nm vias.
    fn test_rules() -> DesignRules {
        let mut spec = RuleSpec::reference();
        spec.total_x = 168.0;
        spec.total_y = 168.0;
        spec.max_length = 84.0;
        spec.via_x = 11.0;
        spec.via_y = 11.0;
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110))
            .with_metal(MetalLayer::new(2, "M2", Orientation::Vertical, 42.0, 111))
            .with_via(ViaLayer::new(3, "V1", 1, 2, 112));
        DesignRules::new(spec).unwrap()
    }

    fn track(layer: u32, index: usize, segments: &[(f64, f64)]) -> Track {
        let orientation = if layer == 1 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let mut t = Track::new(
            layer,
            index,
            index as f64 * 42.0,
            orientation,
            FillStyle::Random,
            168.0,
        );
        for &(start, end) in segments {
            t.push_segment(WireSegment::new(start, end, 21.0));
        }
        t
    }

    fn via_at(x: f64, y: f64, m2_track: usize) -> Via {
        Via::new(
            3,
            SegmentId { layer: 1, track: 0, index: 0 },
            SegmentId { layer: 2, track: m2_track, index: 0 },
            Point::new(x, y),
            11.0,
            11.0,
        )
    }

    /// One 42nm segment per metal crossing at the origin corner, joined by a
    /// via with exactly 5nm enclosure on both segments.
    fn crossing_layout(rules: &DesignRules) -> Layout {
        let mut layout = Layout::new("crossing", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.5, 10.5, 0));
        layout
    }

    #[test]
    fn test_hand_built_layout_is_valid() {
        let rules = test_rules();
        let layout = crossing_layout(&rules);
        assert_eq!(Verifier::new(&rules).verify(&layout), Verdict::Valid);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 21.0)]));
        let verifier = Verifier::new(&rules);
        let first = verifier.verify(&layout);
        assert_eq!(first, verifier.verify(&layout));
        assert!(!first.is_valid());
    }

    #[test]
    fn test_short_segment_is_min_length() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 21.0)]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::MinLength]);
        let v = &verdict.violations()[0];
        assert_eq!(
            v.entities,
            vec![EntityRef::Segment(SegmentId { layer: 1, track: 1, index: 0 })]
        );
        assert_eq!(v.measured, 21.0);
        assert_eq!(v.bound, 42.0);
    }

    #[test]
    fn test_long_segment_is_max_length() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 105.0)]));
        assert_eq!(verify(&layout).rules(), vec![Rule::MaxLength]);
    }

    #[test]
    fn test_narrow_gap_is_min_t2t() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 42.0), (63.0, 105.0)]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::MinTipToTip]);
        assert_eq!(verdict.violations()[0].measured, 21.0);
        assert_eq!(verdict.violations()[0].entities.len(), 2);
    }

    #[test]
    fn test_off_grid_gap_and_length() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 52.5), (105.0, 147.0)]));
        let rules_hit = verify(&layout).rules();
        assert!(rules_hit.contains(&Rule::LengthGrid));
        assert!(rules_hit.contains(&Rule::TipToTipGrid));
    }

    #[test]
    fn test_shifted_via_breaks_enclosure_x() {
        let rules = test_rules();
        let mut layout = Layout::new("shifted", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        // One manufacturing-grid step toward the M1 line end.
        layout.push_via(via_at(10.0, 10.5, 0));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::EnclosureX]);
        assert_eq!(verdict.violations()[0].measured, 4.5);
        assert_eq!(verdict.violations()[0].bound, 5.0);
    }

    #[test]
    fn test_shifted_via_breaks_enclosure_y() {
        let rules = test_rules();
        let mut layout = Layout::new("shifted", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.5, 10.0, 0));
        assert_eq!(verify(&layout).rules(), vec![Rule::EnclosureY]);
    }

    #[test]
    fn test_via_outside_wire_is_overlap() {
        let rules = test_rules();
        let mut layout = Layout::new("outside", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 84.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.5, 25.0, 0));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::ViaOverlap]);
        assert_eq!(verdict.violations()[0].measured, 9.5);
    }

    #[test]
    fn test_dangling_via_reference() {
        let rules = test_rules();
        let mut layout = Layout::new("dangling", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.5, 10.5, 0));
        assert_eq!(verify(&layout).rules(), vec![Rule::ViaLayer]);
    }

    #[test]
    fn test_via_pitch_checked_along_rows() {
        let rules = test_rules();
        let mut layout = Layout::new("row", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 84.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 1, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.5, 10.5, 0));
        layout.push_via(via_at(52.5, 10.5, 1));
        assert!(verify(&layout).is_valid());

        // Raise the pitch one manufacturing-grid step above the 42nm spacing.
        let mut spec = rules.spec().clone();
        spec.via_pitch_x = 42.5;
        let tight = DesignRules::new(spec).unwrap();
        let verdict = Verifier::new(&tight).verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::ViaPitchX]);
        assert_eq!(
            verdict.violations()[0].entities,
            vec![EntityRef::Via(0), EntityRef::Via(1)]
        );
    }

    #[test]
    fn test_via_pitch_checked_along_columns() {
        let mut spec = test_rules().spec().clone();
        spec.via_pitch_y = 50.0;
        let rules = DesignRules::new(spec).unwrap();
        let mut layout = Layout::new("column", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(1, 1, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 84.0)]));
        layout.push_via(via_at(10.5, 10.5, 0));
        layout.push_via(Via::new(
            3,
            SegmentId { layer: 1, track: 1, index: 0 },
            SegmentId { layer: 2, track: 0, index: 0 },
            Point::new(10.5, 52.5),
            11.0,
            11.0,
        ));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::ViaPitchY]);
        assert_eq!(verdict.violations()[0].measured, 42.0);
    }

    #[test]
    fn test_broken_rail() {
        let rules = DesignRules::new(RuleSpec::reference()).unwrap();
        let mut layout = Layout::new("rail", rules.clone(), 0);
        let mut rail = Track::new(1, 0, 0.0, Orientation::Horizontal, FillStyle::Continuous, 5533.0);
        rail.push_segment(WireSegment::new(0.0, 5512.0, 21.0));
        layout.push_track(rail);
        assert_eq!(verify(&layout).rules(), vec![Rule::RailSpan]);
    }

    #[test]
    fn test_track_geometry_checks() {
        let rules = test_rules();
        let mut layout = Layout::new("tracks", rules.clone(), 0);
        let mut off = track(1, 1, &[]);
        off.offset = 40.0;
        layout.push_track(off);
        let mut wrong = track(2, 0, &[]);
        wrong.orientation = Orientation::Horizontal;
        layout.push_track(wrong);
        layout.push_track(track(7, 0, &[]));
        let mut wide = track(1, 2, &[(0.0, 42.0)]);
        wide.length = 100.0;
        layout.push_track(wide);
        assert_eq!(
            verify(&layout).rules(),
            vec![
                Rule::TrackOffset,
                Rule::TrackOrientation,
                Rule::UnknownLayer,
                Rule::TrackLength,
            ]
        );
    }

    #[test]
    fn test_duplicate_track_is_overlap() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::TrackOverlap]);
        assert_eq!(verdict.violations()[0].measured, 0.0);
        assert_eq!(
            verdict.violations()[0].entities,
            vec![
                EntityRef::Track { layer: 1, index: 0 },
                EntityRef::Track { layer: 1, index: 0 },
            ]
        );
    }

    #[test]
    fn test_crowded_neighbour_is_overlap() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        let mut close = track(1, 1, &[(84.0, 126.0)]);
        close.offset = 10.0;
        layout.push_track(close);
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::TrackOffset, Rule::TrackOverlap]);
        assert_eq!(verdict.violations()[1].measured, 10.0);
        assert_eq!(verdict.violations()[1].bound, 21.0);
    }

    #[test]
    fn test_wide_gap_is_max_t2t() {
        let mut spec = test_rules().spec().clone();
        spec.max_t2t = 63.0;
        let rules = DesignRules::new(spec).unwrap();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 42.0), (126.0, 168.0)]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::MaxTipToTip]);
        assert_eq!(verdict.violations()[0].measured, 84.0);
        assert_eq!(verdict.violations()[0].bound, 63.0);
    }

    #[test]
    fn test_grown_bbox_is_bounding_box() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.set_bbox(BBox::new(Point::new(0.0, 0.0), Point::new(168.0, 168.5)));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::BoundingBox]);
        assert_eq!(verdict.violations()[0].measured, 168.5);
    }

    #[test]
    fn test_track_past_extent_is_track_bounds() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 4, &[]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::TrackBounds]);
        assert_eq!(verdict.violations()[0].measured, 189.0);
    }

    #[test]
    fn test_wide_segment_is_wire_width() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        let mut wide = track(1, 1, &[]);
        wide.push_segment(WireSegment::new(0.0, 42.0, 21.5));
        layout.push_track(wide);
        assert_eq!(verify(&layout).rules(), vec![Rule::WireWidth]);
    }

    #[test]
    fn test_segment_past_track_end_is_segment_bounds() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(126.5, 168.5)]));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::SegmentBounds]);
        assert_eq!(verdict.violations()[0].measured, 168.5);
    }

    #[test]
    fn test_touching_segments_are_segment_order() {
        let rules = test_rules();
        let mut layout = crossing_layout(&rules);
        layout.push_track(track(1, 1, &[(0.0, 42.0), (42.0, 84.0)]));
        assert_eq!(verify(&layout).rules(), vec![Rule::SegmentOrder]);
    }

    #[test]
    fn test_off_grid_via_center() {
        let rules = test_rules();
        let mut layout = Layout::new("off_grid", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        layout.push_via(via_at(10.75, 10.5, 0));
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::OffGrid]);
        assert_eq!(verdict.violations()[0].measured, 10.75);
    }

    #[test]
    fn test_narrow_via_is_via_size() {
        let rules = test_rules();
        let mut layout = Layout::new("narrow", rules.clone(), 0);
        layout.push_track(track(1, 0, &[(0.0, 42.0)]));
        layout.push_track(track(2, 0, &[(0.0, 42.0)]));
        let mut via = via_at(10.5, 10.5, 0);
        via.width = 10.5;
        layout.push_via(via);
        let verdict = verify(&layout);
        assert_eq!(verdict.rules(), vec![Rule::ViaSize]);
        assert_eq!(verdict.violations()[0].measured, 10.5);
        assert_eq!(verdict.violations()[0].bound, 11.0);
    }

    #[test]
    fn test_generated_walk_verifies() {
        // Single random M1 over a 378nm square: nine tracks, each with at
        // most floor((378 + 42) / (42 + 42)) = 5 segments.
        let mut spec = RuleSpec::reference();
        spec.total_x = 378.0;
        spec.total_y = 378.0;
        spec.layers = LayerStack::new()
            .with_metal(MetalLayer::new(1, "M1", Orientation::Horizontal, 42.0, 110));
        let rules = DesignRules::new(spec).unwrap();
        for seed in 0..20 {
            let layout = generate(&rules, seed);
            assert_eq!(layout.tracks().len(), 9);
            for t in layout.tracks() {
                assert!((1..=5).contains(&t.segment_count()), "{}", t.segment_count());
            }
            assert_eq!(verify(&layout), Verdict::Valid, "seed {seed}");
        }
    }

    #[test]
    fn test_generated_reference_verifies() {
        let mut spec = RuleSpec::reference();
        spec.total_x = 1008.0;
        spec.total_y = 966.0;
        let rules = DesignRules::new(spec).unwrap();
        for seed in [0, 7, 42] {
            let layout = generate(&rules, seed);
            assert!(!layout.vias().is_empty());
            let verdict = verify(&layout);
            assert!(verdict.is_valid(), "{:?}", verdict.violations());
        }
    }
}
