//! Via candidates: every crossing of a horizontal and a vertical segment that
//! can hold a via with the required line-end enclosure.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Point, Via, EPSILON};
use crate::layer::ViaLayer;
use crate::rules::DesignRules;
use crate::spatial::{SegmentEntry, SegmentIndex};
use crate::tracks::{SegmentId, Track, WireSegment};
use crate::LayerId;

/// A potential via position joining two crossing segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaCandidate {
    pub via_layer: LayerId,
    pub center: Point,
    pub bottom: SegmentId,
    pub top: SegmentId,
    /// Index of the vertical track the candidate sits on.
    pub column: usize,
    /// Index of the horizontal track the candidate sits on.
    pub row: usize,
}

impl ViaCandidate {
    /// Copy this candidate into a new [`Via`] record.
    pub fn promote(&self, rules: &DesignRules) -> Via {
        Via::new(
            self.via_layer,
            self.bottom,
            self.top,
            self.center,
            rules.via_x,
            rules.via_y,
        )
    }
}

/// A via-track axis: one column or one row of a via layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisKey {
    pub via_layer: LayerId,
    pub track: usize,
}

/// Candidates sharing a vertical track, keyed by via layer and column.
pub fn group_by_column<'a, I>(candidates: I) -> BTreeMap<AxisKey, Vec<&'a ViaCandidate>>
where
    I: IntoIterator<Item = &'a ViaCandidate>,
{
    group_by(candidates, |c| c.column)
}

/// Candidates sharing a horizontal track, keyed by via layer and row.
pub fn group_by_row<'a, I>(candidates: I) -> BTreeMap<AxisKey, Vec<&'a ViaCandidate>>
where
    I: IntoIterator<Item = &'a ViaCandidate>,
{
    group_by(candidates, |c| c.row)
}

fn group_by<'a, I, F>(candidates: I, track: F) -> BTreeMap<AxisKey, Vec<&'a ViaCandidate>>
where
    I: IntoIterator<Item = &'a ViaCandidate>,
    F: Fn(&ViaCandidate) -> usize,
{
    let mut groups: BTreeMap<AxisKey, Vec<&'a ViaCandidate>> = BTreeMap::new();
    for candidate in candidates {
        let key = AxisKey {
            via_layer: candidate.via_layer,
            track: track(candidate),
        };
        groups.entry(key).or_default().push(candidate);
    }
    groups
}

/// Enclosure test for a via box on a pair of crossing segments.
fn admissible(
    via: &BBox,
    horizontal: (&Track, &WireSegment),
    vertical: (&Track, &WireSegment),
    rules: &DesignRules,
) -> bool {
    let (h_track, h_seg) = horizontal;
    let (v_track, v_seg) = vertical;

    if !h_track.segment_bbox(h_seg).contains_bbox(via)
        || !v_track.segment_bbox(v_seg).contains_bbox(via)
    {
        return false;
    }

    via.min.x - h_seg.start >= rules.enclosure_x - EPSILON
        && h_seg.end - via.max.x >= rules.enclosure_x - EPSILON
        && via.min.y - v_seg.start >= rules.enclosure_y - EPSILON
        && v_seg.end - via.max.y >= rules.enclosure_y - EPSILON
}

/// Derive the admissible candidates of one via layer.
///
/// Vertical segments are indexed in an R-tree; each horizontal track is then
/// scanned in parallel. The result is ordered by row, then by x.
pub fn derive_candidates(
    tracks: &[Track],
    via_layer: &ViaLayer,
    rules: &DesignRules,
) -> Vec<ViaCandidate> {
    let stack = rules.layers();
    let (Some(bottom), Some(top)) = (stack.metal(via_layer.bottom), stack.metal(via_layer.top))
    else {
        return Vec::new();
    };
    let (h_layer, v_layer) = if bottom.orientation.is_horizontal() {
        (bottom.id, top.id)
    } else {
        (top.id, bottom.id)
    };

    let vertical: HashMap<usize, &Track> = tracks
        .iter()
        .filter(|t| t.layer == v_layer)
        .map(|t| (t.index, t))
        .collect();
    let entries = vertical
        .values()
        .flat_map(|track| {
            track
                .segments()
                .iter()
                .enumerate()
                .map(move |(i, s)| SegmentEntry {
                    segment: track.segment_id(i),
                    bbox: track.segment_bbox(s),
                })
        })
        .collect();
    let index = SegmentIndex::build(entries);

    let horizontal: Vec<&Track> = tracks.iter().filter(|t| t.layer == h_layer).collect();
    let manufacturing = rules.grids().manufacturing;

    let mut candidates: Vec<ViaCandidate> = horizontal
        .par_iter()
        .flat_map_iter(|&h_track| {
            let cy = manufacturing.snap(h_track.centerline(rules.wire_cd));
            let mut row = Vec::new();
            for (h_index, h_seg) in h_track.segments().iter().enumerate() {
                for hit in index.query_intersecting(&h_track.segment_bbox(h_seg)) {
                    let Some(&v_track) = vertical.get(&hit.segment.track) else {
                        continue;
                    };
                    let Some(v_seg) = v_track.segment(hit.segment.index) else {
                        continue;
                    };
                    let cx = manufacturing.snap(v_track.centerline(rules.wire_cd));
                    let center = Point::new(cx, cy);
                    let via = BBox::centered(center, rules.via_x, rules.via_y);
                    if !admissible(&via, (h_track, h_seg), (v_track, v_seg), rules) {
                        continue;
                    }

                    let h_id = h_track.segment_id(h_index);
                    let (bottom, top) = if via_layer.bottom == h_layer {
                        (h_id, hit.segment)
                    } else {
                        (hit.segment, h_id)
                    };
                    row.push(ViaCandidate {
                        via_layer: via_layer.id,
                        center,
                        bottom,
                        top,
                        column: v_track.index,
                        row: h_track.index,
                    });
                }
            }
            row.sort_by(|a, b| a.center.x.total_cmp(&b.center.x));
            row
        })
        .collect();
    candidates.sort_by(|a, b| a.row.cmp(&b.row).then(a.center.x.total_cmp(&b.center.x)));

    log::debug!(
        "{}: {} candidates from {} horizontal and {} vertical tracks",
        via_layer.name,
        candidates.len(),
        horizontal.len(),
        vertical.len()
    );
    candidates
}

/// Derive the candidates of every via layer in stack order.
pub fn derive_all_candidates(tracks: &[Track], rules: &DesignRules) -> Vec<ViaCandidate> {
    rules
        .layers()
        .vias()
        .iter()
        .flat_map(|via_layer| derive_candidates(tracks, via_layer, rules))
        .collect()
}
