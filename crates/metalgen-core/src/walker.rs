//! The per-track segment walk.

use rand::Rng;
use rayon::prelude::*;

use crate::geometry::EPSILON;
use crate::layer::FillStyle;
use crate::rng::{stream_rng, Stream};
use crate::rules::DesignRules;
use crate::tracks::{Track, WireSegment};

/// Fill one track with segments according to its fill style.
pub fn walk_track<R: Rng>(track: &mut Track, rules: &DesignRules, rng: &mut R) {
    match track.fill {
        FillStyle::Continuous => {
            track.push_segment(WireSegment::new(0.0, track.length, rules.wire_cd));
        }
        FillStyle::Random => random_walk(track, rules, rng),
    }
}

/// Alternate random segments and tip-to-tip gaps from the start of the track.
///
/// Lengths and gaps are drawn uniformly from their rule bounds, snapped to
/// their grids and kept within the legal grid multiples. A segment that would
/// run past the end of the track is cut back to the remaining space, which is
/// always at least the shortest legal length; the walk ends there.
fn random_walk<R: Rng>(track: &mut Track, rules: &DesignRules, rng: &mut R) {
    let grids = rules.grids();
    let (len_lo, len_hi) = grids.length_range;
    let (gap_lo, gap_hi) = grids.t2t_range;
    let snap = |v: f64| grids.manufacturing.snap(v);

    let mut cursor = 0.0;
    loop {
        let remaining = track.length - cursor;
        if remaining + EPSILON < len_lo {
            break;
        }

        let drawn = rng.gen_range(rules.min_length..=rules.max_length);
        let length = grids.length.snap_within(drawn, len_lo, len_hi);
        if cursor + length > track.length + EPSILON {
            let tail = grids.length.snap_down(remaining);
            track.push_segment(WireSegment::new(snap(cursor), snap(cursor + tail), rules.wire_cd));
            break;
        }
        track.push_segment(WireSegment::new(snap(cursor), snap(cursor + length), rules.wire_cd));

        let drawn = rng.gen_range(rules.min_t2t..=rules.max_t2t);
        let gap = grids.t2t.snap_within(drawn, gap_lo, gap_hi);
        cursor = snap(cursor + length + gap);
    }
}

/// Walk every track in parallel, each on its own seeded stream.
pub fn walk_tracks(tracks: Vec<Track>, rules: &DesignRules, seed: u64) -> Vec<Track> {
    tracks
        .into_par_iter()
        .map(|mut track| {
            let mut rng = stream_rng(seed, Stream::TrackWalk, track.layer, track.index);
            walk_track(&mut track, rules, &mut rng);
            track
        })
        .collect()
}
