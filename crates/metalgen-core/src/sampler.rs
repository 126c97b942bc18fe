//! Density-controlled, pitch-constrained via selection.
//!
//! Columns are scanned first: each candidate gets one uniform draw from its
//! column's stream and is kept when the draw is below the density and it sits
//! at least `via_pitch_y` above the last kept via of the column. The survivors
//! are then scanned per row, left to right, keeping those at least
//! `via_pitch_x` right of the last kept via. Earlier candidates win pitch
//! conflicts on both axes.

use rand::Rng;
use rayon::prelude::*;

use crate::candidates::{group_by_column, group_by_row, ViaCandidate};
use crate::geometry::{Via, EPSILON};
use crate::rng::{stream_rng, Stream};
use crate::rules::DesignRules;

fn column_scan<'a>(
    column: &[&'a ViaCandidate],
    rules: &DesignRules,
    rng: &mut impl Rng,
) -> Vec<&'a ViaCandidate> {
    let mut ordered = column.to_vec();
    ordered.sort_by(|a, b| a.center.y.total_cmp(&b.center.y));

    let mut kept = Vec::new();
    let mut last = f64::NEG_INFINITY;
    for candidate in ordered {
        let draw: f64 = rng.gen();
        if draw < rules.density && candidate.center.y - last >= rules.via_pitch_y - EPSILON {
            last = candidate.center.y;
            kept.push(candidate);
        }
    }
    kept
}

fn row_scan<'a>(row: &[&'a ViaCandidate], rules: &DesignRules) -> Vec<&'a ViaCandidate> {
    let mut ordered = row.to_vec();
    ordered.sort_by(|a, b| a.center.x.total_cmp(&b.center.x));

    let mut kept = Vec::new();
    let mut last = f64::NEG_INFINITY;
    for candidate in ordered {
        if candidate.center.x - last >= rules.via_pitch_x - EPSILON {
            last = candidate.center.x;
            kept.push(candidate);
        }
    }
    kept
}

/// Select vias from `candidates` and promote them.
///
/// Each column draws from its own stream, so the selection depends only on
/// the seed and the candidate set. Vias are returned ordered by via layer,
/// row and x.
pub fn sample_vias(candidates: &[ViaCandidate], rules: &DesignRules, seed: u64) -> Vec<Via> {
    let columns: Vec<_> = group_by_column(candidates).into_iter().collect();
    let survivors: Vec<&ViaCandidate> = columns
        .par_iter()
        .flat_map_iter(|(key, column)| {
            let mut rng = stream_rng(seed, Stream::ViaColumn, key.via_layer, key.track);
            column_scan(column, rules, &mut rng)
        })
        .collect();

    let rows: Vec<_> = group_by_row(survivors).into_iter().collect();
    let accepted: Vec<&ViaCandidate> = rows
        .par_iter()
        .flat_map_iter(|(_, row)| row_scan(row, rules))
        .collect();

    log::debug!(
        "sampled {} of {} candidates ({} after column pitch)",
        accepted.len(),
        candidates.len(),
        rows.iter().map(|(_, r)| r.len()).sum::<usize>()
    );
    accepted.into_iter().map(|c| c.promote(rules)).collect()
}
