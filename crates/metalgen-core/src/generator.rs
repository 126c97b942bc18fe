//! The generation pipeline: tracks → walk → candidates → sampling.
//!
//! Each stage consumes the finished output of the previous one; there is no
//! feedback between stages. Verification lives in `metalgen-drc`.

use crate::candidates::{derive_all_candidates, ViaCandidate};
use crate::geometry::Via;
use crate::layer::FillStyle;
use crate::layout::{Layout, LayoutNote};
use crate::rules::DesignRules;
use crate::sampler::sample_vias;
use crate::tracks::{build_tracks, Track};
use crate::walker::walk_tracks;

/// Builds one layout from a rule set and a seed.
#[derive(Debug, Clone)]
pub struct Generator<'a> {
    rules: &'a DesignRules,
    seed: u64,
    name: String,
}

impl<'a> Generator<'a> {
    pub fn new(rules: &'a DesignRules, seed: u64) -> Self {
        Self {
            rules,
            seed,
            name: "metal_cell".to_string(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Empty tracks of every metal, in stack order.
    pub fn build_tracks(&self) -> Vec<Track> {
        self.rules
            .layers()
            .metals()
            .iter()
            .flat_map(|metal| build_tracks(metal, self.rules))
            .collect()
    }

    pub fn walk(&self, tracks: Vec<Track>) -> Vec<Track> {
        walk_tracks(tracks, self.rules, self.seed)
    }

    pub fn derive_candidates(&self, tracks: &[Track]) -> Vec<ViaCandidate> {
        derive_all_candidates(tracks, self.rules)
    }

    pub fn sample(&self, candidates: &[ViaCandidate]) -> Vec<Via> {
        sample_vias(candidates, self.rules, self.seed)
    }

    /// Run every stage and assemble the layout.
    pub fn run(&self) -> Layout {
        let tracks = self.walk(self.build_tracks());
        let candidates = self.derive_candidates(&tracks);
        let vias = self.sample(&candidates);

        let mut layout = Layout::new(&self.name, self.rules.clone(), self.seed);
        let mut empty = 0;
        for track in tracks {
            if track.fill == FillStyle::Random && track.is_empty() {
                log::debug!(
                    "{}: track {} of layer {} has no room for a segment",
                    self.name,
                    track.index,
                    track.layer
                );
                layout.add_note(LayoutNote::InsufficientSpace {
                    layer: track.layer,
                    track: track.index,
                });
                empty += 1;
            }
            layout.push_track(track);
        }
        for via in vias {
            layout.push_via(via);
        }
        layout.set_candidates(candidates);

        if empty > 0 {
            log::warn!("{}: {} tracks left empty", self.name, empty);
        }
        log::info!(
            "{}: {} tracks, {} segments, {} via candidates, {} vias (seed {})",
            self.name,
            layout.tracks().len(),
            layout.segment_count(),
            layout.candidates().len(),
            layout.vias().len(),
            self.seed
        );
        layout
    }
}

/// Generate a layout without verification.
pub fn generate(rules: &DesignRules, seed: u64) -> Layout {
    Generator::new(rules, seed).run()
}
