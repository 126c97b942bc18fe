use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;
use crate::tracks::SegmentId;

/// An entry in the R-tree spatial index, referencing a wire segment.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    pub segment: SegmentId,
    /// Layout-space box of the segment.
    pub bbox: BBox,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index over the segments of one metal layer.
pub struct SegmentIndex {
    tree: RTree<SegmentEntry>,
}

impl SegmentIndex {
    pub fn build(entries: Vec<SegmentEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All entries whose box touches or overlaps `area`.
    pub fn query_intersecting(&self, area: &BBox) -> Vec<&SegmentEntry> {
        let envelope = AABB::from_corners([area.min.x, area.min.y], [area.max.x, area.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
