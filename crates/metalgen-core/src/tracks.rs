use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Point, Rect};
use crate::layer::{FillStyle, MetalLayer, Orientation};
use crate::rules::DesignRules;
use crate::LayerId;

/// Address of a wire segment: metal layer, track index, position on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId {
    pub layer: LayerId,
    pub track: usize,
    pub index: usize,
}

/// A wire piece on a track, spanning `[start, end]` along the track axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSegment {
    pub start: f64,
    pub end: f64,
    pub width: f64,
}

impl WireSegment {
    pub fn new(start: f64, end: f64, width: f64) -> Self {
        Self { start, end, width }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// A routing track of one metal layer, owning its ordered segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub layer: LayerId,
    pub index: usize,
    /// Lower edge of the wire, perpendicular to the track axis.
    pub offset: f64,
    pub orientation: Orientation,
    pub fill: FillStyle,
    /// Usable extent along the track axis.
    pub length: f64,
    segments: Vec<WireSegment>,
}

impl Track {
    pub fn new(
        layer: LayerId,
        index: usize,
        offset: f64,
        orientation: Orientation,
        fill: FillStyle,
        length: f64,
    ) -> Self {
        Self {
            layer,
            index,
            offset,
            orientation,
            fill,
            length,
            segments: Vec::new(),
        }
    }

    /// Append a segment after the existing ones.
    pub fn push_segment(&mut self, segment: WireSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[WireSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&WireSegment> {
        self.segments.get(index)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_id(&self, index: usize) -> SegmentId {
        SegmentId {
            layer: self.layer,
            track: self.index,
            index,
        }
    }

    /// Centerline coordinate, perpendicular to the track axis.
    pub fn centerline(&self, wire_cd: f64) -> f64 {
        self.offset + wire_cd / 2.0
    }

    /// Layout-space box of a segment on this track.
    pub fn segment_bbox(&self, segment: &WireSegment) -> BBox {
        match self.orientation {
            Orientation::Horizontal => BBox::new(
                Point::new(segment.start, self.offset),
                Point::new(segment.end, self.offset + segment.width),
            ),
            Orientation::Vertical => BBox::new(
                Point::new(self.offset, segment.start),
                Point::new(self.offset + segment.width, segment.end),
            ),
        }
    }

    pub fn segment_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.segments
            .iter()
            .map(|s| Rect::from_bbox(self.layer, &self.segment_bbox(s)))
    }

    /// Total wire length on the track.
    pub fn wire_length(&self) -> f64 {
        self.segments.iter().map(WireSegment::length).sum()
    }
}

/// Lay out the tracks of `metal` across the bounding box.
///
/// Offsets are `index × track_pitch`; a track is kept while its wire fits
/// inside the box, so the last offset is at most `extent − wire_cd`.
pub fn build_tracks(metal: &MetalLayer, rules: &DesignRules) -> Vec<Track> {
    let extent = rules.track_extent(metal.orientation);
    let length = rules.track_length(metal.orientation);
    let manufacturing = rules.grids().manufacturing;

    let mut tracks = Vec::new();
    for index in 0.. {
        let offset = manufacturing.snap(index as f64 * metal.track_pitch);
        if offset + rules.wire_cd > extent + crate::geometry::EPSILON {
            break;
        }
        tracks.push(Track::new(
            metal.id,
            index,
            offset,
            metal.orientation,
            metal.fill,
            length,
        ));
    }

    log::debug!(
        "{}: {} {:?} tracks at pitch {} over {}",
        metal.name,
        tracks.len(),
        metal.orientation,
        metal.track_pitch,
        extent
    );
    tracks
}
