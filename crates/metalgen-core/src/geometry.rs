use serde::{Deserialize, Serialize};

use crate::tracks::SegmentId;
use crate::LayerId;

/// Comparison tolerance for layout coordinates (nanometers).
pub const EPSILON: f64 = 1e-6;

/// A 2D point in layout coordinates (nanometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Box of `width × height` centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::new(
            Point::new(center.x - half_w, center.y - half_h),
            Point::new(center.x + half_w, center.y + half_h),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Whether `other` lies inside this box, within [`EPSILON`].
    pub fn contains_bbox(&self, other: &BBox) -> bool {
        other.min.x >= self.min.x - EPSILON
            && other.max.x <= self.max.x + EPSILON
            && other.min.y >= self.min.y - EPSILON
            && other.max.y <= self.max.y + EPSILON
    }

    /// Flattened `[min_x, min_y, max_x, max_y]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// A rectangle on a layer, defined by lower-left and upper-right corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub layer_id: LayerId,
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Rect {
    pub fn new(layer_id: LayerId, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            layer_id,
            lower_left: Point::new(x1.min(x2), y1.min(y2)),
            upper_right: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_bbox(layer_id: LayerId, bbox: &BBox) -> Self {
        Self::new(layer_id, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y)
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.lower_left, self.upper_right)
    }

    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// A via connecting a segment on the bottom metal to a segment on the top metal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub cut_layer: LayerId,
    pub bottom: SegmentId,
    pub top: SegmentId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl Via {
    pub fn new(
        cut_layer: LayerId,
        bottom: SegmentId,
        top: SegmentId,
        position: Point,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            cut_layer,
            bottom,
            top,
            position,
            width,
            height,
        }
    }

    pub fn bottom_layer(&self) -> LayerId {
        self.bottom.layer
    }

    pub fn top_layer(&self) -> LayerId {
        self.top.layer
    }

    pub fn bbox(&self) -> BBox {
        BBox::centered(self.position, self.width, self.height)
    }
}
