//! Axis-aligned bounding rectangles.
//!
//! `BBox` is the unit of spatial pruning: every indexed geometry is reduced to
//! its minimum enclosing rectangle, and the R-tree reasons about rectangles
//! exclusively. Overlap tests are boundary-inclusive throughout.

use geo::{BoundingRect, Geometry, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `[min_x, min_y, max_x, max_y]`.
///
/// Degenerate (point) geometries yield `min_x == max_x`, `min_y == max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Identity element for union: expanding this by any rectangle yields
    /// that rectangle. Carried by freshly created and condensed tree nodes.
    pub const EMPTY: BBox = BBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// The all-plane envelope used as the pruning rectangle for the
    /// "disjoint" predicate. Never computed from data, never mutated, and
    /// never stored in the tree.
    pub const GLOBAL: BBox = BBox {
        min_x: f64::NEG_INFINITY,
        min_y: f64::NEG_INFINITY,
        max_x: f64::INFINITY,
        max_y: f64::INFINITY,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y, "inverted bounds");

        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Minimum enclosing rectangle of a geometry, `None` for geometries
    /// without extent (empty collections).
    pub fn from_geometry(geometry: &Geometry<f64>) -> Option<Self> {
        geometry.bounding_rect().map(Self::from_rect)
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }

    /// Interpret a GeoJSON `bbox` member. Accepts 2D (`[w, s, e, n]`) and 3D
    /// (`[w, s, z0, e, n, z1]`) forms, dropping the altitude band. Returns
    /// `None` for malformed arrays so the caller can fall back to deriving
    /// bounds from coordinates.
    pub fn from_geojson_bbox(bbox: &[f64]) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = match bbox.len() {
            4 => (bbox[0], bbox[1], bbox[2], bbox[3]),
            6 => (bbox[0], bbox[1], bbox[3], bbox[4]),
            _ => return None,
        };

        let candidate = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };

        (candidate.is_finite() && min_x <= max_x && min_y <= max_y).then_some(candidate)
    }

    pub fn is_finite(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Area, clamped to zero for the empty rectangle.
    pub fn area(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0) * (self.max_y - self.min_y).max(0.0)
    }

    /// Half-perimeter, the split-axis quality measure.
    pub fn margin(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0) + (self.max_y - self.min_y).max(0.0)
    }

    /// Grow in place to cover `other`.
    pub fn expand(&mut self, other: &BBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Minimum rectangle covering both operands.
    pub fn union(&self, other: &BBox) -> BBox {
        let mut merged = *self;
        merged.expand(other);
        merged
    }

    /// Boundary-inclusive overlap test on both axes.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Whether `other` lies entirely inside this rectangle (boundaries
    /// included).
    pub fn contains(&self, other: &BBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Area of the overlap region, zero when the operands do not intersect.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let width = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let height = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        width.max(0.0) * height.max(0.0)
    }
}
