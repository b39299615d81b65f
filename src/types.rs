//! Strongly-typed numeric primitives shared by the projection, scale and
//! layout code.
//!
//! Canvas coordinates are `glam::DVec2` in pixels with y pointing down;
//! geographic coordinates are `DVec2 { x: longitude, y: latitude }` in degrees.

use std::fmt;

use glam::{DVec2, dvec2};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Domain endpoints coincide, so normalizing into it would divide by zero
    Degenerate,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Degenerate => write!(f, "domain minimum equals maximum"),
        }
    }
}

impl std::error::Error for NumericError {}

fn check_finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// A non-degenerate numeric interval `[min, max]`.
///
/// Construction fails when `min == max`; callers use that failure to fall
/// back to a flat default instead of dividing by zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    min: f64,
    max: f64,
}

impl Domain {
    pub fn try_new(min: f64, max: f64) -> Result<Domain, NumericError> {
        let min = check_finite(min)?;
        let max = check_finite(max)?;
        if min == max {
            Err(NumericError::Degenerate)
        } else {
            Ok(Domain { min, max })
        }
    }

    #[inline]
    pub fn min(self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(self) -> f64 {
        self.max
    }

    /// Position of `value` inside the domain, clamped to `[0, 1]`.
    pub fn normalize_clamped(self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Linear interpolation between two values, exact at both ends
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Axis-aligned bounding box in canvas or projected space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: dvec2(f64::MAX, f64::MAX),
            max: dvec2(f64::MIN, f64::MIN),
        }
    }

    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        BBox {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box of the given size whose top-left corner is `origin`
    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self::from_corners(origin, origin + size)
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point; non-finite points are ignored
    pub fn expand_point(&mut self, p: DVec2) {
        if !p.is_finite() {
            return;
        }
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &BBox) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }

    /// True if `other` lies entirely inside this box
    pub fn contains_box(&self, other: &BBox) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Shrink the box by `margin` on every side
    pub fn inset(&self, margin: f64) -> BBox {
        BBox {
            min: self.min + DVec2::splat(margin),
            max: self.max - DVec2::splat(margin),
        }
    }
}
