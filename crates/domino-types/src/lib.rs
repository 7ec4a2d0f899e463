//! `domino-types` – shared vocabulary for the domino mosaic stack.
//!
//! Geometry primitives used by every frame in the system, the palette colour
//! type, the [`DominoError`] taxonomy and the immutable [`DominoConfig`]
//! value that every component receives at construction.

pub mod config;

pub use config::{
    BeaconConfig, BeaconIds, DominoConfig, DominoGeometry, FieldConfig, LocalizationConfig,
    MosaicConfig, PaletteColor, RenderConfig, RuntimeConfig,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Geometry primitives
// ────────────────────────────────────────────────────────────────────────────

/// A 2-D point or vector. Units depend on the frame (metres for every metric
/// frame).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Unit vector pointing along `angle_rad` (counter-clockwise from +X).
    pub fn from_angle(angle_rad: f64) -> Self {
        Self::new(angle_rad.cos(), angle_rad.sin())
    }

    /// Dot product.
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `rhs`.
    pub fn distance(self, rhs: Self) -> f64 {
        (self - rhs).norm()
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate(self, angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }

    /// Angle of this vector, measured counter-clockwise from +X.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Point halfway to `rhs`.
    pub fn midpoint(self, rhs: Self) -> Self {
        Self::new((self.x + rhs.x) * 0.5, (self.y + rhs.y) * 0.5)
    }
}

impl Add for Point2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// A 2-D position plus heading (radians, counter-clockwise from +X).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
}

impl Pose2D {
    /// Create a new pose.
    pub const fn new(x: f64, y: f64, heading_rad: f64) -> Self {
        Self { x, y, heading_rad }
    }

    /// Pose at `position` facing `heading_rad`.
    pub fn from_position(position: Point2, heading_rad: f64) -> Self {
        Self::new(position.x, position.y, heading_rad)
    }

    /// The (x, y) part.
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[x: {:.3}, y: {:.3}, a: {:.3}]",
            self.x, self.y, self.heading_rad
        )
    }
}

/// Planar velocity: translational components plus yaw rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity2D {
    pub vx: f64,
    pub vy: f64,
    pub va: f64,
}

impl Velocity2D {
    /// Create a new velocity.
    pub const fn new(vx: f64, vy: f64, va: f64) -> Self {
        Self { vx, vy, va }
    }

    /// Magnitude over all three components.
    pub fn norm(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy + self.va * self.va).sqrt()
    }
}

/// Axis-aligned rectangle with inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    /// Box spanning `min` to `max`.
    pub const fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn enclosing<I: IntoIterator<Item = Point2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    /// Inclusive containment test, widened by `tolerance` on every side.
    pub fn contains(&self, p: Point2, tolerance: f64) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }

    /// Corners counter-clockwise from `min`.
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

impl fmt::Display for Bounds2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

/// Position of a tile in the tile grid. Row 0 holds the image's top rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    pub row: usize,
    pub col: usize,
}

impl TileIndex {
    /// Create a new tile index.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile({}, {})", self.row, self.col)
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(angle_rad: f64) -> f64 {
    let wrapped = (angle_rad + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

// ────────────────────────────────────────────────────────────────────────────
// Colour
// ────────────────────────────────────────────────────────────────────────────

/// RGB colour with channels normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Create a new colour.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_squared(&self, other: &Rgb) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }

    /// 8-bit sRGB triple, clamping out-of-range channels.
    pub fn to_u8(&self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Every failure the planning, geometry and localization core can report.
///
/// All variants except [`DominoError::BeaconGeometry`] indicate a
/// configuration or input defect and should halt planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DominoError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error(
        "Invalid tiling: grid {grid_width}x{grid_height} is not divisible into {tile_width}x{tile_height} tiles"
    )]
    InvalidTiling {
        grid_width: usize,
        grid_height: usize,
        tile_width: usize,
        tile_height: usize,
    },

    #[error("Tile ({row}, {col}) out of range for a {tiles_y}x{tiles_x} tile grid")]
    TileIndexOutOfRange {
        row: usize,
        col: usize,
        tiles_y: usize,
        tiles_x: usize,
    },

    #[error("{what} at ({x:.4}, {y:.4}) is outside {bounds}")]
    OutOfBounds {
        what: String,
        x: f64,
        y: f64,
        bounds: Bounds2,
    },

    #[error(
        "Beacon separation {measured:.4} m deviates from expected {expected:.4} m by more than {pct:.0}%",
        pct = .tolerance * 100.0
    )]
    BeaconGeometry {
        measured: f64,
        expected: f64,
        tolerance: f64,
    },

    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl DominoError {
    /// Whether the caller should discard this reading and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DominoError::BeaconGeometry { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotate_quarter_turn_maps_x_to_y() {
        let p = Point2::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn enclosing_bounds_cover_all_points() {
        let b = Bounds2::enclosing([
            Point2::new(1.0, 5.0),
            Point2::new(-2.0, 3.0),
            Point2::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b.min, Point2::new(-2.0, -1.0));
        assert_eq!(b.max, Point2::new(4.0, 5.0));
        assert!(Bounds2::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn bounds_are_inclusive() {
        let b = Bounds2::new(Point2::new(0.0, 0.0), Point2::new(20.0, 15.0));
        assert!(b.contains(Point2::new(20.0, 15.0), 0.0));
        assert!(b.contains(Point2::new(0.0, 0.0), 0.0));
        assert!(!b.contains(Point2::new(21.0, 15.0), 0.0));
        assert!(!b.contains(Point2::new(-1e-6, 3.0), 0.0));
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_interval() {
        assert_abs_diff_eq!(normalize_angle(2.5 * PI), 0.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-2.5 * PI), -0.5 * PI, epsilon = 1e-12);
    }

    #[test]
    fn rgb_to_u8_clamps() {
        assert_eq!(Rgb::new(1.5, 0.0, -0.2).to_u8(), [255, 0, 0]);
        assert_eq!(Rgb::new(0.8, 0.8, 0.8).to_u8(), [204, 204, 204]);
    }

    #[test]
    fn only_beacon_errors_are_retryable() {
        let beacon = DominoError::BeaconGeometry {
            measured: 0.3,
            expected: 0.5715,
            tolerance: 0.1,
        };
        assert!(beacon.is_retryable());
        assert!(beacon.to_string().contains("10%"));
        assert!(!DominoError::InvalidImage("empty".into()).is_retryable());
    }

    #[test]
    fn out_of_bounds_display_names_the_target() {
        let err = DominoError::OutOfBounds {
            what: "coarse placement pose".to_string(),
            x: 21.0,
            y: 3.0,
            bounds: Bounds2::new(Point2::zero(), Point2::new(20.0, 15.0)),
        };
        let msg = err.to_string();
        assert!(msg.contains("coarse placement pose"));
        assert!(msg.contains("21.0000"));
    }
}
