//! Immutable configuration value for planning, geometry and localization.
//!
//! The core never reads files: a host (the CLI) deserialises a
//! [`DominoConfig`] once at startup and hands it to each component. Every
//! section defaults to the values of the reference installation, so a TOML
//! document only needs the fields it changes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::{Bounds2, DominoError, Point2, Rgb};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DominoConfig {
    pub mosaic: MosaicConfig,
    pub dominos: DominoGeometry,
    pub render: RenderConfig,
    pub field: FieldConfig,
    pub beacons: BeaconConfig,
    pub localization: LocalizationConfig,
    pub runtime: RuntimeConfig,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// A named palette entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaletteColor {
    pub name: String,
    pub rgb: Rgb,
}

impl PaletteColor {
    /// Create a named colour.
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// Image → grid → tile dimensions and the domino palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MosaicConfig {
    /// Ordered palette; earlier entries win distance ties.
    pub palette: Vec<PaletteColor>,
    /// Grid width in dominoes.
    pub desired_width: usize,
    /// Grid height in dominoes.
    pub desired_height: usize,
    /// Tile width in dominoes.
    pub tile_width: usize,
    /// Tile height in dominoes.
    pub tile_height: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            palette: vec![
                PaletteColor::new("black", Rgb::new(0.0, 0.0, 0.0)),
                PaletteColor::new("red", Rgb::new(1.0, 0.0, 0.0)),
                PaletteColor::new("blue", Rgb::new(0.0, 0.0, 1.0)),
                PaletteColor::new("green", Rgb::new(0.0, 1.0, 0.0)),
                PaletteColor::new("white", Rgb::new(1.0, 1.0, 1.0)),
            ],
            desired_width: 200,
            desired_height: 200,
            tile_width: 20,
            tile_height: 20,
        }
    }
}

/// Physical size of a single domino and the gap to its neighbours (metres).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DominoGeometry {
    pub domino_width: f64,
    pub domino_height: f64,
    pub domino_spacing_x: f64,
    pub domino_spacing_y: f64,
}

impl Default for DominoGeometry {
    fn default() -> Self {
        // Spacing chosen so every domino occupies a square 32 mm cell.
        Self {
            domino_width: 0.024,
            domino_height: 0.008,
            domino_spacing_x: 0.008,
            domino_spacing_y: 0.024,
        }
    }
}

impl DominoGeometry {
    /// Centre-to-centre distance between neighbouring columns.
    pub fn pitch_x(&self) -> f64 {
        self.domino_width + self.domino_spacing_x
    }

    /// Centre-to-centre distance between neighbouring rows.
    pub fn pitch_y(&self) -> f64 {
        self.domino_height + self.domino_spacing_y
    }
}

/// Preview rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RenderConfig {
    pub meters_per_pixel: f64,
    pub tile_background_color: Rgb,
    pub tile_edge_color: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            meters_per_pixel: 0.008,
            tile_background_color: Rgb::new(0.8, 0.8, 0.8),
            tile_edge_color: Rgb::new(0.0, 0.0, 1.0),
        }
    }
}

/// Map-frame environment: boundaries, field placement and staging offsets.
/// Distances in metres, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FieldConfig {
    pub robot_boundaries: Bounds2,
    pub base_station_boundaries: Bounds2,
    pub base_station_target_pose: Point2,
    pub base_station_coarse_pose_offset: Point2,
    pub domino_field_origin: Point2,
    pub domino_field_angle: f64,
    pub tile_placement_coarse_offset: Point2,
    /// Offset from a tile's origin to the robot centre, in field axes.
    pub frame_to_robot_offset: Point2,
    /// How far outside the field boundary the prep move stops.
    pub prep_position_distance: f64,
    /// How far outside the field boundary the exit move stops.
    pub exit_position_distance: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            robot_boundaries: Bounds2::new(Point2::new(0.0, 0.0), Point2::new(20.0, 15.0)),
            base_station_boundaries: Bounds2::new(Point2::new(2.0, 12.0), Point2::new(4.0, 14.0)),
            base_station_target_pose: Point2::new(3.0, 12.0),
            base_station_coarse_pose_offset: Point2::new(0.0, -2.0),
            domino_field_origin: Point2::new(12.0, 6.0),
            domino_field_angle: 90.0,
            tile_placement_coarse_offset: Point2::new(1.0, 1.0),
            frame_to_robot_offset: Point2::new(0.5, 0.0),
            prep_position_distance: 2.0,
            exit_position_distance: 2.0,
        }
    }
}

/// Beacon ids mounted on one rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BeaconIds {
    pub left: u32,
    pub right: u32,
}

/// Robot-mounted beacon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BeaconConfig {
    /// Metres from the beacon midpoint to the robot centre, along forward.
    pub mm_forward_offset: f64,
    /// Metres between the two robot beacons.
    pub mm_beacon_sep: f64,
    /// Accepted relative deviation of the measured separation.
    pub separation_tolerance: f64,
    /// Body name (`"static"` or a robot id) → beacon ids.
    pub device_map: BTreeMap<String, BeaconIds>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        let mut device_map = BTreeMap::new();
        device_map.insert("static".to_string(), BeaconIds { left: 1, right: 2 });
        device_map.insert("1".to_string(), BeaconIds { left: 6, right: 5 });
        Self {
            mm_forward_offset: 0.2969,
            mm_beacon_sep: 0.5715,
            separation_tolerance: 0.1,
            device_map,
        }
    }
}

/// Blending of absolute beacon poses into the dead-reckoned estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LocalizationConfig {
    /// Fraction of the beacon correction applied while stationary.
    pub update_fraction_at_zero_vel: f64,
    /// Speed at which beacon corrections stop being applied.
    pub val_for_zero_update: f64,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            update_fraction_at_zero_vel: 1.0,
            val_for_zero_update: 0.1,
        }
    }
}

/// Polling cadence and robot addressing for the external status poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seconds between status requests for each robot.
    pub robot_status_wait_time: f64,
    /// Seconds between status requests for the base station.
    pub base_station_status_wait_time: f64,
    /// Robot id → IP address.
    pub robots: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let mut robots = BTreeMap::new();
        robots.insert("1".to_string(), "192.168.1.4".to_string());
        Self {
            robot_status_wait_time: 0.5,
            base_station_status_wait_time: 1.0,
            robots,
        }
    }
}

impl RuntimeConfig {
    /// `robot_status_wait_time` as a [`Duration`].
    pub fn robot_status_interval(&self) -> Duration {
        Duration::from_secs_f64(self.robot_status_wait_time)
    }

    /// `base_station_status_wait_time` as a [`Duration`].
    pub fn base_station_status_interval(&self) -> Duration {
        Duration::from_secs_f64(self.base_station_status_wait_time)
    }

    /// Parsed address of `robot_id`, if configured and well-formed.
    pub fn robot_address(&self, robot_id: &str) -> Option<IpAddr> {
        self.robots.get(robot_id)?.parse().ok()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Derived quantities
// ────────────────────────────────────────────────────────────────────────────

impl DominoConfig {
    /// Metric width of one tile.
    pub fn tile_size_x_meters(&self) -> f64 {
        self.mosaic.tile_width as f64 * self.dominos.pitch_x()
    }

    /// Metric height of one tile.
    pub fn tile_size_y_meters(&self) -> f64 {
        self.mosaic.tile_height as f64 * self.dominos.pitch_y()
    }

    /// Tile columns in the mosaic.
    pub fn tiles_x(&self) -> usize {
        self.mosaic.desired_width / self.mosaic.tile_width.max(1)
    }

    /// Tile rows in the mosaic.
    pub fn tiles_y(&self) -> usize {
        self.mosaic.desired_height / self.mosaic.tile_height.max(1)
    }

    /// Metric width of the domino field.
    pub fn field_width(&self) -> f64 {
        self.tile_size_x_meters() * self.tiles_x() as f64
    }

    /// Metric height of the domino field.
    pub fn field_height(&self) -> f64 {
        self.tile_size_y_meters() * self.tiles_y() as f64
    }

    /// `domino_field_angle` in radians.
    pub fn field_angle_rad(&self) -> f64 {
        self.field.domino_field_angle.to_radians()
    }

    /// Map-frame bounding box of the (possibly rotated) domino field.
    pub fn domino_field_boundaries(&self) -> Bounds2 {
        let origin = self.field.domino_field_origin;
        let angle = self.field_angle_rad();
        let (w, h) = (self.field_width(), self.field_height());
        let corners = [
            Point2::zero(),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ];
        Bounds2::enclosing(corners.map(|c| origin + c.rotate(angle)))
            .unwrap_or(Bounds2::new(origin, origin))
    }

    /// Reject non-finite or physically meaningless constants.
    ///
    /// Palette and tiling checks belong to the mosaic planner, which reports
    /// them with their dedicated error variants.
    pub fn validate(&self) -> Result<(), DominoError> {
        let positive = [
            ("dominos.domino_width", self.dominos.domino_width),
            ("dominos.domino_height", self.dominos.domino_height),
            ("render.meters_per_pixel", self.render.meters_per_pixel),
            ("beacons.mm_beacon_sep", self.beacons.mm_beacon_sep),
            ("localization.val_for_zero_update", self.localization.val_for_zero_update),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DominoError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("dominos.domino_spacing_x", self.dominos.domino_spacing_x),
            ("dominos.domino_spacing_y", self.dominos.domino_spacing_y),
            ("field.prep_position_distance", self.field.prep_position_distance),
            ("field.exit_position_distance", self.field.exit_position_distance),
            ("runtime.robot_status_wait_time", self.runtime.robot_status_wait_time),
            (
                "runtime.base_station_status_wait_time",
                self.runtime.base_station_status_wait_time,
            ),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(DominoError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }

        let tol = self.beacons.separation_tolerance;
        if !(tol > 0.0 && tol < 1.0) {
            return Err(DominoError::InvalidConfig(format!(
                "beacons.separation_tolerance must lie in (0, 1), got {tol}"
            )));
        }
        let frac = self.localization.update_fraction_at_zero_vel;
        if !(0.0..=1.0).contains(&frac) {
            return Err(DominoError::InvalidConfig(format!(
                "localization.update_fraction_at_zero_vel must lie in [0, 1], got {frac}"
            )));
        }
        if !self.field.domino_field_angle.is_finite() || !self.beacons.mm_forward_offset.is_finite() {
            return Err(DominoError::InvalidConfig(
                "field angle and beacon forward offset must be finite".to_string(),
            ));
        }

        for (name, b) in [
            ("field.robot_boundaries", self.field.robot_boundaries),
            ("field.base_station_boundaries", self.field.base_station_boundaries),
        ] {
            if !(b.min.x <= b.max.x && b.min.y <= b.max.y) {
                return Err(DominoError::InvalidConfig(format!(
                    "{name} min corner must not exceed max corner, got {b}"
                )));
            }
        }
        Ok(())
    }
}
