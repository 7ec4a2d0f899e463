//! Beacon geometry resolver.
//!
//! Two beacons are mounted on the robot at a known separation, left and
//! right of its centreline. Their midpoint sits `forward_offset` behind the
//! robot centre. The lateral axis runs right → left; rotating it by −90°
//! gives the forward axis and hence the heading. Readings are projected onto
//! the floor plane.
//!
//! # Example
//!
//! ```rust
//! use domino_localization::beacon::{BeaconPair, BeaconPosition, resolve};
//!
//! let pair = BeaconPair {
//!     left: BeaconPosition::new(0.0, 0.25, 0.0),
//!     right: BeaconPosition::new(0.0, -0.25, 0.0),
//! };
//! let pose = resolve(&pair, 0.3, 0.5).unwrap();
//! assert!((pose.x - 0.3).abs() < 1e-9);
//! assert!(pose.heading_rad.abs() < 1e-9);
//! ```

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use domino_types::{BeaconConfig, DominoError, Point2, Pose2D};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Relative separation deviation accepted by [`resolve`].
pub const DEFAULT_SEPARATION_TOLERANCE: f64 = 0.1;

/// A triangulated beacon position in the map frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BeaconPosition {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl BeaconPosition {
    /// Create a new beacon reading.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Floor-plane projection.
    pub fn planar(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Readings for the two beacons on one rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeaconPair {
    pub left: BeaconPosition,
    pub right: BeaconPosition,
}

impl BeaconPair {
    /// Planar distance between the two beacons.
    pub fn separation(&self) -> f64 {
        self.left.planar().distance(self.right.planar())
    }
}

/// Resolve with [`DEFAULT_SEPARATION_TOLERANCE`].
pub fn resolve(pair: &BeaconPair, forward_offset: f64, separation: f64) -> Result<Pose2D, DominoError> {
    resolve_with_tolerance(pair, forward_offset, separation, DEFAULT_SEPARATION_TOLERANCE)
}

/// Pose of the body carrying `pair`.
///
/// Fails with [`DominoError::BeaconGeometry`] when the measured separation
/// falls outside `separation · (1 ± tolerance)`. Such readings are usually a
/// dropped or noisy beacon; discard and retry.
pub fn resolve_with_tolerance(
    pair: &BeaconPair,
    forward_offset: f64,
    separation: f64,
    tolerance: f64,
) -> Result<Pose2D, DominoError> {
    let left = pair.left.planar();
    let right = pair.right.planar();
    let measured = left.distance(right);

    // A coincident pair has no direction; the band check catches it as long
    // as the expected separation is positive and finite.
    let geometry_ok =
        separation.is_finite() && separation > 0.0 && tolerance.is_finite() && tolerance >= 0.0;
    let band = separation * tolerance;
    let within_band = (measured - separation).abs() <= band;
    if !geometry_ok || !measured.is_finite() || measured <= 0.0 || !within_band {
        return Err(DominoError::BeaconGeometry {
            measured,
            expected: separation,
            tolerance,
        });
    }

    let lateral = left - right;
    let forward = lateral.rotate(-FRAC_PI_2) * (1.0 / measured);
    let centre = left.midpoint(right) + forward * forward_offset;
    Ok(Pose2D::from_position(centre, forward.angle()))
}

// ────────────────────────────────────────────────────────────────────────────
// BeaconResolver
// ────────────────────────────────────────────────────────────────────────────

/// [`resolve`] bound to the configured beacon geometry and device map.
#[derive(Debug, Clone)]
pub struct BeaconResolver {
    config: BeaconConfig,
}

impl BeaconResolver {
    /// Resolver for the configured pair geometry and device map.
    pub fn new(config: &BeaconConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The beacon section this resolver was built from.
    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Robot centre pose from the robot's beacon pair.
    pub fn resolve(&self, pair: &BeaconPair) -> Result<Pose2D, DominoError> {
        let result = resolve_with_tolerance(
            pair,
            self.config.mm_forward_offset,
            self.config.mm_beacon_sep,
            self.config.separation_tolerance,
        );
        match &result {
            Ok(pose) => debug!(%pose, "robot pose resolved"),
            Err(e) => warn!(error = %e, "discarding beacon reading"),
        }
        result
    }

    /// Midpoint pose of a fixed reference pair surveyed `separation` apart.
    pub fn resolve_static(&self, pair: &BeaconPair, separation: f64) -> Result<Pose2D, DominoError> {
        resolve_with_tolerance(pair, 0.0, separation, self.config.separation_tolerance).inspect_err(|e| {
            warn!(error = %e, "discarding static beacon reading");
        })
    }

    /// Assemble the pair for `device` (`"static"` or a robot id) from
    /// readings keyed by beacon id. `None` when the device is unknown or one
    /// of its beacons has no reading.
    pub fn pair_for(&self, device: &str, readings: &HashMap<u32, BeaconPosition>) -> Option<BeaconPair> {
        let ids = self.config.device_map.get(device)?;
        Some(BeaconPair {
            left: *readings.get(&ids.left)?,
            right: *readings.get(&ids.right)?,
        })
    }
}
