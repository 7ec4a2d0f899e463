//! Pose estimator.
//!
//! Dead-reckons from robot-local velocity readings and pulls the estimate
//! toward absolute beacon poses. Beacons are less accurate while the robot
//! moves, so the blend weight falls linearly with speed:
//!
//! ```text
//! f = f0 − (f0 / v0)·|v|,   clamped to [0, f0]
//! ```
//!
//! where `f0` is `update_fraction_at_zero_vel` and `v0` is
//! `val_for_zero_update`.
//!
//! # Example
//!
//! ```rust
//! use domino_localization::PoseEstimator;
//! use domino_types::{LocalizationConfig, Pose2D, Velocity2D};
//!
//! let mut est = PoseEstimator::new(&LocalizationConfig::default());
//! est.update_velocity_reading(Velocity2D::new(1.0, 0.0, 0.0), 0.5);
//! assert!((est.pose().x - 0.5).abs() < 1e-9);
//!
//! // Stationary again: a beacon fix is taken at full weight.
//! est.update_velocity_reading(Velocity2D::new(0.0, 0.0, 0.0), 0.1);
//! est.update_position_reading(Pose2D::new(2.0, 1.0, 0.0));
//! assert!((est.pose().x - 2.0).abs() < 1e-9);
//! ```

use domino_types::{LocalizationConfig, Pose2D, Velocity2D, normalize_angle};
use tracing::trace;

// ────────────────────────────────────────────────────────────────────────────
// PoseEstimator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PoseEstimator {
    update_fraction_at_zero_vel: f64,
    val_for_zero_update: f64,
    pose: Pose2D,
    /// Last velocity reading, already rotated into the map frame.
    velocity: Velocity2D,
}

impl PoseEstimator {
    /// Start at the map origin, at rest.
    pub fn new(config: &LocalizationConfig) -> Self {
        Self::with_initial_pose(config, Pose2D::default())
    }

    /// Estimator starting at `pose` at rest.
    pub fn with_initial_pose(config: &LocalizationConfig, pose: Pose2D) -> Self {
        Self {
            update_fraction_at_zero_vel: config.update_fraction_at_zero_vel.clamp(0.0, 1.0),
            val_for_zero_update: config.val_for_zero_update,
            pose,
            velocity: Velocity2D::default(),
        }
    }

    /// Current pose estimate in the map frame.
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Map-frame velocity from the most recent reading.
    pub fn velocity(&self) -> Velocity2D {
        self.velocity
    }

    /// Blend weight for a beacon fix at the current speed.
    pub fn update_fraction(&self) -> f64 {
        let f0 = self.update_fraction_at_zero_vel;
        if self.val_for_zero_update <= 0.0 {
            return 0.0;
        }
        let f = f0 - (f0 / self.val_for_zero_update) * self.velocity.norm();
        f.clamp(0.0, f0)
    }

    /// Integrate a robot-local velocity over `dt` seconds. Non-positive `dt`
    /// is ignored.
    pub fn update_velocity_reading(&mut self, local: Velocity2D, dt: f64) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        let (s, c) = self.pose.heading_rad.sin_cos();
        self.velocity = Velocity2D::new(
            c * local.vx - s * local.vy,
            s * local.vx + c * local.vy,
            local.va,
        );

        self.pose.x += self.velocity.vx * dt;
        self.pose.y += self.velocity.vy * dt;
        self.pose.heading_rad = normalize_angle(self.pose.heading_rad + self.velocity.va * dt);
    }

    /// Pull the estimate toward an absolute pose (e.g. from the beacon
    /// resolver). Heading moves along the shorter way round.
    pub fn update_position_reading(&mut self, measured: Pose2D) {
        let f = self.update_fraction();
        self.pose.x += f * (measured.x - self.pose.x);
        self.pose.y += f * (measured.y - self.pose.y);
        let dh = normalize_angle(measured.heading_rad - self.pose.heading_rad);
        self.pose.heading_rad = normalize_angle(self.pose.heading_rad + f * dh);
        trace!(fraction = f, pose = %self.pose, "beacon fix blended");
    }

    /// Jump to `pose` and zero the velocity.
    pub fn reset(&mut self, pose: Pose2D) {
        self.pose = pose;
        self.velocity = Velocity2D::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn estimator() -> PoseEstimator {
        PoseEstimator::new(&LocalizationConfig::default())
    }

    #[test]
    fn starts_at_origin() {
        let est = estimator();
        assert_eq!(est.pose(), Pose2D::default());
        assert_eq!(est.update_fraction(), 1.0);
    }

    #[test]
    fn velocity_is_rotated_by_heading() {
        let mut est = PoseEstimator::with_initial_pose(
            &LocalizationConfig::default(),
            Pose2D::new(1.0, 1.0, FRAC_PI_2),
        );
        est.update_velocity_reading(Velocity2D::new(0.2, 0.0, 0.0), 2.0);
        assert_abs_diff_eq!(est.pose().x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(est.pose().y, 1.4, epsilon = 1e-9);
        assert_abs_diff_eq!(est.velocity().vy, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn angular_velocity_integrates_and_wraps() {
        let mut est = PoseEstimator::with_initial_pose(
            &LocalizationConfig::default(),
            Pose2D::new(0.0, 0.0, 0.9 * PI),
        );
        est.update_velocity_reading(Velocity2D::new(0.0, 0.0, 0.2 * PI), 1.0);
        assert_abs_diff_eq!(est.pose().heading_rad, -0.9 * PI, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut est = estimator();
        est.update_velocity_reading(Velocity2D::new(1.0, 1.0, 1.0), 0.0);
        est.update_velocity_reading(Velocity2D::new(1.0, 1.0, 1.0), -1.0);
        assert_eq!(est.pose(), Pose2D::default());
        assert_eq!(est.velocity(), Velocity2D::default());
    }

    #[test]
    fn update_fraction_falls_with_speed() {
        let mut est = estimator();
        est.update_velocity_reading(Velocity2D::new(0.05, 0.0, 0.0), 0.01);
        assert_abs_diff_eq!(est.update_fraction(), 0.5, epsilon = 1e-9);
        est.update_velocity_reading(Velocity2D::new(0.5, 0.0, 0.0), 0.01);
        assert_eq!(est.update_fraction(), 0.0);
    }

    #[test]
    fn fast_robot_ignores_beacon_fix() {
        let mut est = estimator();
        est.update_velocity_reading(Velocity2D::new(1.0, 0.0, 0.0), 0.1);
        let before = est.pose();
        est.update_position_reading(Pose2D::new(5.0, 5.0, 1.0));
        assert_eq!(est.pose(), before);
    }

    #[test]
    fn partial_blend_at_half_fraction() {
        let cfg = LocalizationConfig {
            update_fraction_at_zero_vel: 0.5,
            val_for_zero_update: 0.1,
        };
        let mut est = PoseEstimator::new(&cfg);
        est.update_position_reading(Pose2D::new(2.0, -4.0, 0.0));
        assert_abs_diff_eq!(est.pose().x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(est.pose().y, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn heading_blends_the_short_way_round() {
        let cfg = LocalizationConfig {
            update_fraction_at_zero_vel: 0.5,
            val_for_zero_update: 0.1,
        };
        let mut est = PoseEstimator::with_initial_pose(&cfg, Pose2D::new(0.0, 0.0, 0.9 * PI));
        est.update_position_reading(Pose2D::new(0.0, 0.0, -0.9 * PI));
        // Halfway across the ±π seam, not back through zero.
        assert_abs_diff_eq!(est.pose().heading_rad.abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn reset_clears_velocity() {
        let mut est = estimator();
        est.update_velocity_reading(Velocity2D::new(1.0, 0.0, 0.0), 1.0);
        est.reset(Pose2D::new(3.0, 3.0, 0.0));
        assert_eq!(est.pose(), Pose2D::new(3.0, 3.0, 0.0));
        assert_eq!(est.update_fraction(), 1.0);
    }
}
