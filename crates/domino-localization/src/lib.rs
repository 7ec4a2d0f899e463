//! `domino-localization` – robot pose from beacon readings.
//!
//! # Modules
//!
//! - [`beacon`] – [`BeaconResolver`][beacon::BeaconResolver]: turns one
//!   left/right beacon pair into a robot pose, rejecting readings whose
//!   separation disagrees with the mounted geometry.
//! - [`estimator`] – [`PoseEstimator`][estimator::PoseEstimator]:
//!   dead-reckons from velocity readings and blends in absolute beacon poses
//!   with a speed-dependent weight.

pub mod beacon;
pub mod estimator;

pub use beacon::{BeaconPair, BeaconPosition, BeaconResolver, resolve};
pub use estimator::PoseEstimator;
