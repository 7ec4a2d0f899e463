//! `domino-geometry` – frame chain from domino grid to physical targets.
//!
//! # Modules
//!
//! - [`transform`] – [`Transform2D`][transform::Transform2D] rigid transforms
//!   and the [`FrameTree`][transform::FrameTree] that composes them between
//!   named frames.
//! - [`field`] – [`FieldLayout`][field::FieldLayout]: cell and tile offsets,
//!   tile placement targets, base-station docking and prep/exit staging.
//! - [`boundary`] – [`BoundaryVerifier`][boundary::BoundaryVerifier]: rule
//!   engine that rejects any target outside its configured boundary.

pub mod boundary;
pub mod field;
pub mod transform;

pub use boundary::{BaseStationRule, BoundaryVerifier, FieldBoundaryRule, RobotBoundaryRule, Rule, Target};
pub use field::{FieldLayout, PlacementTarget, StagedTarget};
pub use transform::{FrameTree, Transform2D};
