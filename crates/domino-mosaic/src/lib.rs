//! `domino-mosaic` – image to domino placement plan.
//!
//! # Modules
//!
//! - [`palette`] – [`Palette`][palette::Palette]: closed set of domino
//!   colours and nearest-colour classification.
//! - [`resample`] – area-averaging resampler that reduces an arbitrary image
//!   to one colour per domino cell.
//! - [`planner`] – [`MosaicPlanner`][planner::MosaicPlanner]: builds the
//!   [`DominoGrid`][planner::DominoGrid] and partitions it into
//!   [`Tile`][planner::Tile] views.
//! - [`render`] – pixel-space preview of a finished plan, independent of
//!   planning.

pub mod palette;
pub mod planner;
pub mod render;
pub mod resample;

pub use palette::Palette;
pub use domino_types::TileIndex;
pub use planner::{DominoGrid, MosaicPlan, MosaicPlanner, Tile, TilingInfo};
pub use render::{PixelLayout, PixelRect, domino_footprint, render_preview};
pub use resample::resample;
