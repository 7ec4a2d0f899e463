//! Mosaic planner: image → [`DominoGrid`] → [`Tile`] views.
//!
//! # Example
//!
//! ```rust
//! use domino_mosaic::MosaicPlanner;
//! use domino_types::MosaicConfig;
//! use image::{DynamicImage, RgbImage};
//!
//! let planner = MosaicPlanner::new(&MosaicConfig::default()).unwrap();
//! let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, image::Rgb([255, 0, 0])));
//!
//! let plan = planner.plan(&red).unwrap();
//! let tile = plan.tile(9, 9).unwrap();
//! assert_eq!(plan.palette.name(tile.get(0, 0).unwrap()), Some("red"));
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use domino_types::{DominoConfig, DominoError, MosaicConfig, Rgb, TileIndex};
use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::palette::Palette;
use crate::resample::resample;

// ────────────────────────────────────────────────────────────────────────────
// DominoGrid
// ────────────────────────────────────────────────────────────────────────────

/// Row-major grid of palette labels, one per domino.
///
/// `labels.len() == width * height` holds for every grid, deserialised ones
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridFields")]
pub struct DominoGrid {
    width: usize,
    height: usize,
    labels: Vec<usize>,
}

#[derive(Deserialize)]
struct GridFields {
    width: usize,
    height: usize,
    labels: Vec<usize>,
}

impl TryFrom<GridFields> for DominoGrid {
    type Error = DominoError;

    fn try_from(f: GridFields) -> Result<Self, Self::Error> {
        Self::new(f.width, f.height, f.labels)
    }
}

impl DominoGrid {
    /// Wrap row-major `labels`.
    ///
    /// # Errors
    ///
    /// [`DominoError::InvalidPlan`] when `labels` does not hold exactly
    /// `width * height` cells.
    pub fn new(width: usize, height: usize, labels: Vec<usize>) -> Result<Self, DominoError> {
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| DominoError::InvalidPlan(format!("grid {width}x{height} is too large")))?;
        if labels.len() != expected {
            return Err(DominoError::InvalidPlan(format!(
                "grid {width}x{height} needs {expected} labels, got {}",
                labels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> usize) -> Self {
        let mut labels = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                labels.push(f(row, col));
            }
        }
        Self {
            width,
            height,
            labels,
        }
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All labels, row-major.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Label at grid `(row, col)`, `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.height && col < self.width {
            self.labels.get(row * self.width + col).copied()
        } else {
            None
        }
    }

    /// One full grid row.
    pub fn row(&self, row: usize) -> Option<&[usize]> {
        let start = row.checked_mul(self.width)?;
        self.labels.get(start..start + self.width)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tiling
// ────────────────────────────────────────────────────────────────────────────

/// How a grid is partitioned into equal tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingInfo {
    pub tile_width: usize,
    pub tile_height: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl TilingInfo {
    /// Partition a `grid_width × grid_height` grid.
    ///
    /// # Errors
    ///
    /// [`DominoError::InvalidTiling`] when any dimension is zero or the grid
    /// does not divide evenly; partial tiles are never dropped silently.
    pub fn new(
        grid_width: usize,
        grid_height: usize,
        tile_width: usize,
        tile_height: usize,
    ) -> Result<Self, DominoError> {
        let invalid = DominoError::InvalidTiling {
            grid_width,
            grid_height,
            tile_width,
            tile_height,
        };
        if grid_width == 0 || grid_height == 0 || tile_width == 0 || tile_height == 0 {
            return Err(invalid);
        }
        if grid_width % tile_width != 0 || grid_height % tile_height != 0 {
            return Err(invalid);
        }
        Ok(Self {
            tile_width,
            tile_height,
            tiles_x: grid_width / tile_width,
            tiles_y: grid_height / tile_height,
        })
    }

    /// Tiles in the whole grid.
    pub fn tile_count(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    /// Bounds check for a tile index.
    ///
    /// # Errors
    ///
    /// [`DominoError::TileIndexOutOfRange`] outside `tiles_y × tiles_x`.
    pub fn check(&self, index: TileIndex) -> Result<(), DominoError> {
        if index.row < self.tiles_y && index.col < self.tiles_x {
            Ok(())
        } else {
            Err(DominoError::TileIndexOutOfRange {
                row: index.row,
                col: index.col,
                tiles_y: self.tiles_y,
                tiles_x: self.tiles_x,
            })
        }
    }

    /// Every tile index, row-major.
    pub fn indices(&self) -> impl Iterator<Item = TileIndex> + '_ {
        (0..self.tiles_y).flat_map(move |row| (0..self.tiles_x).map(move |col| TileIndex::new(row, col)))
    }
}

/// Read-only view of one tile's cells.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    grid: &'a DominoGrid,
    index: TileIndex,
    width: usize,
    height: usize,
}

impl<'a> Tile<'a> {
    /// Position of this tile in the tile grid.
    pub fn index(&self) -> TileIndex {
        self.index
    }

    /// Tile width in dominoes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Tile height in dominoes.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid (row, col) of this tile's first cell.
    pub fn grid_origin(&self) -> (usize, usize) {
        (self.index.row * self.height, self.index.col * self.width)
    }

    /// Label at tile-local `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let (r0, c0) = self.grid_origin();
        self.grid.get(r0 + row, c0 + col)
    }

    /// Tile-local row as a slice of the underlying grid.
    pub fn row(&self, row: usize) -> Option<&'a [usize]> {
        if row >= self.height {
            return None;
        }
        let (r0, c0) = self.grid_origin();
        self.grid.row(r0 + row)?.get(c0..c0 + self.width)
    }

    /// Every tile-local row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [usize]> + '_ {
        (0..self.height).filter_map(move |r| self.row(r))
    }

    /// Owned copy of the tile's labels, row by row.
    pub fn to_labels(&self) -> Vec<Vec<usize>> {
        self.rows().map(<[usize]>::to_vec).collect()
    }
}

fn tile_view<'g>(grid: &'g DominoGrid, tiling: &TilingInfo, row: usize, col: usize) -> Result<Tile<'g>, DominoError> {
    let index = TileIndex::new(row, col);
    tiling.check(index)?;
    Ok(Tile {
        grid,
        index,
        width: tiling.tile_width,
        height: tiling.tile_height,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// MosaicPlan
// ────────────────────────────────────────────────────────────────────────────

/// A finished, serialisable plan: palette, grid and tiling metadata.
///
/// Deserialisation rejects plans whose tiling does not partition the grid or
/// whose labels fall outside the palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanFields")]
pub struct MosaicPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub palette: Palette,
    pub grid: DominoGrid,
    pub tiling: TilingInfo,
}

#[derive(Deserialize)]
struct PlanFields {
    id: Uuid,
    created_at: DateTime<Utc>,
    palette: Palette,
    grid: DominoGrid,
    tiling: TilingInfo,
}

impl TryFrom<PlanFields> for MosaicPlan {
    type Error = DominoError;

    fn try_from(f: PlanFields) -> Result<Self, Self::Error> {
        let plan = MosaicPlan {
            id: f.id,
            created_at: f.created_at,
            palette: f.palette,
            grid: f.grid,
            tiling: f.tiling,
        };
        plan.validate()?;
        Ok(plan)
    }
}

impl MosaicPlan {
    /// Check that the tiling partitions the grid and every label names a
    /// palette colour.
    ///
    /// # Errors
    ///
    /// - [`DominoError::InvalidTiling`] – tiling does not match the grid.
    /// - [`DominoError::InvalidPlan`] – a label is outside the palette.
    pub fn validate(&self) -> Result<(), DominoError> {
        let t = &self.tiling;
        let expected = TilingInfo::new(self.grid.width(), self.grid.height(), t.tile_width, t.tile_height)?;
        if expected != *t {
            return Err(DominoError::InvalidTiling {
                grid_width: self.grid.width(),
                grid_height: self.grid.height(),
                tile_width: t.tile_width,
                tile_height: t.tile_height,
            });
        }
        let colours = self.palette.len();
        if let Some(&label) = self.grid.labels().iter().find(|&&l| l >= colours) {
            return Err(DominoError::InvalidPlan(format!(
                "label {label} is outside a palette of {colours} colours"
            )));
        }
        Ok(())
    }

    /// View of tile `(row, col)`.
    ///
    /// # Errors
    ///
    /// [`DominoError::TileIndexOutOfRange`] outside the tile grid.
    pub fn tile(&self, row: usize, col: usize) -> Result<Tile<'_>, DominoError> {
        tile_view(&self.grid, &self.tiling, row, col)
    }

    /// Every tile, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = Tile<'_>> + '_ {
        self.tiling.indices().map(move |index| Tile {
            grid: &self.grid,
            index,
            width: self.tiling.tile_width,
            height: self.tiling.tile_height,
        })
    }

    /// Number of dominoes needed per colour name (zero counts included).
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = vec![0usize; self.palette.len()];
        for &label in self.grid.labels() {
            if let Some(c) = counts.get_mut(label) {
                *c += 1;
            }
        }
        self.palette
            .iter()
            .zip(counts)
            .map(|(color, n)| (color.name.clone(), n))
            .collect()
    }

    /// Colour name at grid `(row, col)`.
    pub fn label_name(&self, row: usize, col: usize) -> Option<&str> {
        self.palette.name(self.grid.get(row, col)?)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MosaicPlanner
// ────────────────────────────────────────────────────────────────────────────

/// Turns images into [`MosaicPlan`]s for a fixed palette and grid size.
#[derive(Debug, Clone)]
pub struct MosaicPlanner {
    palette: Palette,
    width: usize,
    height: usize,
    tiling: TilingInfo,
}

impl MosaicPlanner {
    /// Planner for `config`'s palette, grid size and tiling.
    ///
    /// # Errors
    ///
    /// - [`DominoError::InvalidPalette`] – empty palette or duplicate names.
    /// - [`DominoError::InvalidTiling`] – grid not evenly divisible into tiles.
    pub fn new(config: &MosaicConfig) -> Result<Self, DominoError> {
        let palette = Palette::new(config.palette.clone())?;
        let tiling = TilingInfo::new(
            config.desired_width,
            config.desired_height,
            config.tile_width,
            config.tile_height,
        )?;
        Ok(Self {
            palette,
            width: config.desired_width,
            height: config.desired_height,
            tiling,
        })
    }

    /// Planner for the `[mosaic]` section.
    pub fn from_config(config: &DominoConfig) -> Result<Self, DominoError> {
        Self::new(&config.mosaic)
    }

    /// Palette copied into every plan.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Tiling applied to every plan.
    pub fn tiling(&self) -> &TilingInfo {
        &self.tiling
    }

    /// Resample, quantize and assemble a plan for `image`.
    ///
    /// # Errors
    ///
    /// [`DominoError::InvalidImage`] for empty or non-colour images.
    #[tracing::instrument(skip_all, fields(src_w = image.width(), src_h = image.height()))]
    pub fn plan(&self, image: &DynamicImage) -> Result<MosaicPlan, DominoError> {
        let cells = resample(image, self.width, self.height)?;
        debug!(cells = cells.len(), "resampled image to domino grid");

        let grid = self.quantize(&cells);
        let plan = MosaicPlan {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            palette: self.palette.clone(),
            grid,
            tiling: self.tiling,
        };
        info!(
            plan_id = %plan.id,
            width = self.width,
            height = self.height,
            tiles = self.tiling.tile_count(),
            counts = ?plan.label_counts(),
            "mosaic plan generated"
        );
        Ok(plan)
    }

    /// Open `path` with the `image` crate and plan it.
    ///
    /// # Errors
    ///
    /// [`DominoError::InvalidImage`] when the file cannot be decoded, plus
    /// everything [`MosaicPlanner::plan`] reports.
    pub fn plan_file(&self, path: &Path) -> Result<MosaicPlan, DominoError> {
        let image = image::open(path)
            .map_err(|e| DominoError::InvalidImage(format!("{}: {e}", path.display())))?;
        self.plan(&image)
    }

    /// Classify one averaged colour per cell into the grid.
    pub fn quantize(&self, cells: &[Rgb]) -> DominoGrid {
        let labels: Vec<usize> = cells.par_iter().map(|c| self.palette.nearest(c)).collect();
        DominoGrid {
            width: self.width,
            height: self.height,
            labels,
        }
    }

    /// View of tile `(row, col)` of `grid`.
    ///
    /// # Errors
    ///
    /// [`DominoError::TileIndexOutOfRange`] unless `row < tiles_y` and
    /// `col < tiles_x`.
    pub fn tile<'g>(&self, grid: &'g DominoGrid, row: usize, col: usize) -> Result<Tile<'g>, DominoError> {
        tile_view(grid, &self.tiling, row, col)
    }
}
