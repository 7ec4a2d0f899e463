//! Pixel-space preview of a finished plan.
//!
//! Rendering is independent of planning: it consumes a [`MosaicPlan`] and
//! maps every domino to a pixel rectangle whose size and spacing come from
//! the physical domino geometry at `meters_per_pixel`.

use domino_types::{DominoConfig, DominoError, DominoGeometry, RenderConfig, Rgb};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::planner::MosaicPlan;

/// Largest preview [`render_preview`] will allocate, in pixels.
pub const MAX_PREVIEW_PIXELS: u64 = 1 << 28;

/// Domino size and gaps in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelLayout {
    pub domino_width_px: u32,
    pub domino_height_px: u32,
    pub domino_spacing_x_px: u32,
    pub domino_spacing_y_px: u32,
}

impl PixelLayout {
    /// Round the physical domino geometry to pixels at `meters_per_pixel`.
    pub fn new(dominos: &DominoGeometry, render: &RenderConfig) -> Self {
        let px = |meters: f64| (meters / render.meters_per_pixel).round().max(0.0) as u32;
        Self {
            domino_width_px: px(dominos.domino_width),
            domino_height_px: px(dominos.domino_height),
            domino_spacing_x_px: px(dominos.domino_spacing_x),
            domino_spacing_y_px: px(dominos.domino_spacing_y),
        }
    }

    /// Layout for the `[dominos]` and `[render]` sections.
    pub fn from_config(config: &DominoConfig) -> Self {
        Self::new(&config.dominos, &config.render)
    }

    /// Horizontal distance between neighbouring dominoes, saturating.
    pub fn pitch_x(&self) -> u32 {
        self.domino_width_px.saturating_add(self.domino_spacing_x_px)
    }

    /// Vertical distance between neighbouring rows, saturating.
    pub fn pitch_y(&self) -> u32 {
        self.domino_height_px.saturating_add(self.domino_spacing_y_px)
    }
}

/// Axis-aligned pixel rectangle; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// `cells * pitch` in pixels, `None` when it does not fit a `u32`.
fn span(cells: usize, pitch: u32) -> Option<u32> {
    u32::try_from(cells).ok()?.checked_mul(pitch)
}

/// Pixel footprint of grid cell `(row, col)`, centred in its pitch cell.
///
/// Coordinates saturate at `u32::MAX` instead of wrapping.
pub fn domino_footprint(row: usize, col: usize, layout: &PixelLayout) -> PixelRect {
    let origin = |cells: usize, pitch: u32, spacing: u32| {
        span(cells, pitch).unwrap_or(u32::MAX).saturating_add(spacing / 2)
    };
    PixelRect {
        x: origin(col, layout.pitch_x(), layout.domino_spacing_x_px),
        y: origin(row, layout.pitch_y(), layout.domino_spacing_y_px),
        width: layout.domino_width_px,
        height: layout.domino_height_px,
    }
}

/// Draw `plan`: tile background, one-pixel tile outline, then every domino
/// in its palette colour.
///
/// # Errors
///
/// [`DominoError::InvalidConfig`] when the preview would not fit in
/// [`MAX_PREVIEW_PIXELS`], usually because `meters_per_pixel` is tiny.
pub fn render_preview(
    plan: &MosaicPlan,
    layout: &PixelLayout,
    render: &RenderConfig,
) -> Result<RgbImage, DominoError> {
    let too_large = || {
        DominoError::InvalidConfig(format!(
            "preview of {}x{} dominoes at {} m/px exceeds {MAX_PREVIEW_PIXELS} pixels",
            plan.grid.width(),
            plan.grid.height(),
            render.meters_per_pixel
        ))
    };
    let width = span(plan.grid.width(), layout.pitch_x()).ok_or_else(too_large)?;
    let height = span(plan.grid.height(), layout.pitch_y()).ok_or_else(too_large)?;
    if u64::from(width) * u64::from(height) > MAX_PREVIEW_PIXELS {
        return Err(too_large());
    }
    let background = image::Rgb(render.tile_background_color.to_u8());
    let edge = image::Rgb(render.tile_edge_color.to_u8());
    let mut img = RgbImage::from_pixel(width, height, background);

    let tile_w_px = span(plan.tiling.tile_width, layout.pitch_x()).ok_or_else(too_large)?;
    let tile_h_px = span(plan.tiling.tile_height, layout.pitch_y()).ok_or_else(too_large)?;
    for index in plan.tiling.indices() {
        let rect = PixelRect {
            x: span(index.col, tile_w_px).ok_or_else(too_large)?,
            y: span(index.row, tile_h_px).ok_or_else(too_large)?,
            width: tile_w_px,
            height: tile_h_px,
        };
        outline(&mut img, rect, edge);
    }

    for row in 0..plan.grid.height() {
        for col in 0..plan.grid.width() {
            let Some(color) = plan
                .grid
                .get(row, col)
                .and_then(|label| plan.palette.color(label))
            else {
                continue;
            };
            fill(&mut img, domino_footprint(row, col, layout), color.rgb);
        }
    }
    Ok(img)
}

fn fill(img: &mut RgbImage, rect: PixelRect, color: Rgb) {
    let px = image::Rgb(color.to_u8());
    let x_end = rect.x.saturating_add(rect.width).min(img.width());
    let y_end = rect.y.saturating_add(rect.height).min(img.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            img.put_pixel(x, y, px);
        }
    }
}

fn outline(img: &mut RgbImage, rect: PixelRect, px: image::Rgb<u8>) {
    if rect.width == 0 || rect.height == 0 || rect.x >= img.width() || rect.y >= img.height() {
        return;
    }
    let x_last = (rect.x.saturating_add(rect.width) - 1).min(img.width().saturating_sub(1));
    let y_last = (rect.y.saturating_add(rect.height) - 1).min(img.height().saturating_sub(1));
    for x in rect.x..=x_last {
        img.put_pixel(x, rect.y, px);
        img.put_pixel(x, y_last, px);
    }
    for y in rect.y..=y_last {
        img.put_pixel(rect.x, y, px);
        img.put_pixel(x_last, y, px);
    }
}
