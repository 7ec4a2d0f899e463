//! [`FieldLayout`] – metric layout of the domino field in the map.
//!
//! Grid column advances along the field's +x axis and grid row along +y.
//! The field frame sits at `domino_field_origin` in the map, rotated by
//! `domino_field_angle`. Every tile has a robot placement pose, a coarse
//! approach pose, and prep/exit staging poses just outside the field.
//!
//! # Example
//!
//! ```rust
//! use domino_geometry::FieldLayout;
//! use domino_types::{DominoConfig, TileIndex};
//!
//! let layout = FieldLayout::new(&DominoConfig::default()).unwrap();
//! let target = layout.placement_target(TileIndex::new(0, 0)).unwrap();
//!
//! assert!((target.fine.x - 12.0).abs() < 1e-9);
//! assert!((target.fine.y - 6.5).abs() < 1e-9);
//! ```

use domino_types::{
    Bounds2, DominoConfig, DominoError, DominoGeometry, FieldConfig, Point2, Pose2D, TileIndex,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boundary::{BoundaryVerifier, Target};
use crate::transform::{
    BASE_STATION_FRAME, FIELD_FRAME, FrameTree, MAP_FRAME, ROBOT_FRAME, TILE_FRAME, Transform2D,
};

/// A coarse approach pose followed by the fine pose it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagedTarget {
    pub coarse: Pose2D,
    pub fine: Pose2D,
}

/// Every map-frame pose needed to drop one tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementTarget {
    pub tile: TileIndex,
    /// Tile origin in the map frame.
    pub tile_origin: Point2,
    pub coarse: Pose2D,
    pub fine: Pose2D,
    pub prep: Pose2D,
    pub exit: Pose2D,
}

impl PlacementTarget {
    /// Coarse and fine poses only.
    pub fn staged(&self) -> StagedTarget {
        StagedTarget {
            coarse: self.coarse,
            fine: self.fine,
        }
    }
}

/// Precomputed field geometry for one configuration.
pub struct FieldLayout {
    dominos: DominoGeometry,
    field: FieldConfig,
    tile_width: usize,
    tile_height: usize,
    tiles_x: usize,
    tiles_y: usize,
    tile_size: Point2,
    field_size: Point2,
    field_in_map: Transform2D,
    field_bounds: Bounds2,
    verifier: BoundaryVerifier,
}

impl FieldLayout {
    /// Fails with `InvalidConfig` on bad constants and `InvalidTiling` when
    /// the grid does not split into whole tiles.
    pub fn new(config: &DominoConfig) -> Result<Self, DominoError> {
        config.validate()?;
        let mosaic = &config.mosaic;
        if mosaic.tile_width == 0
            || mosaic.tile_height == 0
            || mosaic.desired_width == 0
            || mosaic.desired_height == 0
            || mosaic.desired_width % mosaic.tile_width != 0
            || mosaic.desired_height % mosaic.tile_height != 0
        {
            return Err(DominoError::InvalidTiling {
                grid_width: mosaic.desired_width,
                grid_height: mosaic.desired_height,
                tile_width: mosaic.tile_width,
                tile_height: mosaic.tile_height,
            });
        }

        Ok(Self {
            dominos: config.dominos.clone(),
            field: config.field.clone(),
            tile_width: mosaic.tile_width,
            tile_height: mosaic.tile_height,
            tiles_x: config.tiles_x(),
            tiles_y: config.tiles_y(),
            tile_size: Point2::new(config.tile_size_x_meters(), config.tile_size_y_meters()),
            field_size: Point2::new(config.field_width(), config.field_height()),
            field_in_map: Transform2D::new(config.field.domino_field_origin, config.field_angle_rad()),
            field_bounds: config.domino_field_boundaries(),
            verifier: BoundaryVerifier::from_config(config),
        })
    }

    /// Tile columns.
    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    /// Tile rows.
    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    /// All tile indices, row-major.
    pub fn tile_indices(&self) -> impl Iterator<Item = TileIndex> + '_ {
        (0..self.tiles_y).flat_map(move |row| (0..self.tiles_x).map(move |col| TileIndex::new(row, col)))
    }

    /// Field rectangle in the field frame.
    pub fn field_bounds(&self) -> Bounds2 {
        self.field_bounds
    }

    /// Pose of the field frame in the map.
    pub fn field_in_map(&self) -> Transform2D {
        self.field_in_map
    }

    /// Heading of every placement pose: the field's +x axis in the map.
    pub fn approach_heading(&self) -> f64 {
        self.field_in_map.rotation_rad
    }

    // ── Offsets ─────────────────────────────────────────────────────────────

    /// Position of a domino cell relative to its tile origin (tile frame).
    pub fn cell_offset_in_tile(&self, cell_row: usize, cell_col: usize) -> Point2 {
        Point2::new(
            cell_col as f64 * self.dominos.pitch_x(),
            cell_row as f64 * self.dominos.pitch_y(),
        )
    }

    /// Origin of `tile` in the field frame.
    pub fn tile_origin_in_field(&self, tile: TileIndex) -> Result<Point2, DominoError> {
        self.check_tile(tile)?;
        Ok(Point2::new(
            tile.col as f64 * self.tile_size.x,
            tile.row as f64 * self.tile_size.y,
        ))
    }

    /// Origin of `tile` in the map frame.
    pub fn tile_origin_in_map(&self, tile: TileIndex) -> Result<Point2, DominoError> {
        Ok(self.field_in_map.apply(self.tile_origin_in_field(tile)?))
    }

    /// Map position of the domino at global grid cell `(row, col)`.
    pub fn domino_position_in_map(&self, row: usize, col: usize) -> Result<Point2, DominoError> {
        let tile = TileIndex::new(row / self.tile_height, col / self.tile_width);
        let origin = self.tile_origin_in_field(tile)?;
        let offset = self.cell_offset_in_tile(row % self.tile_height, col % self.tile_width);
        Ok(self.field_in_map.apply(origin + offset))
    }

    // ── Targets ─────────────────────────────────────────────────────────────

    /// Robot pose that drops the tile whose origin is `field_point`.
    pub fn robot_pose_for_field_point(&self, field_point: Point2) -> Pose2D {
        let origin = self.field_in_map.apply(field_point);
        let heading = self.approach_heading();
        Pose2D::from_position(origin + self.field.frame_to_robot_offset.rotate(heading), heading)
    }

    /// Coarse, fine, prep and exit poses for `tile`, all verified against
    /// the configured boundaries.
    pub fn placement_target(&self, tile: TileIndex) -> Result<PlacementTarget, DominoError> {
        let origin_field = self.tile_origin_in_field(tile)?;
        let tile_origin = self.field_in_map.apply(origin_field);
        let far_corner = self.field_in_map.apply(origin_field + self.tile_size);

        let fine = self.robot_pose_for_field_point(origin_field);
        let coarse = Pose2D::from_position(
            fine.position() + self.field.tile_placement_coarse_offset,
            fine.heading_rad,
        );
        let (prep, exit) = self.staging_poses(fine);

        self.verifier.verify_all(&[
            Target::DominoPlacement {
                what: "tile origin",
                point: tile_origin,
            },
            Target::DominoPlacement {
                what: "tile far corner",
                point: far_corner,
            },
            Target::RobotPose {
                what: "coarse placement pose",
                pose: coarse,
            },
            Target::RobotPose {
                what: "fine placement pose",
                pose: fine,
            },
            Target::RobotPose {
                what: "prep pose",
                pose: prep,
            },
            Target::RobotPose {
                what: "exit pose",
                pose: exit,
            },
        ])?;

        debug!(%tile, %tile_origin, %fine, "placement target computed");
        Ok(PlacementTarget {
            tile,
            tile_origin,
            coarse,
            fine,
            prep,
            exit,
        })
    }

    /// Every placement target, row-major; stops at the first failure.
    pub fn placement_targets(&self) -> Result<Vec<PlacementTarget>, DominoError> {
        self.tile_indices().map(|t| self.placement_target(t)).collect()
    }

    /// Docking poses. The heading points from coarse to fine so the final
    /// leg is driven straight forward.
    pub fn base_station_targets(&self) -> Result<StagedTarget, DominoError> {
        let fine_pos = self.field.base_station_target_pose;
        let coarse_pos = fine_pos + self.field.base_station_coarse_pose_offset;
        let approach = fine_pos - coarse_pos;
        let heading = if approach.norm() > 0.0 { approach.angle() } else { 0.0 };

        let coarse = Pose2D::from_position(coarse_pos, heading);
        let fine = Pose2D::from_position(fine_pos, heading);
        self.verifier.verify_all(&[
            Target::RobotPose {
                what: "coarse base station pose",
                pose: coarse,
            },
            Target::BaseStationDock {
                what: "fine base station pose",
                pose: fine,
            },
        ])?;

        debug!(%coarse, %fine, "base station targets computed");
        Ok(StagedTarget { coarse, fine })
    }

    /// Map-frame point check against the domino field only.
    pub fn check_placement_point(&self, point: Point2) -> Result<(), DominoError> {
        self.verifier.verify(&Target::DominoPlacement {
            what: "domino placement",
            point,
        })
    }

    /// Named chain map→field→tile→robot plus map→base_station, with the
    /// robot at the placement pose for `tile`.
    pub fn frame_tree(&self, tile: TileIndex) -> Result<FrameTree, DominoError> {
        let origin = self.tile_origin_in_field(tile)?;
        let mut tree = FrameTree::new();
        tree.set_transform(MAP_FRAME, FIELD_FRAME, self.field_in_map);
        tree.set_transform(FIELD_FRAME, TILE_FRAME, Transform2D::translation(origin));
        tree.set_transform(
            TILE_FRAME,
            ROBOT_FRAME,
            Transform2D::translation(self.field.frame_to_robot_offset),
        );
        let dock = self.base_station_targets()?;
        tree.set_transform(MAP_FRAME, BASE_STATION_FRAME, Transform2D::from_pose(dock.fine));
        Ok(tree)
    }

    // ── Internal ────────────────────────────────────────────────────────────

    /// Prep and exit poses on the entry side of the field, in line with
    /// `fine` along its heading.
    fn staging_poses(&self, fine: Pose2D) -> (Pose2D, Pose2D) {
        let d = Point2::from_angle(fine.heading_rad);
        let corners = [
            Point2::zero(),
            Point2::new(self.field_size.x, 0.0),
            self.field_size,
            Point2::new(0.0, self.field_size.y),
        ];
        let entry_s = corners
            .iter()
            .map(|c| self.field_in_map.apply(*c).dot(d))
            .fold(f64::INFINITY, f64::min);
        let entry = fine.position() - d * (fine.position().dot(d) - entry_s);

        let prep = Pose2D::from_position(entry - d * self.field.prep_position_distance, fine.heading_rad);
        let exit = Pose2D::from_position(entry - d * self.field.exit_position_distance, fine.heading_rad);
        (prep, exit)
    }

    fn check_tile(&self, tile: TileIndex) -> Result<(), DominoError> {
        if tile.row < self.tiles_y && tile.col < self.tiles_x {
            Ok(())
        } else {
            Err(DominoError::TileIndexOutOfRange {
                row: tile.row,
                col: tile.col,
                tiles_y: self.tiles_y,
                tiles_x: self.tiles_x,
            })
        }
    }
}
