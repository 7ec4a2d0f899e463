//! 2-D rigid transforms and the named frame tree.
//!
//! A [`Transform2D`] is the pose of a child frame in its parent: a point `p`
//! expressed in the child maps to `t + R(θ)·p` in the parent. A
//! [`FrameTree`] stores these edges by name and composes the chain between
//! any two connected frames.
//!
//! # Example
//!
//! ```rust
//! use domino_geometry::transform::{FrameTree, Transform2D};
//! use domino_types::Point2;
//!
//! let mut tf = FrameTree::new();
//!
//! // field origin sits at (12, 6) in the map, unrotated.
//! tf.set_transform("map", "field", Transform2D::new(Point2::new(12.0, 6.0), 0.0));
//! // tile origin is 0.64 m along the field's x axis.
//! tf.set_transform("field", "tile", Transform2D::new(Point2::new(0.64, 0.0), 0.0));
//!
//! let p = tf.transform_point(Point2::zero(), "tile", "map").unwrap();
//! assert!((p.x - 12.64).abs() < 1e-9);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use domino_types::{Point2, Pose2D, normalize_angle};
use serde::{Deserialize, Serialize};

pub const MAP_FRAME: &str = "map";
pub const FIELD_FRAME: &str = "field";
pub const TILE_FRAME: &str = "tile";
pub const ROBOT_FRAME: &str = "robot";
pub const BASE_STATION_FRAME: &str = "base_station";

// ────────────────────────────────────────────────────────────────────────────
// Transform2D
// ────────────────────────────────────────────────────────────────────────────

/// Rigid 2-D transform: rotation about the origin followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub translation: Point2,
    pub rotation_rad: f64,
}

impl Transform2D {
    /// Child frame at `translation`, rotated by `rotation_rad`.
    pub fn new(translation: Point2, rotation_rad: f64) -> Self {
        Self {
            translation,
            rotation_rad,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(Point2::zero(), 0.0)
    }

    /// Pure translation.
    pub fn translation(translation: Point2) -> Self {
        Self::new(translation, 0.0)
    }

    /// Frame whose origin and x axis are given by `pose`.
    pub fn from_pose(pose: Pose2D) -> Self {
        Self::new(pose.position(), pose.heading_rad)
    }

    /// Child → parent: `t + R(θ)·p`.
    pub fn apply(&self, point: Point2) -> Point2 {
        self.translation + point.rotate(self.rotation_rad)
    }

    /// Parent → child: `R(-θ)·(p − t)`.
    pub fn apply_inverse(&self, point: Point2) -> Point2 {
        (point - self.translation).rotate(-self.rotation_rad)
    }

    /// Express a child-frame pose in the parent.
    pub fn apply_pose(&self, pose: Pose2D) -> Pose2D {
        Pose2D::from_position(
            self.apply(pose.position()),
            normalize_angle(pose.heading_rad + self.rotation_rad),
        )
    }

    /// T_b_a for `self` = T_a_b.
    pub fn inverse(&self) -> Self {
        Self::new(
            (-self.translation).rotate(-self.rotation_rad),
            normalize_angle(-self.rotation_rad),
        )
    }

    /// Compose two transforms: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(
            self.apply(other.translation),
            normalize_angle(self.rotation_rad + other.rotation_rad),
        )
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FrameTree
// ────────────────────────────────────────────────────────────────────────────

/// Named reference frames connected by [`Transform2D`] edges.
///
/// Registering `parent → child` also records the inverse edge, so
/// [`FrameTree::lookup`] can walk the chain in either direction.
#[derive(Debug, Clone, Default)]
pub struct FrameTree {
    /// `edges[a][b]` = T_a_b (maps points in `b` into `a`).
    edges: HashMap<String, HashMap<String, Transform2D>>,
}

impl FrameTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the pose of `child_frame` in `parent_frame`.
    pub fn set_transform(&mut self, parent_frame: &str, child_frame: &str, transform: Transform2D) {
        self.edges
            .entry(parent_frame.to_string())
            .or_default()
            .insert(child_frame.to_string(), transform);
        self.edges
            .entry(child_frame.to_string())
            .or_default()
            .insert(parent_frame.to_string(), transform.inverse());
    }

    /// Whether `frame` appears in any edge.
    pub fn contains(&self, frame: &str) -> bool {
        self.edges.contains_key(frame)
    }

    /// T_outer_inner: converts points expressed in `inner_frame` into
    /// `outer_frame`. `None` when the frames are not connected.
    pub fn lookup(&self, outer_frame: &str, inner_frame: &str) -> Option<Transform2D> {
        if outer_frame == inner_frame {
            return Some(Transform2D::identity());
        }

        // BFS from outer_frame; each item carries T_outer_current.
        let mut queue: VecDeque<(&str, Transform2D)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();
        queue.push_back((outer_frame, Transform2D::identity()));
        visited.insert(outer_frame);

        while let Some((current, accumulated)) = queue.pop_front() {
            let Some(neighbours) = self.edges.get(current) else {
                continue;
            };
            for (next, edge_tf) in neighbours {
                if visited.contains(next.as_str()) {
                    continue;
                }
                let composed = accumulated.compose(edge_tf);
                if next == inner_frame {
                    return Some(composed);
                }
                visited.insert(next.as_str());
                queue.push_back((next.as_str(), composed));
            }
        }
        None
    }

    /// Re-express `point` from `from_frame` in `to_frame`.
    pub fn transform_point(&self, point: Point2, from_frame: &str, to_frame: &str) -> Option<Point2> {
        Some(self.lookup(to_frame, from_frame)?.apply(point))
    }

    /// Re-express `pose` from `from_frame` in `to_frame`.
    pub fn transform_pose(&self, pose: Pose2D, from_frame: &str, to_frame: &str) -> Option<Pose2D> {
        Some(self.lookup(to_frame, from_frame)?.apply_pose(pose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_point_eq(a: Point2, b: Point2) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
    }

    fn sample_transforms() -> Vec<Transform2D> {
        vec![
            Transform2D::identity(),
            Transform2D::new(Point2::new(12.0, 6.0), FRAC_PI_2),
            Transform2D::new(Point2::new(-3.5, 0.25), -2.0),
            Transform2D::new(Point2::new(0.5, 0.0), PI),
        ]
    }

    // ── Transform2D ─────────────────────────────────────────────────────────

    #[test]
    fn quarter_turn_maps_x_onto_y() {
        let t = Transform2D::new(Point2::new(12.0, 6.0), FRAC_PI_2);
        assert_point_eq(t.apply(Point2::new(1.0, 0.0)), Point2::new(12.0, 7.0));
    }

    #[test]
    fn apply_then_apply_inverse_is_identity() {
        let points = [Point2::new(0.0, 0.0), Point2::new(1.5, -2.0), Point2::new(-7.0, 3.25)];
        for t in sample_transforms() {
            for p in points {
                assert_point_eq(t.apply_inverse(t.apply(p)), p);
                assert_point_eq(t.apply(t.apply_inverse(p)), p);
                assert_point_eq(t.inverse().apply(t.apply(p)), p);
            }
        }
    }

    #[test]
    fn compose_is_associative() {
        let ts = sample_transforms();
        let (a, b, c) = (ts[1], ts[2], ts[3]);
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        let p = Point2::new(0.3, -1.1);
        assert_point_eq(left.apply(p), right.apply(p));
        assert_abs_diff_eq!(left.rotation_rad, right.rotation_rad, epsilon = 1e-9);
    }

    #[test]
    fn compose_matches_sequential_application() {
        let ts = sample_transforms();
        let p = Point2::new(2.0, 1.0);
        let composed = ts[1].compose(&ts[2]);
        assert_point_eq(composed.apply(p), ts[1].apply(ts[2].apply(p)));
    }

    #[test]
    fn apply_pose_adds_rotation_to_heading() {
        let t = Transform2D::new(Point2::new(1.0, 1.0), FRAC_PI_2);
        let pose = t.apply_pose(Pose2D::new(1.0, 0.0, FRAC_PI_2));
        assert_abs_diff_eq!(pose.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.heading_rad, PI, epsilon = 1e-9);
    }

    // ── FrameTree ───────────────────────────────────────────────────────────

    fn chain() -> FrameTree {
        let mut tf = FrameTree::new();
        tf.set_transform(MAP_FRAME, FIELD_FRAME, Transform2D::new(Point2::new(12.0, 6.0), FRAC_PI_2));
        tf.set_transform(FIELD_FRAME, TILE_FRAME, Transform2D::translation(Point2::new(0.64, 1.28)));
        tf.set_transform(TILE_FRAME, ROBOT_FRAME, Transform2D::translation(Point2::new(0.5, 0.0)));
        tf.set_transform(MAP_FRAME, BASE_STATION_FRAME, Transform2D::new(Point2::new(3.0, 12.0), FRAC_PI_2));
        tf
    }

    #[test]
    fn lookup_same_frame_returns_identity() {
        let tf = FrameTree::new();
        assert_eq!(tf.lookup("map", "map"), Some(Transform2D::identity()));
    }

    #[test]
    fn lookup_composes_down_the_chain() {
        let tf = chain();
        let robot_in_map = tf.transform_point(Point2::zero(), ROBOT_FRAME, MAP_FRAME).unwrap();
        // field (1.14, 1.28) rotated 90° → (-1.28, 1.14), plus origin.
        assert_point_eq(robot_in_map, Point2::new(12.0 - 1.28, 6.0 + 1.14));
    }

    #[test]
    fn round_trip_through_every_frame() {
        let tf = chain();
        let frames = [MAP_FRAME, FIELD_FRAME, TILE_FRAME, ROBOT_FRAME, BASE_STATION_FRAME];
        let p = Point2::new(0.7, -0.2);
        for from in frames {
            for to in frames {
                let there = tf.transform_point(p, from, to).unwrap();
                let back = tf.transform_point(there, to, from).unwrap();
                assert_point_eq(back, p);
            }
        }
    }

    #[test]
    fn reverse_edges_are_registered() {
        let tf = chain();
        let t = tf.lookup(ROBOT_FRAME, MAP_FRAME).unwrap();
        let forward = tf.lookup(MAP_FRAME, ROBOT_FRAME).unwrap();
        assert_point_eq(t.apply(forward.apply(Point2::new(4.0, 4.0))), Point2::new(4.0, 4.0));
    }

    #[test]
    fn lookup_unknown_frame_returns_none() {
        let tf = chain();
        assert!(tf.lookup(MAP_FRAME, "ghost").is_none());
        assert!(!tf.contains("ghost"));
    }

    #[test]
    fn set_transform_overrides_previous() {
        let mut tf = FrameTree::new();
        tf.set_transform("map", "field", Transform2D::translation(Point2::new(1.0, 0.0)));
        tf.set_transform("map", "field", Transform2D::translation(Point2::new(5.0, 0.0)));
        let p = tf.transform_point(Point2::zero(), "field", "map").unwrap();
        assert_point_eq(p, Point2::new(5.0, 0.0));
        let back = tf.transform_point(p, "map", "field").unwrap();
        assert_point_eq(back, Point2::zero());
    }
}
