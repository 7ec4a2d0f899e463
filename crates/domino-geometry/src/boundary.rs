//! [`BoundaryVerifier`] – boundary rule engine for computed targets.
//!
//! Every pose or point produced by [`FieldLayout`][crate::field::FieldLayout]
//! is passed through [`BoundaryVerifier::verify`] before it is returned.
//! Registered [`Rule`]s are evaluated in order; the first violation comes
//! back as [`DominoError::OutOfBounds`] and the target is discarded.
//!
//! Built-in rules:
//! - [`RobotBoundaryRule`] – every robot pose must lie in `robot_boundaries`.
//! - [`FieldBoundaryRule`] – every domino placement point must lie in the
//!   domino field.
//! - [`BaseStationRule`] – the docking pose must lie in
//!   `base_station_boundaries`.

use domino_types::{Bounds2, DominoConfig, DominoError, Point2, Pose2D};

/// Slack for values that land on a boundary after rotation round-off.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// A computed location awaiting verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// A pose the robot will drive to.
    RobotPose { what: &'static str, pose: Pose2D },
    /// A point where dominoes end up on the floor.
    DominoPlacement { what: &'static str, point: Point2 },
    /// The robot pose at which it docks with the base station.
    BaseStationDock { what: &'static str, pose: Pose2D },
}

impl Target {
    /// Label used in error messages.
    pub fn what(&self) -> &'static str {
        match *self {
            Target::RobotPose { what, .. }
            | Target::DominoPlacement { what, .. }
            | Target::BaseStationDock { what, .. } => what,
        }
    }

    /// Point the rules test against.
    pub fn position(&self) -> Point2 {
        match *self {
            Target::RobotPose { pose, .. } | Target::BaseStationDock { pose, .. } => pose.position(),
            Target::DominoPlacement { point, .. } => point,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single boundary a target must respect.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(())` when `target` is inside, [`DominoError::OutOfBounds`] otherwise.
    /// Rules ignore target kinds they do not govern.
    fn check(&self, target: &Target) -> Result<(), DominoError>;
}

fn require_inside(target: &Target, bounds: Bounds2) -> Result<(), DominoError> {
    let p = target.position();
    if bounds.contains(p, BOUNDARY_TOLERANCE) {
        Ok(())
    } else {
        Err(DominoError::OutOfBounds {
            what: target.what().to_string(),
            x: p.x,
            y: p.y,
            bounds,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BoundaryVerifier
// ────────────────────────────────────────────────────────────────────────────

/// Validates [`Target`]s against every registered [`Rule`].
///
/// # Example
///
/// ```
/// use domino_geometry::boundary::{BoundaryVerifier, RobotBoundaryRule, Target};
/// use domino_types::{Bounds2, Point2, Pose2D};
///
/// let mut verifier = BoundaryVerifier::new();
/// verifier.add_rule(Box::new(RobotBoundaryRule {
///     bounds: Bounds2::new(Point2::new(0.0, 0.0), Point2::new(20.0, 15.0)),
/// }));
///
/// let inside = Target::RobotPose { what: "fine", pose: Pose2D::new(3.0, 4.0, 0.0) };
/// assert!(verifier.verify(&inside).is_ok());
///
/// let outside = Target::RobotPose { what: "fine", pose: Pose2D::new(-1.0, 4.0, 0.0) };
/// assert!(verifier.verify(&outside).is_err());
/// ```
#[derive(Default)]
pub struct BoundaryVerifier {
    rules: Vec<Box<dyn Rule>>,
}

impl BoundaryVerifier {
    /// Verifier with no rules; accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Robot, field and base-station rules from `config`.
    pub fn from_config(config: &DominoConfig) -> Self {
        let mut verifier = Self::new();
        verifier.add_rule(Box::new(RobotBoundaryRule {
            bounds: config.field.robot_boundaries,
        }));
        verifier.add_rule(Box::new(FieldBoundaryRule {
            bounds: config.domino_field_boundaries(),
        }));
        verifier.add_rule(Box::new(BaseStationRule {
            bounds: config.field.base_station_boundaries,
        }));
        verifier
    }

    /// Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// First violation, or `Ok(())` when all rules pass.
    pub fn verify(&self, target: &Target) -> Result<(), DominoError> {
        for rule in &self.rules {
            rule.check(target)?;
        }
        Ok(())
    }

    /// Verify every target, stopping at the first violation.
    pub fn verify_all<'a, I>(&self, targets: I) -> Result<(), DominoError>
    where
        I: IntoIterator<Item = &'a Target>,
    {
        for target in targets {
            self.verify(target)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

/// Keeps every robot pose, docking included, inside the arena.
pub struct RobotBoundaryRule {
    pub bounds: Bounds2,
}

impl Rule for RobotBoundaryRule {
    fn name(&self) -> &str {
        "robot_boundaries"
    }

    fn check(&self, target: &Target) -> Result<(), DominoError> {
        match target {
            Target::RobotPose { .. } | Target::BaseStationDock { .. } => {
                require_inside(target, self.bounds)
            }
            Target::DominoPlacement { .. } => Ok(()),
        }
    }
}

/// Keeps placed dominoes inside the domino field.
pub struct FieldBoundaryRule {
    pub bounds: Bounds2,
}

impl Rule for FieldBoundaryRule {
    fn name(&self) -> &str {
        "domino_field_boundaries"
    }

    fn check(&self, target: &Target) -> Result<(), DominoError> {
        match target {
            Target::DominoPlacement { .. } => require_inside(target, self.bounds),
            _ => Ok(()),
        }
    }
}

/// Keeps the docking pose inside the base-station area.
pub struct BaseStationRule {
    pub bounds: Bounds2,
}

impl Rule for BaseStationRule {
    fn name(&self) -> &str {
        "base_station_boundaries"
    }

    fn check(&self, target: &Target) -> Result<(), DominoError> {
        match target {
            Target::BaseStationDock { .. } => require_inside(target, self.bounds),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Bounds2 {
        Bounds2::new(Point2::new(0.0, 0.0), Point2::new(20.0, 15.0))
    }

    fn robot(x: f64, y: f64) -> Target {
        Target::RobotPose {
            what: "robot",
            pose: Pose2D::new(x, y, 0.0),
        }
    }

    #[test]
    fn empty_verifier_passes_everything() {
        let v = BoundaryVerifier::new();
        assert!(v.verify(&robot(-100.0, 100.0)).is_ok());
    }

    #[test]
    fn robot_rule_is_inclusive() {
        let mut v = BoundaryVerifier::new();
        v.add_rule(Box::new(RobotBoundaryRule { bounds: arena() }));
        assert!(v.verify(&robot(0.0, 0.0)).is_ok());
        assert!(v.verify(&robot(20.0, 15.0)).is_ok());
        assert!(v.verify(&robot(20.0 + 1e-12, 15.0)).is_ok());
    }

    #[test]
    fn robot_rule_reports_offending_point() {
        let mut v = BoundaryVerifier::new();
        v.add_rule(Box::new(RobotBoundaryRule { bounds: arena() }));
        let err = v.verify(&robot(21.0, 3.0)).unwrap_err();
        assert_eq!(
            err,
            DominoError::OutOfBounds {
                what: "robot".into(),
                x: 21.0,
                y: 3.0,
                bounds: arena(),
            }
        );
    }

    #[test]
    fn field_rule_ignores_robot_poses() {
        let mut v = BoundaryVerifier::new();
        v.add_rule(Box::new(FieldBoundaryRule {
            bounds: Bounds2::new(Point2::new(5.0, 5.0), Point2::new(6.0, 6.0)),
        }));
        assert!(v.verify(&robot(0.0, 0.0)).is_ok());
        let outside = Target::DominoPlacement {
            what: "domino",
            point: Point2::new(0.0, 0.0),
        };
        assert!(matches!(v.verify(&outside), Err(DominoError::OutOfBounds { .. })));
    }

    #[test]
    fn dock_checked_by_robot_and_base_station_rules() {
        let v = BoundaryVerifier::from_config(&DominoConfig::default());
        assert_eq!(
            v.rule_names(),
            vec!["robot_boundaries", "domino_field_boundaries", "base_station_boundaries"]
        );
        let dock = Target::BaseStationDock {
            what: "dock",
            pose: Pose2D::new(3.0, 12.0, 0.0),
        };
        assert!(v.verify(&dock).is_ok());
        // Inside the arena but far from the base station.
        let stray = Target::BaseStationDock {
            what: "dock",
            pose: Pose2D::new(15.0, 2.0, 0.0),
        };
        assert!(v.verify(&stray).is_err());
    }

    #[test]
    fn verify_all_stops_at_first_failure() {
        let mut v = BoundaryVerifier::new();
        v.add_rule(Box::new(RobotBoundaryRule { bounds: arena() }));
        let targets = [robot(1.0, 1.0), robot(-1.0, 1.0), robot(30.0, 1.0)];
        let err = v.verify_all(&targets).unwrap_err();
        assert!(matches!(err, DominoError::OutOfBounds { x, .. } if x == -1.0));
    }
}
