//! Replay of a recorded reading log through the pose estimator.
//!
//! One JSON object per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"velocity","vx":0.1,"vy":0.0,"va":0.0,"dt":0.05}
//! {"kind":"beacons","left":{"x":1.0,"y":2.3},"right":{"x":1.0,"y":1.7}}
//! ```
//!
//! Beacon readings that fail the separation check are skipped; every other
//! error aborts the replay.

use std::io::BufRead;

use domino_localization::{BeaconPosition, BeaconResolver, PoseEstimator, beacon::BeaconPair};
use domino_types::{Pose2D, Velocity2D};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackReading {
    Velocity { vx: f64, vy: f64, va: f64, dt: f64 },
    Beacons { left: BeaconPosition, right: BeaconPosition },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSummary {
    pub pose: Pose2D,
    pub velocity_readings: usize,
    pub beacon_fixes: usize,
    pub rejected_fixes: usize,
}

/// Replay a JSON-lines log. Beacon fixes with bad geometry are skipped and
/// counted.
pub fn replay<R: BufRead>(
    input: R,
    resolver: &BeaconResolver,
    estimator: &mut PoseEstimator,
) -> Result<TrackSummary, CliError> {
    let mut summary = TrackSummary {
        pose: estimator.pose(),
        velocity_readings: 0,
        beacon_fixes: 0,
        rejected_fixes: 0,
    };

    for (lineno, line) in input.lines().enumerate() {
        let line = line.map_err(|source| CliError::Io {
            path: "<track input>".into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let reading: TrackReading = serde_json::from_str(&line)?;
        match reading {
            TrackReading::Velocity { vx, vy, va, dt } => {
                estimator.update_velocity_reading(Velocity2D::new(vx, vy, va), dt);
                summary.velocity_readings += 1;
            }
            TrackReading::Beacons { left, right } => match resolver.resolve(&BeaconPair { left, right }) {
                Ok(pose) => {
                    estimator.update_position_reading(pose);
                    summary.beacon_fixes += 1;
                }
                Err(e) if e.is_retryable() => {
                    warn!(line = lineno + 1, "beacon fix skipped");
                    summary.rejected_fixes += 1;
                }
                Err(e) => return Err(e.into()),
            },
        }
    }

    summary.pose = estimator.pose();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domino_types::{BeaconConfig, LocalizationConfig};

    fn run(input: &str) -> Result<TrackSummary, CliError> {
        let resolver = BeaconResolver::new(&BeaconConfig::default());
        let mut est = PoseEstimator::new(&LocalizationConfig::default());
        replay(input.as_bytes(), &resolver, &mut est)
    }

    #[test]
    fn velocity_then_beacon_fix() {
        let input = r#"
{"kind":"velocity","vx":0.5,"vy":0.0,"va":0.0,"dt":2.0}
{"kind":"velocity","vx":0.0,"vy":0.0,"va":0.0,"dt":0.1}
{"kind":"beacons","left":{"x":3.0,"y":0.28575},"right":{"x":3.0,"y":-0.28575}}
"#;
        let s = run(input).unwrap();
        assert_eq!(s.velocity_readings, 2);
        assert_eq!(s.beacon_fixes, 1);
        assert!((s.pose.x - 3.2969).abs() < 1e-9);
        assert!(s.pose.y.abs() < 1e-9);
    }

    #[test]
    fn bad_separation_is_skipped() {
        let input = r#"{"kind":"beacons","left":{"x":0.0,"y":1.0},"right":{"x":0.0,"y":-1.0}}"#;
        let s = run(input).unwrap();
        assert_eq!(s.beacon_fixes, 0);
        assert_eq!(s.rejected_fixes, 1);
        assert_eq!(s.pose, Pose2D::default());
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(matches!(run(r#"{"kind":"teleport"}"#), Err(CliError::Json(_))));
    }
}
