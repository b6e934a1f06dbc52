//! Per-hole processing: normalise, build the path, place lab intervals

use tracing::{debug, warn};

use super::report::{SkipReason, SkippedHole};
use crate::config::ProjectConfig;
use crate::geodetic;
use crate::survey::{self, CanonicalSurvey, SurveyError};
use crate::tables::HoleData;
use crate::trajectory::{self, DepthNotFound, TrajectoryError};
use crate::types::{CoordinateFrame, IntervalEndpoints, LabInterval, Point3, Trajectory};

/// Everything one hole contributes to a run
#[derive(Debug, Clone, PartialEq)]
pub struct HoleResult {
    pub hole_id: String,
    pub trajectory: Option<Trajectory>,
    /// One record per lab row, endpoints unset when unresolved
    pub intervals: Vec<IntervalEndpoints>,
    pub skipped: Option<SkippedHole>,
    pub dropped_duplicates: usize,
    pub extended: bool,
}

impl HoleResult {
    /// Result for a hole that was never started
    pub fn cancelled(hole_id: &str, hole: &HoleData) -> Self {
        Self::skipped(
            hole_id,
            hole,
            SkippedHole {
                hole_id: hole_id.to_string(),
                reason: SkipReason::Cancelled,
                message: "run cancelled before hole started".to_string(),
            },
        )
    }

    fn skipped(hole_id: &str, hole: &HoleData, skipped: SkippedHole) -> Self {
        Self {
            hole_id: hole_id.to_string(),
            trajectory: None,
            intervals: hole.labs.iter().map(unresolved).collect(),
            skipped: Some(skipped),
            dropped_duplicates: 0,
            extended: false,
        }
    }
}

fn unresolved(lab: &LabInterval) -> IntervalEndpoints {
    IntervalEndpoints {
        row_id: lab.row_id.clone(),
        hole_id: lab.hole_id.clone(),
        from_depth: lab.from_depth,
        to_depth: lab.to_depth,
        from: None,
        mid: None,
        to: None,
    }
}

/// Computed path plus what depth lookups need in the geographic frame
struct HolePath {
    trajectory: Trajectory,
    survey: CanonicalSurvey,
    collar: Point3,
}

enum PathFailure {
    Survey(SurveyError),
    Trajectory(TrajectoryError),
}

impl PathFailure {
    fn reason(&self) -> SkipReason {
        match self {
            PathFailure::Survey(SurveyError::MissingCollar { .. }) => SkipReason::MissingCollar,
            PathFailure::Survey(_) => SkipReason::InvalidSurvey,
            PathFailure::Trajectory(TrajectoryError::TooFewStations { .. }) => {
                SkipReason::TooFewStations
            }
            PathFailure::Trajectory(_) => SkipReason::InvalidSurvey,
        }
    }

    fn message(&self) -> String {
        match self {
            PathFailure::Survey(e) => e.to_string(),
            PathFailure::Trajectory(e) => e.to_string(),
        }
    }
}

/// Process one hole end to end.
///
/// Never fails as a whole: a hole that cannot be traced comes back with
/// `skipped` set and every lab interval unresolved.
pub fn process_hole(hole_id: &str, hole: &HoleData, config: &ProjectConfig) -> HoleResult {
    let options = config.normalize_options(hole.max_lab_depth());
    let normalized = match survey::normalize(hole_id, hole.collar.as_ref(), &hole.surveys, &options)
    {
        Ok(n) => n,
        Err(e) => return skip(hole_id, hole, PathFailure::Survey(e)),
    };
    let dropped_duplicates = normalized.dropped_duplicates;
    let extended = normalized.extended;

    let path = match build_path(normalized.survey, hole, config) {
        Ok(p) => p,
        Err(failure) => {
            let mut result = skip(hole_id, hole, failure);
            result.dropped_duplicates = dropped_duplicates;
            return result;
        }
    };

    if extended {
        debug!(hole_id = %hole_id, depth = path.survey.max_depth(), "Extended to deepest lab depth");
    }

    let intervals = hole
        .labs
        .iter()
        .map(|lab| {
            if lab.from_depth >= lab.to_depth {
                warn!(hole_id = %hole_id, row_id = %lab.row_id, from = lab.from_depth, to = lab.to_depth, "Lab interval is empty or inverted");
            }
            IntervalEndpoints {
                row_id: lab.row_id.clone(),
                hole_id: lab.hole_id.clone(),
                from_depth: lab.from_depth,
                to_depth: lab.to_depth,
                from: resolve(&path, lab, lab.from_depth, config),
                mid: resolve(&path, lab, lab.midpoint_depth(), config),
                to: resolve(&path, lab, lab.to_depth, config),
            }
        })
        .collect();

    HoleResult {
        hole_id: hole_id.to_string(),
        trajectory: Some(path.trajectory),
        intervals,
        skipped: None,
        dropped_duplicates,
        extended,
    }
}

fn skip(hole_id: &str, hole: &HoleData, failure: PathFailure) -> HoleResult {
    let reason = failure.reason();
    let message = failure.message();
    warn!(hole_id = %hole_id, reason = reason.as_str(), error = %message, "Hole skipped");
    HoleResult::skipped(
        hole_id,
        hole,
        SkippedHole {
            hole_id: hole_id.to_string(),
            reason,
            message,
        },
    )
}

fn build_path(
    survey: CanonicalSurvey,
    hole: &HoleData,
    config: &ProjectConfig,
) -> Result<HolePath, PathFailure> {
    // normalize() has already rejected a missing collar
    let collar = hole
        .collar
        .as_ref()
        .map(|c| Point3::new(c.x, c.y, c.z))
        .ok_or_else(|| {
            PathFailure::Survey(SurveyError::MissingCollar {
                hole_id: survey.hole_id().to_string(),
            })
        })?;

    let trajectory = match config.trajectory.frame {
        CoordinateFrame::Projected => {
            trajectory::integrate(&survey, collar, config.trajectory.method)
        }
        CoordinateFrame::Geographic => {
            geodetic::trajectory(collar, &survey, config.geodetic.model)
        }
    }
    .map_err(PathFailure::Trajectory)?;

    let trajectory = if web_mercator(config) {
        trajectory.map_positions(geodetic::project_point)
    } else {
        trajectory
    };
    let trajectory = trajectory.with_digest(survey::input_digest(collar, &survey));

    Ok(HolePath {
        trajectory,
        survey,
        collar,
    })
}

fn web_mercator(config: &ProjectConfig) -> bool {
    config.output.web_mercator && config.trajectory.frame == CoordinateFrame::Geographic
}

/// Place one depth of a lab interval, logging and returning `None` when it
/// is off the path
fn resolve(path: &HolePath, lab: &LabInterval, depth: f64, config: &ProjectConfig) -> Option<Point3> {
    let tolerance = config.interpolation.tolerance;
    let located: Result<Point3, DepthNotFound> = match config.trajectory.frame {
        CoordinateFrame::Projected => path.trajectory.point_at(depth, tolerance),
        CoordinateFrame::Geographic => geodetic::position_at_depth(
            path.collar,
            &path.survey,
            depth,
            config.geodetic.model,
            tolerance,
        )
        .map(|p| {
            if web_mercator(config) {
                geodetic::project_point(p)
            } else {
                p
            }
        }),
    };

    match located {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(hole_id = %e.hole_id, row_id = %lab.row_id, depth = e.depth, max_depth = e.max_depth, "Depth not found on trajectory");
            None
        }
    }
}
