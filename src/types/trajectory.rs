//! Computed trajectory types

use serde::{Deserialize, Serialize};

use crate::trajectory::TrajectoryError;

/// Trajectory computation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Great-circle arc through both station orientation vectors
    #[default]
    MinimumCurvature,
    /// Mean inclination and azimuth of the two stations
    AverageAngle,
    /// Vertical-plane arc combined with horizontal-plane arc
    RadiusOfCurvature,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::MinimumCurvature => "minimum_curvature",
            Method::AverageAngle => "average_angle",
            Method::RadiusOfCurvature => "radius_of_curvature",
        }
    }

    /// Output label for paths computed in `frame`; geographic paths are
    /// walked section by section regardless of the configured method.
    pub fn label_in(self, frame: CoordinateFrame) -> &'static str {
        match frame {
            CoordinateFrame::Projected => self.as_str(),
            CoordinateFrame::Geographic => "geodesic_sections",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "minimum_curvature" | "min_curvature" | "mincurv" => Ok(Method::MinimumCurvature),
            "average_angle" | "avg_angle" => Ok(Method::AverageAngle),
            "radius_of_curvature" | "roc" => Ok(Method::RadiusOfCurvature),
            other => Err(format!("unknown trajectory method '{other}'")),
        }
    }
}

/// Coordinate frame of collar positions and computed outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateFrame {
    /// Local projected XY in metres, integrated with a [`Method`]
    #[default]
    Projected,
    /// Longitude / latitude / elevation, walked with geodesic projection
    Geographic,
}

impl CoordinateFrame {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordinateFrame::Projected => "projected",
            CoordinateFrame::Geographic => "geographic",
        }
    }
}

impl std::str::FromStr for CoordinateFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "projected" | "local" | "xyz" => Ok(CoordinateFrame::Projected),
            "geographic" | "geodetic" | "latlon" => Ok(CoordinateFrame::Geographic),
            other => Err(format!("unknown coordinate frame '{other}'")),
        }
    }
}

/// A 3D position (x = east / longitude, y = north / latitude, z = elevation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Trajectory vertex with its measured depth ("M" coordinate)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }

    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Computed 3D path of one hole.
///
/// Vertices are strictly ascending in `m` and there are at least two of
/// them; both are checked on construction, including deserialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTrajectory")]
pub struct Trajectory {
    pub hole_id: String,
    pub method: Method,
    /// Frame of the vertex coordinates
    pub frame: CoordinateFrame,
    vertices: Vec<Vertex>,
    /// MD5 hex digest of the collar and canonical stations the path came from
    pub input_digest: Option<String>,
}

/// Unchecked wire form of [`Trajectory`]
#[derive(Deserialize)]
struct StoredTrajectory {
    hole_id: String,
    method: Method,
    #[serde(default)]
    frame: CoordinateFrame,
    vertices: Vec<Vertex>,
    #[serde(default)]
    input_digest: Option<String>,
}

impl TryFrom<StoredTrajectory> for Trajectory {
    type Error = TrajectoryError;

    fn try_from(raw: StoredTrajectory) -> Result<Self, Self::Error> {
        let mut t = Self::from_vertices(raw.hole_id, raw.method, raw.vertices)?.in_frame(raw.frame);
        t.input_digest = raw.input_digest;
        Ok(t)
    }
}

impl Trajectory {
    /// Build a trajectory from an ordered vertex list, e.g. a stored polyline.
    pub fn from_vertices(
        hole_id: impl Into<String>,
        method: Method,
        vertices: Vec<Vertex>,
    ) -> Result<Self, TrajectoryError> {
        let hole_id = hole_id.into();
        if vertices.len() < 2 {
            return Err(TrajectoryError::TooFewStations {
                hole_id,
                count: vertices.len(),
            });
        }
        for (i, pair) in vertices.windows(2).enumerate() {
            // NaN compares as unordered and is rejected here too
            if pair[1].m.partial_cmp(&pair[0].m) != Some(std::cmp::Ordering::Greater) {
                return Err(TrajectoryError::NonMonotonicDepth {
                    hole_id,
                    index: i + 1,
                    previous: pair[0].m,
                    current: pair[1].m,
                });
            }
        }
        Ok(Self {
            hole_id,
            method,
            frame: CoordinateFrame::Projected,
            vertices,
            input_digest: None,
        })
    }

    pub fn in_frame(mut self, frame: CoordinateFrame) -> Self {
        self.frame = frame;
        self
    }

    /// How the path was computed, as written to outputs
    pub fn method_label(&self) -> &'static str {
        self.method.label_in(self.frame)
    }

    pub fn with_digest(mut self, digest: String) -> Self {
        self.input_digest = Some(digest);
        self
    }

    /// Transform every vertex position, keeping measured depths
    pub fn map_positions(mut self, f: impl Fn(Point3) -> Point3) -> Self {
        for v in &mut self.vertices {
            let p = f(v.point());
            v.x = p.x;
            v.y = p.y;
            v.z = p.z;
        }
        self
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn collar(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub fn end(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    /// Deepest measured depth on the path
    pub fn max_depth(&self) -> f64 {
        self.end().m
    }
}
