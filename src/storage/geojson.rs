//! GeoJSON FeatureCollection writers
//!
//! Features are streamed as they arrive; the collection is opened on
//! creation and closed by `finish()`. Positions carry four values
//! `[x, y, z, m]`, m being measured depth along the hole.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::{all_finite, RecordSink, SinkError, WriteSummary};
use crate::types::{IntervalEndpoints, Trajectory};

/// Shared FeatureCollection framing
struct FeatureWriter<W: Write> {
    writer: W,
    path: PathBuf,
    written: usize,
    closed: bool,
}

impl<W: Write> FeatureWriter<W> {
    fn open(writer: W, path: &Path) -> Result<Self, SinkError> {
        let mut fw = Self {
            writer,
            path: path.to_path_buf(),
            written: 0,
            closed: false,
        };
        fw.raw(b"{\"type\":\"FeatureCollection\",\"features\":[")?;
        Ok(fw)
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.writer.write_all(bytes).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn feature(&mut self, feature: &Value) -> Result<(), SinkError> {
        let encoded = serde_json::to_vec(feature).map_err(|source| SinkError::Encode {
            what: "feature",
            source,
        })?;
        if self.written > 0 {
            self.raw(b",\n")?;
        } else {
            self.raw(b"\n")?;
        }
        self.raw(&encoded)?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if !self.closed {
            self.raw(b"\n]}\n")?;
            self.closed = true;
        }
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>, SinkError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn trajectory_feature(t: &Trajectory) -> Option<Value> {
    let mut coordinates = Vec::with_capacity(t.vertex_count());
    for v in t.vertices() {
        if !all_finite(&[v.x, v.y, v.z, v.m]) {
            return None;
        }
        coordinates.push(json!([v.x, v.y, v.z, v.m]));
    }
    Some(json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": {
            "hole_id": t.hole_id,
            "max_depth": t.max_depth(),
            "method": t.method_label(),
            "frame": t.frame.as_str(),
            "input_digest": t.input_digest,
        }
    }))
}

fn segment_feature(iv: &IntervalEndpoints) -> Option<Value> {
    let (from, to) = (iv.from?, iv.to?);
    let length = iv.length();
    if !all_finite(&[from.x, from.y, from.z, to.x, to.y, to.z, length]) {
        return None;
    }
    Some(json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": [[from.x, from.y, from.z, 0.0], [to.x, to.y, to.z, length]],
        },
        "properties": {
            "row_id": iv.row_id,
            "hole_id": iv.hole_id,
            "from_depth": iv.from_depth,
            "to_depth": iv.to_depth,
        }
    }))
}

/// Writes each feature `build` accepts, counting the rest as failed
fn write_features<R, W: Write>(
    fw: &mut FeatureWriter<W>,
    records: &[R],
    build: impl Fn(&R) -> Option<Value>,
    describe: impl Fn(&R) -> String,
) -> Result<WriteSummary, SinkError> {
    let mut summary = WriteSummary {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        match build(record) {
            Some(feature) => {
                fw.feature(&feature)?;
                summary.succeeded += 1;
            }
            None => {
                tracing::debug!(record = %describe(record), "No geometry, skipped");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// One `LineString` per hole with `hole_id`, `max_depth`, `method` and
/// `input_digest` properties.
pub struct TrajectoryGeoJsonSink<W: Write> {
    inner: FeatureWriter<W>,
}

impl TrajectoryGeoJsonSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Self::new(create_file(path)?, path)
    }
}

impl<W: Write> TrajectoryGeoJsonSink<W> {
    pub fn new(writer: W, path: &Path) -> Result<Self, SinkError> {
        Ok(Self {
            inner: FeatureWriter::open(writer, path)?,
        })
    }

    pub fn into_inner(self) -> W {
        self.inner.writer
    }
}

impl<W: Write> RecordSink<Trajectory> for TrajectoryGeoJsonSink<W> {
    fn write(&mut self, records: &[Trajectory]) -> Result<WriteSummary, SinkError> {
        write_features(&mut self.inner, records, trajectory_feature, |t| t.hole_id.clone())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.inner.close()
    }

    fn name(&self) -> &str {
        "trajectories_geojson"
    }
}

/// One two-point segment per lab interval, M = 0 at `from` and the interval
/// length at `to`. Intervals missing either endpoint are counted as failed.
pub struct SegmentGeoJsonSink<W: Write> {
    inner: FeatureWriter<W>,
}

impl SegmentGeoJsonSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Self::new(create_file(path)?, path)
    }
}

impl<W: Write> SegmentGeoJsonSink<W> {
    pub fn new(writer: W, path: &Path) -> Result<Self, SinkError> {
        Ok(Self {
            inner: FeatureWriter::open(writer, path)?,
        })
    }

    pub fn into_inner(self) -> W {
        self.inner.writer
    }
}

impl<W: Write> RecordSink<IntervalEndpoints> for SegmentGeoJsonSink<W> {
    fn write(&mut self, records: &[IntervalEndpoints]) -> Result<WriteSummary, SinkError> {
        write_features(&mut self.inner, records, segment_feature, |iv| {
            format!("{}:{}", iv.hole_id, iv.row_id)
        })
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.inner.close()
    }

    fn name(&self) -> &str {
        "segments_geojson"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::write_batched;
    use crate::types::{Method, Point3, Vertex};

    fn trajectory() -> Trajectory {
        Trajectory::from_vertices(
            "DH-1",
            Method::MinimumCurvature,
            vec![
                Vertex::new(0.0, 0.0, 100.0, 0.0),
                Vertex::new(0.0, 0.0, 50.0, 50.0),
            ],
        )
        .unwrap()
        .with_digest("abc".to_string())
    }

    fn interval(to: Option<Point3>) -> IntervalEndpoints {
        IntervalEndpoints {
            row_id: "1".to_string(),
            hole_id: "DH-1".to_string(),
            from_depth: 10.0,
            to_depth: 14.0,
            from: Some(Point3::new(1.0, 2.0, 90.0)),
            mid: None,
            to,
        }
    }

    #[test]
    fn test_trajectory_collection() {
        let mut sink = TrajectoryGeoJsonSink::new(Vec::new(), Path::new("t.geojson")).unwrap();
        let summary = write_batched(&mut sink, &[trajectory(), trajectory()], 1).unwrap();
        assert_eq!(summary.succeeded, 2);

        let doc: Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        let f = &features[0];
        assert_eq!(f["geometry"]["coordinates"][1], json!([0.0, 0.0, 50.0, 50.0]));
        assert_eq!(f["properties"]["hole_id"], "DH-1");
        assert_eq!(f["properties"]["max_depth"], 50.0);
        assert_eq!(f["properties"]["method"], "minimum_curvature");
        assert_eq!(f["properties"]["input_digest"], "abc");
    }

    #[test]
    fn test_empty_collection_is_valid_json() {
        let mut sink = TrajectoryGeoJsonSink::new(Vec::new(), Path::new("t.geojson")).unwrap();
        let empty: Vec<Trajectory> = Vec::new();
        write_batched(&mut sink, &empty, 10).unwrap();
        let doc: Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(doc["features"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_segment_m_values_and_incomplete_counted_failed() {
        let mut sink = SegmentGeoJsonSink::new(Vec::new(), Path::new("s.geojson")).unwrap();
        let records = [interval(Some(Point3::new(1.0, 2.0, 86.0))), interval(None)];
        let summary = write_batched(&mut sink, &records, 10).unwrap();
        assert_eq!(
            summary,
            WriteSummary {
                total: 2,
                succeeded: 1,
                failed: 1
            }
        );

        let doc: Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        let coords = &doc["features"][0]["geometry"]["coordinates"];
        assert_eq!(coords[0][3], 0.0);
        assert_eq!(coords[1][3], 4.0);
        assert_eq!(doc["features"].as_array().map(|a| a.len()), Some(1));
    }
}
