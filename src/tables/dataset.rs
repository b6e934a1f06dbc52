//! Per-hole grouping of the three input tables

use std::collections::BTreeMap;

use crate::types::{Collar, LabInterval, SurveyRow};

/// Everything known about one hole
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoleData {
    pub collar: Option<Collar>,
    pub surveys: Vec<SurveyRow>,
    /// Sorted by `from_depth`, ties in input order
    pub labs: Vec<LabInterval>,
}

impl HoleData {
    /// Deepest lab `to_depth`, the straight-line extension target
    pub fn max_lab_depth(&self) -> Option<f64> {
        self.labs
            .iter()
            .map(|l| l.to_depth)
            .filter(|d| d.is_finite())
            .reduce(f64::max)
    }
}

/// All holes of a run, keyed and ordered by hole id.
///
/// A hole is present when it has survey rows or lab rows. Collars with
/// neither have nothing to compute and are only counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrillholeDataset {
    pub holes: BTreeMap<String, HoleData>,
    /// Collar rows without survey or lab rows
    pub unused_collars: usize,
    /// Extra collar rows for a hole id already seen (first one kept)
    pub duplicate_collars: usize,
}

impl DrillholeDataset {
    pub fn from_tables(
        collars: Vec<Collar>,
        surveys: Vec<SurveyRow>,
        labs: Vec<LabInterval>,
    ) -> Self {
        let mut holes: BTreeMap<String, HoleData> = BTreeMap::new();

        for row in surveys {
            holes.entry(row.hole_id.clone()).or_default().surveys.push(row);
        }
        for lab in labs {
            holes.entry(lab.hole_id.clone()).or_default().labs.push(lab);
        }
        for hole in holes.values_mut() {
            hole.labs
                .sort_by(|a, b| a.from_depth.total_cmp(&b.from_depth));
        }

        let mut unused_collars = 0;
        let mut duplicate_collars = 0;
        for collar in collars {
            match holes.get_mut(&collar.hole_id) {
                Some(hole) if hole.collar.is_some() => {
                    tracing::warn!(hole_id = %collar.hole_id, "Duplicate collar row, keeping the first");
                    duplicate_collars += 1;
                }
                Some(hole) => hole.collar = Some(collar),
                None => unused_collars += 1,
            }
        }

        tracing::info!(
            holes = holes.len(),
            unused_collars,
            duplicate_collars,
            "Dataset assembled"
        );

        Self {
            holes,
            unused_collars,
            duplicate_collars,
        }
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn lab_count(&self) -> usize {
        self.holes.values().map(|h| h.labs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collar(id: &str, x: f64) -> Collar {
        Collar {
            hole_id: id.to_string(),
            x,
            y: 0.0,
            z: 0.0,
            top_dip: 90.0,
            top_bearing: 0.0,
        }
    }

    fn survey(id: &str, md: f64) -> SurveyRow {
        SurveyRow {
            hole_id: id.to_string(),
            measured_depth: md,
            dip: 90.0,
            azimuth: 0.0,
        }
    }

    fn lab(id: &str, row_id: &str, from: f64, to: f64) -> LabInterval {
        LabInterval {
            row_id: row_id.to_string(),
            hole_id: id.to_string(),
            from_depth: from,
            to_depth: to,
        }
    }

    #[test]
    fn test_groups_and_orders_by_hole_id() {
        let ds = DrillholeDataset::from_tables(
            vec![collar("B", 1.0), collar("A", 2.0)],
            vec![survey("B", 10.0), survey("A", 5.0), survey("B", 20.0)],
            vec![],
        );
        let ids: Vec<&String> = ds.holes.keys().collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(ds.holes["B"].surveys.len(), 2);
        assert_eq!(ds.holes["A"].collar.as_ref().map(|c| c.x), Some(2.0));
    }

    #[test]
    fn test_lab_only_hole_and_missing_collar() {
        let ds = DrillholeDataset::from_tables(
            vec![],
            vec![survey("S", 10.0)],
            vec![lab("L", "1", 0.0, 2.0)],
        );
        assert_eq!(ds.len(), 2);
        assert!(ds.holes["S"].collar.is_none());
        assert!(ds.holes["L"].surveys.is_empty());
    }

    #[test]
    fn test_unused_and_duplicate_collars_counted() {
        let ds = DrillholeDataset::from_tables(
            vec![collar("A", 1.0), collar("A", 99.0), collar("Z", 0.0)],
            vec![survey("A", 10.0)],
            vec![],
        );
        assert_eq!(ds.duplicate_collars, 1);
        assert_eq!(ds.unused_collars, 1);
        assert_eq!(ds.holes["A"].collar.as_ref().map(|c| c.x), Some(1.0));
    }

    #[test]
    fn test_labs_sorted_and_max_depth() {
        let ds = DrillholeDataset::from_tables(
            vec![collar("A", 0.0)],
            vec![],
            vec![lab("A", "2", 10.0, 12.0), lab("A", "1", 0.0, 30.0), lab("A", "3", 12.0, 14.0)],
        );
        let hole = &ds.holes["A"];
        let order: Vec<&str> = hole.labs.iter().map(|l| l.row_id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
        assert_eq!(hole.max_lab_depth(), Some(30.0));
        assert_eq!(ds.lab_count(), 3);
    }
}
