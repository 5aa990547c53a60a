//! Segment comparison
//!
//! Groups rows by each low-cardinality dimension and compares per-metric
//! means across the groups. A (dimension, metric) pair needs at least two
//! non-empty segments to be reported.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::quant::stats::{mean, round4};
use crate::table::Table;

const MAX_SEGMENT_CARDINALITY: usize = 20;
const MIN_SEGMENTS: usize = 2;

/// Mean and size of one segment group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentGroup {
    pub mean: f64,
    pub count: usize,
}

/// Comparison of one metric across the segments of one dimension.
///
/// `spread` = best mean − worst mean, signed. "Best" assumes a higher
/// mean is better; inverted metrics such as bounce rate are reported
/// with the same convention (known ambiguity, deliberately not
/// corrected here).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentStat {
    pub segments: BTreeMap<String, SegmentGroup>,
    pub best: String,
    pub worst: String,
    pub spread: f64,
}

/// Per-dimension, per-metric segment comparison.
pub fn analyze_segments(
    table: &Table,
    dimension_cols: &[String],
    metric_cols: &[String],
) -> BTreeMap<String, BTreeMap<String, SegmentStat>> {
    let mut results = BTreeMap::new();

    for dim in dimension_cols {
        if table.column_index(dim).is_none() || table.cardinality(dim) > MAX_SEGMENT_CARDINALITY {
            continue;
        }

        let mut dim_results: BTreeMap<String, SegmentStat> = BTreeMap::new();
        for met in metric_cols {
            if table.column_index(met).is_none() {
                continue;
            }

            // Group coerced metric values by segment name.
            let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for (row, seg) in table.column(dim).enumerate() {
                if seg.is_null() {
                    continue;
                }
                let value = table.cell(row, met).and_then(|v| v.as_number());
                let entry = groups.entry(seg.to_display()).or_default();
                if let Some(v) = value {
                    entry.push(v);
                }
            }

            // Groups with no coercible values are dropped, not zeroed.
            let segments: BTreeMap<String, SegmentGroup> = groups
                .into_iter()
                .filter(|(_, vals)| !vals.is_empty())
                .map(|(name, vals)| {
                    (
                        name,
                        SegmentGroup {
                            mean: round4(mean(&vals)),
                            count: vals.len(),
                        },
                    )
                })
                .collect();
            if segments.len() < MIN_SEGMENTS {
                continue;
            }

            // Stable sort over the alphabetical map order, so ties keep
            // alphabetical precedence.
            let mut ordered: Vec<(&String, &SegmentGroup)> = segments.iter().collect();
            ordered.sort_by(|a, b| a.1.mean.partial_cmp(&b.1.mean).expect("finite means"));
            let worst = ordered[0].0.clone();
            let best = ordered[ordered.len() - 1].0.clone();
            let spread = round4(ordered[ordered.len() - 1].1.mean - ordered[0].1.mean);

            dim_results.insert(
                met.clone(),
                SegmentStat {
                    segments,
                    best,
                    worst,
                    spread,
                },
            );
        }

        if !dim_results.is_empty() {
            results.insert(dim.clone(), dim_results);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table(rows: Vec<(&str, Option<f64>)>) -> Table {
        Table::new(
            vec!["device".into(), "views".into()],
            rows.into_iter()
                .map(|(d, v)| {
                    vec![
                        Value::Text(d.into()),
                        v.map(Value::Number).unwrap_or(Value::Null),
                    ]
                })
                .collect(),
        )
    }

    fn analyze(t: &Table) -> BTreeMap<String, BTreeMap<String, SegmentStat>> {
        analyze_segments(t, &["device".into()], &["views".into()])
    }

    #[test]
    fn test_best_worst_spread() {
        let t = table(vec![
            ("mobile", Some(10.0)),
            ("mobile", Some(20.0)),
            ("desktop", Some(40.0)),
            ("desktop", Some(60.0)),
            ("tablet", Some(30.0)),
        ]);
        let s = &analyze(&t)["device"]["views"];
        assert_eq!(s.best, "desktop");
        assert_eq!(s.worst, "mobile");
        assert_eq!(s.spread, 35.0);
        assert_eq!(s.segments["mobile"].count, 2);
        assert_eq!(s.segments["tablet"].mean, 30.0);
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let t = table(vec![
            ("a", Some(1.0)),
            ("a", Some(3.0)),
            ("b", None),
            ("c", Some(5.0)),
        ]);
        let s = &analyze(&t)["device"]["views"];
        assert!(!s.segments.contains_key("b"));
        assert_eq!(s.segments.len(), 2);
    }

    #[test]
    fn test_single_segment_not_reported() {
        let t = table(vec![("only", Some(1.0)), ("only", Some(2.0))]);
        assert!(analyze(&t).is_empty());
    }

    #[test]
    fn test_high_cardinality_dimension_skipped() {
        let rows: Vec<(String, f64)> = (0..25).map(|i| (format!("seg{i}"), i as f64)).collect();
        let t = Table::new(
            vec!["device".into(), "views".into()],
            rows.into_iter()
                .map(|(d, v)| vec![Value::Text(d), Value::Number(v)])
                .collect(),
        );
        assert!(analyze(&t).is_empty());
    }
}
