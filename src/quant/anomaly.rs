//! Anomaly detection
//!
//! Two detectors per metric column: z-score (|z| > 2.5) and IQR fences
//! (Q1 − 1.5·IQR, Q3 + 1.5·IQR). Columns with fewer than five values,
//! zero variance, or zero IQR are skipped. Results merge on
//! (column, row) identity with the IQR record winning, since the IQR
//! pass runs first.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::quant::stats::{mean, percentile_sorted, round4, sample_std};
use crate::table::Table;

pub const ZSCORE_THRESHOLD: f64 = 2.5;
pub const IQR_MULTIPLIER: f64 = 1.5;
const MIN_SAMPLES: usize = 5;

/// Maximum number of anomalies handed to downstream consumers.
pub const MAX_REPORTED_ANOMALIES: usize = 50;

/// Detection method that flagged an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMethod {
    Zscore,
    Iqr,
}

/// One flagged data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub column: String,
    pub method: AnomalyMethod,
    pub row_index: usize,
    pub value: f64,
    pub score: f64,
}

/// Z-score detection: z = (x − μ) / σ, flag |z| > 2.5.
pub fn detect_anomalies_zscore(table: &Table, metric_cols: &[String]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for col in metric_cols {
        let pairs = table.numeric_values(col);
        if pairs.len() < MIN_SAMPLES {
            continue;
        }
        let values: Vec<f64> = pairs.iter().map(|&(_, v)| v).collect();
        let m = mean(&values);
        let sd = sample_std(&values);
        if sd == 0.0 {
            continue;
        }
        for &(row, value) in &pairs {
            let z = (value - m) / sd;
            if z.abs() > ZSCORE_THRESHOLD {
                anomalies.push(Anomaly {
                    column: col.clone(),
                    method: AnomalyMethod::Zscore,
                    row_index: row,
                    value: round4(value),
                    score: round4(z),
                });
            }
        }
    }
    anomalies
}

/// IQR detection: flag points outside the fences; the score is the
/// distance beyond the nearer fence in IQR units.
pub fn detect_anomalies_iqr(table: &Table, metric_cols: &[String]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for col in metric_cols {
        let pairs = table.numeric_values(col);
        if pairs.len() < MIN_SAMPLES {
            continue;
        }
        let mut sorted: Vec<f64> = pairs.iter().map(|&(_, v)| v).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
        let q1 = percentile_sorted(&sorted, 0.25);
        let q3 = percentile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        if iqr == 0.0 {
            continue;
        }
        let lower = q1 - IQR_MULTIPLIER * iqr;
        let upper = q3 + IQR_MULTIPLIER * iqr;

        for &(row, value) in &pairs {
            let score = if value < lower {
                Some((lower - value) / iqr)
            } else if value > upper {
                Some((value - upper) / iqr)
            } else {
                None
            };
            if let Some(score) = score {
                anomalies.push(Anomaly {
                    column: col.clone(),
                    method: AnomalyMethod::Iqr,
                    row_index: row,
                    value: round4(value),
                    score: round4(score),
                });
            }
        }
    }
    anomalies
}

/// Merge IQR and z-score findings on (column, row) identity. IQR records
/// come first, so they win collisions.
pub fn merge_anomalies(iqr: Vec<Anomaly>, zscore: Vec<Anomaly>) -> Vec<Anomaly> {
    let mut seen: HashSet<(String, usize)> = HashSet::new();
    let mut merged = Vec::new();
    for a in iqr.into_iter().chain(zscore) {
        if seen.insert((a.column.clone(), a.row_index)) {
            merged.push(a);
        }
    }
    debug!(count = merged.len(), "merged anomalies");
    merged
}

/// Per-column counts over the full merged list, omitting clean columns.
pub fn summarize_anomalies(merged: &[Anomaly], metric_cols: &[String]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for col in metric_cols {
        let count = merged.iter().filter(|a| &a.column == col).count();
        if count > 0 {
            summary.insert(col.clone(), count);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn metric_table(values: &[f64]) -> Table {
        Table::new(
            vec!["views".into()],
            values.iter().map(|&v| vec![Value::Number(v)]).collect(),
        )
    }

    fn cols() -> Vec<String> {
        vec!["views".into()]
    }

    #[test]
    fn test_zscore_flags_outlier() {
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        let t = metric_table(&values);
        let found = detect_anomalies_zscore(&t, &cols());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].row_index, 20);
        assert!(found[0].score > ZSCORE_THRESHOLD);
    }

    #[test]
    fn test_zscore_scale_invariance() {
        let values = vec![
            10.0, 11.0, 9.0, 10.5, 9.5, 10.2, 9.8, 10.1, 9.9, 10.3, 50.0,
        ];
        let t1 = metric_table(&values);
        let scaled: Vec<f64> = values.iter().map(|v| v * 7.0 + 3.0).collect();
        let t2 = metric_table(&scaled);
        let n1 = detect_anomalies_zscore(&t1, &cols()).len();
        let n2 = detect_anomalies_zscore(&t2, &cols()).len();
        assert!(n1 > 0);
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_zscore_skips_constant_series() {
        let t = metric_table(&[5.0; 10]);
        assert!(detect_anomalies_zscore(&t, &cols()).is_empty());
    }

    #[test]
    fn test_iqr_shift_invariance() {
        let values = vec![1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0, 100.0];
        let t1 = metric_table(&values);
        let shifted: Vec<f64> = values.iter().map(|v| v + 42.0).collect();
        let t2 = metric_table(&shifted);
        let a1 = detect_anomalies_iqr(&t1, &cols());
        let a2 = detect_anomalies_iqr(&t2, &cols());
        assert!(!a1.is_empty());
        assert_eq!(a1.len(), a2.len());
        for (x, y) in a1.iter().zip(&a2) {
            assert!((y.value - x.value - 42.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_iqr_score_in_iqr_units() {
        // interpolated quartiles: Q1 = 2.25, Q3 = 4, IQR = 1.75,
        // upper fence = 6.625: value 11 scores (11 - 6.625) / 1.75 = 2.5
        let values = vec![2.0, 2.0, 3.0, 4.0, 4.0, 11.0];
        let t = metric_table(&values);
        let found = detect_anomalies_iqr(&t, &cols());
        assert_eq!(found.len(), 1);
        assert!((found[0].score - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_short_columns_are_skipped() {
        let t = metric_table(&[1.0, 2.0, 100.0, 3.0]);
        assert!(detect_anomalies_zscore(&t, &cols()).is_empty());
        assert!(detect_anomalies_iqr(&t, &cols()).is_empty());
    }

    #[test]
    fn test_merge_prefers_iqr_on_collision() {
        let iqr = vec![Anomaly {
            column: "views".into(),
            method: AnomalyMethod::Iqr,
            row_index: 3,
            value: 100.0,
            score: 2.5,
        }];
        let z = vec![
            Anomaly {
                column: "views".into(),
                method: AnomalyMethod::Zscore,
                row_index: 3,
                value: 100.0,
                score: 3.1,
            },
            Anomaly {
                column: "views".into(),
                method: AnomalyMethod::Zscore,
                row_index: 7,
                value: -50.0,
                score: -2.9,
            },
        ];
        let merged = merge_anomalies(iqr, z);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].method, AnomalyMethod::Iqr);
        assert_eq!(merged[1].row_index, 7);

        let summary = summarize_anomalies(&merged, &cols());
        assert_eq!(summary["views"], 2);
    }
}
