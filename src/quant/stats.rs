//! Descriptive statistics
//!
//! Per-metric mean/median/std/min/max/quartiles over coerced numeric
//! values. Quantiles use linear interpolation between order statistics;
//! std is the sample standard deviation (n − 1). A fully-missing column
//! yields zeros, not a fault.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::Table;

/// Summary statistics for one metric column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub count: usize,
    pub null_count: usize,
}

/// Compute descriptive statistics for each metric column.
pub fn compute_descriptive_stats(
    table: &Table,
    metric_cols: &[String],
) -> BTreeMap<String, MetricStats> {
    let mut stats = BTreeMap::new();
    for col in metric_cols {
        if table.column_index(col).is_none() {
            continue;
        }
        let mut values: Vec<f64> = table
            .numeric_values(col)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let null_count = table.row_count() - values.len();

        if values.is_empty() {
            stats.insert(
                col.clone(),
                MetricStats {
                    null_count,
                    ..MetricStats::default()
                },
            );
            continue;
        }

        values.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
        stats.insert(
            col.clone(),
            MetricStats {
                mean: round4(mean(&values)),
                median: round4(percentile_sorted(&values, 0.5)),
                std: round4(sample_std(&values)),
                min: round4(values[0]),
                max: round4(values[values.len() - 1]),
                q25: round4(percentile_sorted(&values, 0.25)),
                q75: round4(percentile_sorted(&values, 0.75)),
                count: values.len(),
                null_count,
            },
        );
    }
    stats
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); 0.0 for fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Quantile of an ascending-sorted slice with linear interpolation.
pub(crate) fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let frac = pos - lo as f64;
            if lo + 1 >= n {
                sorted[n - 1]
            } else {
                sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
            }
        }
    }
}

pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub(crate) fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

pub(crate) fn round3(x: f64) -> f64 {
    (x * 1_000.0).round() / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn one_metric(values: Vec<Value>) -> Table {
        Table::new(vec!["views".into()], values.into_iter().map(|v| vec![v]).collect())
    }

    #[test]
    fn test_basic_stats() {
        let t = one_metric((1..=5).map(|i| Value::Number(i as f64)).collect());
        let stats = compute_descriptive_stats(&t, &["views".into()]);
        let s = &stats["views"];
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.q25, 2.0);
        assert_eq!(s.q75, 4.0);
        assert_eq!(s.count, 5);
        assert_eq!(s.null_count, 0);
        // sample std of 1..5 is sqrt(2.5)
        assert!((s.std - 2.5_f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_interpolated_quartiles() {
        let t = one_metric((1..=4).map(|i| Value::Number(i as f64)).collect());
        let stats = compute_descriptive_stats(&t, &["views".into()]);
        let s = &stats["views"];
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q75, 3.25);
    }

    #[test]
    fn test_coercion_and_nulls() {
        let t = one_metric(vec![
            Value::Number(10.0),
            Value::Text("20".into()),
            Value::Text("n/a".into()),
            Value::Null,
        ]);
        let stats = compute_descriptive_stats(&t, &["views".into()]);
        let s = &stats["views"];
        assert_eq!(s.count, 2);
        assert_eq!(s.null_count, 2);
        assert_eq!(s.mean, 15.0);
    }

    #[test]
    fn test_fully_missing_column_yields_zeros() {
        let t = one_metric(vec![Value::Null, Value::Text("x".into())]);
        let stats = compute_descriptive_stats(&t, &["views".into()]);
        let s = &stats["views"];
        assert_eq!(s.count, 0);
        assert_eq!(s.null_count, 2);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.std, 0.0);
    }

    #[test]
    fn test_degenerate_series_has_zero_std() {
        let t = one_metric(vec![Value::Number(7.0); 6]);
        let stats = compute_descriptive_stats(&t, &["views".into()]);
        assert_eq!(stats["views"].std, 0.0);
    }
}
