//! Time-series trend analysis
//!
//! Sorts rows by the date column, bisects them by position into halves,
//! and compares per-metric means. Also fits a least-squares slope over
//! the full ordered series. Fewer than four dated rows yields an empty
//! result, not an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::quant::stats::{mean, round2, round4, round6};
use crate::table::Table;

const MIN_DATED_ROWS: usize = 4;
const MIN_SLOPE_POINTS: usize = 3;
const DIRECTION_THRESHOLD_PCT: f64 = 5.0;

/// Inclusive date span of the analyzed rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Half-over-half comparison for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesStat {
    pub mean_first_half: f64,
    pub mean_second_half: f64,
    pub pct_change: f64,
    pub direction: String,
    pub trend_slope: f64,
    pub date_range: DateRange,
}

/// Analyze every metric against the given date column.
pub fn analyze_time_series(
    table: &Table,
    date_col: &str,
    metric_cols: &[String],
) -> BTreeMap<String, TimeSeriesStat> {
    let mut results = BTreeMap::new();

    if table.column_index(date_col).is_none() {
        return results;
    }
    // Rows with a parseable date, ordered by date (stable on ties).
    let mut dated: Vec<(NaiveDate, usize)> = table
        .column(date_col)
        .enumerate()
        .filter_map(|(row, v)| v.as_date().map(|d| (d, row)))
        .collect();
    if dated.len() < MIN_DATED_ROWS {
        return results;
    }
    dated.sort_by_key(|&(d, _)| d);

    let start = dated[0].0;
    let end = dated[dated.len() - 1].0;
    let mid = dated.len() / 2;

    for col in metric_cols {
        if table.column_index(col).is_none() {
            continue;
        }
        // Per-row coerced values in date order; None marks missing cells.
        let ordered: Vec<Option<f64>> = dated
            .iter()
            .map(|&(_, row)| table.cell(row, col).and_then(|v| v.as_number()))
            .collect();

        let missing = ordered.iter().filter(|v| v.is_none()).count();
        if missing as f64 > ordered.len() as f64 * 0.5 {
            continue;
        }

        let first: Vec<f64> = ordered[..mid].iter().flatten().copied().collect();
        let second: Vec<f64> = ordered[mid..].iter().flatten().copied().collect();
        let m1 = mean(&first);
        let m2 = mean(&second);
        let pct = if m1 != 0.0 { (m2 - m1) / m1.abs() * 100.0 } else { 0.0 };

        let clean: Vec<f64> = ordered.iter().flatten().copied().collect();
        let slope = if clean.len() >= MIN_SLOPE_POINTS {
            least_squares_slope(&clean)
        } else {
            0.0
        };

        let direction = if pct > DIRECTION_THRESHOLD_PCT {
            "up"
        } else if pct < -DIRECTION_THRESHOLD_PCT {
            "down"
        } else {
            "flat"
        };

        results.insert(
            col.clone(),
            TimeSeriesStat {
                mean_first_half: round4(m1),
                mean_second_half: round4(m2),
                pct_change: round2(pct),
                direction: direction.to_string(),
                trend_slope: round6(slope),
                date_range: DateRange {
                    start: start.format("%Y-%m-%d").to_string(),
                    end: end.format("%Y-%m-%d").to_string(),
                },
            },
        );
    }
    results
}

/// Slope of the least-squares line through (0, y0), (1, y1), ...
fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn day(n: u32) -> Value {
        Value::Text(format!("2024-03-{n:02}"))
    }

    fn table(dates: Vec<Value>, values: Vec<Value>) -> Table {
        Table::new(
            vec!["date".into(), "views".into()],
            dates.into_iter().zip(values).map(|(d, v)| vec![d, v]).collect(),
        )
    }

    #[test]
    fn test_half_over_half_change() {
        let dates = (1..=10).map(day).collect();
        let values = [40.0, 40.0, 40.0, 40.0, 40.0, 60.0, 60.0, 60.0, 60.0, 60.0]
            .iter()
            .map(|&v| Value::Number(v))
            .collect();
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        let s = &ts["views"];
        assert_eq!(s.mean_first_half, 40.0);
        assert_eq!(s.mean_second_half, 60.0);
        assert_eq!(s.pct_change, 50.0);
        assert_eq!(s.direction, "up");
        assert_eq!(s.date_range.start, "2024-03-01");
        assert_eq!(s.date_range.end, "2024-03-10");
        assert!(s.trend_slope > 0.0);
    }

    #[test]
    fn test_rows_sorted_by_date_not_position() {
        let dates = vec![day(4), day(3), day(2), day(1)];
        let values = vec![
            Value::Number(60.0),
            Value::Number(60.0),
            Value::Number(40.0),
            Value::Number(40.0),
        ];
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        assert_eq!(ts["views"].direction, "up");
    }

    #[test]
    fn test_too_few_dated_rows_is_empty() {
        let dates = vec![day(1), day(2), Value::Text("soon".into()), Value::Null];
        let values = (0..4).map(|i| Value::Number(i as f64)).collect();
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        assert!(ts.is_empty());
    }

    #[test]
    fn test_mostly_missing_metric_is_skipped() {
        let dates = (1..=6).map(day).collect();
        let values = vec![
            Value::Number(1.0),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Number(2.0),
        ];
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        assert!(ts.is_empty());
    }

    #[test]
    fn test_zero_first_half_mean_guards_division() {
        let dates = (1..=4).map(day).collect();
        let values = vec![
            Value::Number(0.0),
            Value::Number(0.0),
            Value::Number(10.0),
            Value::Number(10.0),
        ];
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        assert_eq!(ts["views"].pct_change, 0.0);
        assert_eq!(ts["views"].direction, "flat");
    }

    #[test]
    fn test_flat_band() {
        let dates = (1..=8).map(day).collect();
        let values = (0..8).map(|_| Value::Number(100.0)).collect();
        let ts = analyze_time_series(&table(dates, values), "date", &["views".into()]);
        let s = &ts["views"];
        assert_eq!(s.direction, "flat");
        assert_eq!(s.trend_slope, 0.0);
    }
}
