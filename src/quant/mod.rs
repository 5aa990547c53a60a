//! Quantitative analysis pipeline
//!
//! Classifies table columns, then runs the four independent analyzers —
//! descriptive statistics, anomaly detection, time-series trends, and
//! segment comparison — and assembles the combined [`QuantReport`].

pub mod anomaly;
pub mod classify;
pub mod segments;
pub mod stats;
pub mod timeseries;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::error::InsightError;
use crate::table::Table;

pub use anomaly::{Anomaly, AnomalyMethod, MAX_REPORTED_ANOMALIES};
pub use classify::ColumnClassification;
pub use segments::{SegmentGroup, SegmentStat};
pub use stats::MetricStats;
pub use timeseries::{DateRange, TimeSeriesStat};

/// One line of the per-metric summary, blending descriptive stats with
/// the trend and anomaly findings for that metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetric {
    pub metric: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub pct_change: Option<f64>,
    pub direction: Option<String>,
    pub anomaly_count: usize,
}

/// Full output of the quantitative pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct QuantReport {
    pub row_count: usize,
    pub column_classification: ColumnClassification,
    pub descriptive_stats: BTreeMap<String, MetricStats>,
    /// Merged anomalies, truncated to [`MAX_REPORTED_ANOMALIES`].
    pub anomalies: Vec<Anomaly>,
    /// Per-column counts over the full (untruncated) merged list.
    pub anomaly_summary: BTreeMap<String, usize>,
    pub time_series: BTreeMap<String, TimeSeriesStat>,
    pub segments: BTreeMap<String, BTreeMap<String, SegmentStat>>,
    pub summary_metrics: Vec<SummaryMetric>,
}

/// Run the full quantitative pipeline over an ingested table.
///
/// `None` (nothing could be parsed upstream) or a table without columns
/// yields [`InsightError::NoQuantData`]; every other data shortage
/// degrades to empty sub-results.
pub fn analyze(table: Option<&Table>) -> Result<QuantReport, InsightError> {
    let table = table.ok_or(InsightError::NoQuantData)?;
    if table.column_count() == 0 {
        return Err(InsightError::NoQuantData);
    }

    let classification = classify::classify_columns(table);
    let descriptive_stats = stats::compute_descriptive_stats(table, &classification.metric_cols);

    // IQR first: its records win the (column, row) merge.
    let iqr = anomaly::detect_anomalies_iqr(table, &classification.metric_cols);
    let zscore = anomaly::detect_anomalies_zscore(table, &classification.metric_cols);
    let merged = anomaly::merge_anomalies(iqr, zscore);
    let anomaly_summary = anomaly::summarize_anomalies(&merged, &classification.metric_cols);

    let time_series = match classification.date_cols.first() {
        Some(date_col) => timeseries::analyze_time_series(table, date_col, &classification.metric_cols),
        None => BTreeMap::new(),
    };

    let segments = segments::analyze_segments(
        table,
        &classification.dimension_cols,
        &classification.metric_cols,
    );

    // Summary rows follow classified metric order, not map order.
    let summary_metrics = classification
        .metric_cols
        .iter()
        .filter_map(|col| {
            let s = descriptive_stats.get(col)?;
            let ts = time_series.get(col);
            Some(SummaryMetric {
                metric: col.clone(),
                mean: s.mean,
                median: s.median,
                std: s.std,
                pct_change: ts.map(|t| t.pct_change),
                direction: ts.map(|t| t.direction.clone()),
                anomaly_count: merged.iter().filter(|a| &a.column == col).count(),
            })
        })
        .collect();

    let mut anomalies = merged;
    anomalies.truncate(MAX_REPORTED_ANOMALIES);

    info!(
        rows = table.row_count(),
        metrics = classification.metric_cols.len(),
        anomalies = anomalies.len(),
        trended = time_series.len(),
        "quant analysis complete"
    );

    Ok(QuantReport {
        row_count: table.row_count(),
        column_classification: classification,
        descriptive_stats,
        anomalies,
        anomaly_summary,
        time_series,
        segments,
        summary_metrics,
    })
}
