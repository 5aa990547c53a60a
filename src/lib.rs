//! # Insight Fusion
//!
//! Fuses quantitative analytics data (tabular metrics) with qualitative
//! feedback text (free-form user statements) into a single cross-validated
//! insight set: confirmed problems, confirmed successes, and divergent
//! signals between what users say and what the numbers show.
//!
//! The library provides:
//! - Column-role classification, descriptive statistics, anomaly
//!   detection, time-series trends, and segment comparison over a table
//! - Sentence-level lexicon sentiment and TF-IDF + NMF topic extraction
//!   over feedback documents
//! - A fusion engine that cross-correlates the two sides into ranked
//!   signals
//!
//! ## Example
//!
//! ```rust
//! use insight_fusion::{run_pipeline, Table, Value};
//!
//! let table = Table::new(
//!     vec!["date".into(), "bounce_rate".into()],
//!     (1..=10)
//!         .map(|day| {
//!             vec![
//!                 Value::Text(format!("2024-03-{day:02}")),
//!                 Value::Number(if day <= 5 { 40.0 } else { 60.0 }),
//!             ]
//!         })
//!         .collect(),
//! );
//! let documents = vec![
//!     "The new layout is wonderful and easy to use. \
//!      Page loads keep failing with an error on mobile."
//!         .to_string(),
//! ];
//!
//! let run = run_pipeline(Some(&table), &documents);
//! assert!(run.quant.is_ok());
//! assert!(run.qual.is_ok());
//! assert!(run.fusion.error.is_none());
//! ```

pub mod error;
pub mod fusion;
pub mod qual;
pub mod quant;
pub mod table;

use serde_json::{json, Value as JsonValue};
use tracing::debug;

pub use error::InsightError;
pub use fusion::{
    AnomalyThemeOverlap, FusionReport, FusionSummary, MatchedMetric, SegmentInsight,
    SentimentCorrelation, ThemeMetricAlignment,
};
pub use qual::{
    classify_sentiment, DocumentSentiment, QualReport, SentenceSentiment, SentimentAnalyzer,
    SentimentDistribution, SentimentScore, Topic,
};
pub use quant::{
    Anomaly, AnomalyMethod, ColumnClassification, DateRange, MetricStats, QuantReport,
    SegmentGroup, SegmentStat, SummaryMetric, TimeSeriesStat,
};
pub use table::{Table, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Results of one full pipeline run. The quant and qual sides carry
/// their own "no usable input" errors; the fusion report reflects the
/// first of them, if any.
#[derive(Debug)]
pub struct PipelineRun {
    pub quant: Result<QuantReport, InsightError>,
    pub qual: Result<QualReport, InsightError>,
    pub fusion: FusionReport,
}

impl PipelineRun {
    /// Render the run as plain nested JSON maps, the shape downstream
    /// narrative generators consume. A failed side serializes as
    /// `{"error": "..."}` in place of its report.
    pub fn to_json(&self) -> JsonValue {
        json!({
            "quant": result_json(&self.quant),
            "qual": result_json(&self.qual),
            "fusion": serde_json::to_value(&self.fusion).expect("fusion report serializes"),
        })
    }
}

fn result_json<T: serde::Serialize>(result: &Result<T, InsightError>) -> JsonValue {
    match result {
        Ok(report) => serde_json::to_value(report).expect("report serializes"),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

/// Run the full analysis pipeline: quant over the table, qual over the
/// documents, fusion over both. `table` is `None` when no tabular input
/// could be parsed upstream.
pub fn run_pipeline(table: Option<&Table>, documents: &[String]) -> PipelineRun {
    debug!(
        has_table = table.is_some(),
        documents = documents.len(),
        "pipeline start"
    );
    let quant = quant::analyze(table);
    let qual = qual::analyze(documents);
    let fusion = fusion::fuse(&quant, &qual);
    PipelineRun { quant, qual, fusion }
}
