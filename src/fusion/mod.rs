//! Quant/qual fusion engine
//!
//! Cross-correlates extracted themes with metric trends, segments, and
//! anomalies. Four independent derivations, all pure functions of the two
//! upstream reports; if either upstream carries an error, the engine
//! short-circuits with that error and four empty lists.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::error::InsightError;
use crate::quant::stats::round2;
use crate::quant::{QuantReport, SegmentGroup};
use crate::qual::{QualReport, Topic};

const MIN_RELATIVE_SPREAD_PCT: f64 = 15.0;
const SENTIMENT_DIRECTION_BAND: f64 = 0.1;

/// One metric matched to a theme by keyword overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedMetric {
    pub metric: String,
    pub overlap_keywords: Vec<String>,
    pub pct_change: Option<f64>,
    pub direction: Option<String>,
}

/// A theme whose keywords overlap at least one metric column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeMetricAlignment {
    pub topic: String,
    pub topic_sentiment: f64,
    pub matched_metrics: Vec<MatchedMetric>,
}

/// Cross-validation of a theme's sentiment against a metric's trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentCorrelation {
    pub topic: String,
    pub topic_sentiment: f64,
    pub sentiment_direction: String,
    pub metric: String,
    pub metric_direction: String,
    pub metric_pct_change: f64,
    pub correlation_type: String,
    pub strength: String,
}

/// A (dimension, metric) pair whose segment spread is large relative to
/// the overall metric mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentInsight {
    pub dimension: String,
    pub metric: String,
    pub best_segment: String,
    pub worst_segment: String,
    pub spread: f64,
    pub relative_spread_pct: f64,
    pub segment_details: std::collections::BTreeMap<String, SegmentGroup>,
}

/// A theme whose keywords overlap an anomalous metric's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyThemeOverlap {
    pub anomalous_metric: String,
    pub anomaly_count: usize,
    pub related_topic: String,
    pub topic_sentiment: f64,
    pub overlap_keywords: Vec<String>,
}

/// Counters over the correlation and insight lists. Divergent signals
/// are counted by subtraction, not re-filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FusionSummary {
    pub confirmed_problems: usize,
    pub confirmed_successes: usize,
    pub divergent_signals: usize,
    pub segment_insights_count: usize,
}

/// Output of the fusion engine.
#[derive(Debug, Clone, Serialize)]
pub struct FusionReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub theme_metric_alignments: Vec<ThemeMetricAlignment>,
    pub sentiment_correlations: Vec<SentimentCorrelation>,
    pub segment_insights: Vec<SegmentInsight>,
    pub anomaly_theme_overlaps: Vec<AnomalyThemeOverlap>,
    pub summary: FusionSummary,
}

impl FusionReport {
    fn errored(message: String) -> Self {
        Self {
            error: Some(message),
            theme_metric_alignments: Vec::new(),
            sentiment_correlations: Vec::new(),
            segment_insights: Vec::new(),
            anomaly_theme_overlaps: Vec::new(),
            summary: FusionSummary::default(),
        }
    }
}

/// Fuse the two upstream results. Never partially fuses: any upstream
/// error is passed through with empty derivations.
pub fn fuse(
    quant: &Result<QuantReport, InsightError>,
    qual: &Result<QualReport, InsightError>,
) -> FusionReport {
    let (quant, qual) = match (quant, qual) {
        (Ok(quant), Ok(qual)) => (quant, qual),
        (Err(e), _) | (_, Err(e)) => return FusionReport::errored(e.to_string()),
    };

    let theme_metric_alignments = align_themes_to_metrics(quant, qual);
    let sentiment_correlations = correlate_sentiment_direction(quant, qual);
    let segment_insights = extract_segment_insights(quant);
    let anomaly_theme_overlaps = detect_anomaly_theme_overlap(quant, qual);

    let confirmed_problems = sentiment_correlations
        .iter()
        .filter(|c| c.correlation_type == "confirmed_problem")
        .count();
    let confirmed_successes = sentiment_correlations
        .iter()
        .filter(|c| c.correlation_type == "confirmed_success")
        .count();
    let summary = FusionSummary {
        confirmed_problems,
        confirmed_successes,
        divergent_signals: sentiment_correlations.len() - confirmed_problems - confirmed_successes,
        segment_insights_count: segment_insights.len(),
    };

    info!(
        alignments = theme_metric_alignments.len(),
        correlations = sentiment_correlations.len(),
        problems = summary.confirmed_problems,
        successes = summary.confirmed_successes,
        segment_insights = summary.segment_insights_count,
        overlaps = anomaly_theme_overlaps.len(),
        "fusion complete"
    );

    FusionReport {
        error: None,
        theme_metric_alignments,
        sentiment_correlations,
        segment_insights,
        anomaly_theme_overlaps,
        summary,
    }
}

/// Lowercase keywords of three or more letters.
fn extract_keywords(text: &str) -> BTreeSet<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[a-z]{3,}").expect("fixed pattern"));
    re.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Top words plus words parsed out of the label.
fn topic_keywords(topic: &Topic) -> BTreeSet<String> {
    let mut keywords: BTreeSet<String> = topic.top_words.iter().cloned().collect();
    keywords.extend(extract_keywords(&topic.label));
    keywords
}

/// Match themes to metric columns by keyword overlap.
fn align_themes_to_metrics(quant: &QuantReport, qual: &QualReport) -> Vec<ThemeMetricAlignment> {
    let mut alignments = Vec::new();
    for topic in &qual.topics {
        let keywords = topic_keywords(topic);

        let mut matched_metrics = Vec::new();
        for col in &quant.column_classification.metric_cols {
            let col_keywords = extract_keywords(col);
            let overlap: Vec<String> = keywords.intersection(&col_keywords).cloned().collect();
            if overlap.is_empty() {
                continue;
            }
            let ts = quant.time_series.get(col);
            matched_metrics.push(MatchedMetric {
                metric: col.clone(),
                overlap_keywords: overlap,
                pct_change: ts.map(|t| t.pct_change),
                direction: ts.map(|t| t.direction.clone()),
            });
        }

        if !matched_metrics.is_empty() {
            alignments.push(ThemeMetricAlignment {
                topic: topic.label.clone(),
                topic_sentiment: topic.avg_sentiment,
                matched_metrics,
            });
        }
    }
    alignments
}

/// Pair every polarized theme with every trending metric and classify the
/// agreement. Neutral sentiment and flat trends produce no record.
fn correlate_sentiment_direction(
    quant: &QuantReport,
    qual: &QualReport,
) -> Vec<SentimentCorrelation> {
    let mut correlations = Vec::new();
    for topic in &qual.topics {
        let sentiment = topic.avg_sentiment;
        let sent_dir = if sentiment > SENTIMENT_DIRECTION_BAND {
            "positive"
        } else if sentiment < -SENTIMENT_DIRECTION_BAND {
            "negative"
        } else {
            "neutral"
        };

        for (metric, ts) in &quant.time_series {
            let (correlation_type, strength) = match (sent_dir, ts.direction.as_str()) {
                ("negative", "down") => ("confirmed_problem", "strong"),
                ("positive", "up") => ("confirmed_success", "strong"),
                ("negative", "up") | ("positive", "down") => ("divergent", "moderate"),
                _ => continue,
            };
            correlations.push(SentimentCorrelation {
                topic: topic.label.clone(),
                topic_sentiment: sentiment,
                sentiment_direction: sent_dir.to_string(),
                metric: metric.clone(),
                metric_direction: ts.direction.clone(),
                metric_pct_change: ts.pct_change,
                correlation_type: correlation_type.to_string(),
                strength: strength.to_string(),
            });
        }
    }

    // Strong before moderate, then the most polarized themes first.
    correlations.sort_by(|a, b| {
        let rank = |c: &SentimentCorrelation| if c.strength == "strong" { 0 } else { 1 };
        rank(a).cmp(&rank(b)).then(
            b.topic_sentiment
                .abs()
                .partial_cmp(&a.topic_sentiment.abs())
                .expect("finite sentiments"),
        )
    });
    correlations
}

/// Keep (dimension, metric) pairs whose spread exceeds 15% of the overall
/// metric mean. The threshold is strict.
fn extract_segment_insights(quant: &QuantReport) -> Vec<SegmentInsight> {
    let mut insights = Vec::new();
    for (dim, metrics) in &quant.segments {
        for (metric, stat) in metrics {
            let overall_mean = quant
                .descriptive_stats
                .get(metric)
                .map(|s| s.mean)
                .unwrap_or(1.0);
            if overall_mean == 0.0 {
                continue;
            }
            let relative_spread = (stat.spread / overall_mean).abs() * 100.0;
            if relative_spread > MIN_RELATIVE_SPREAD_PCT {
                insights.push(SegmentInsight {
                    dimension: dim.clone(),
                    metric: metric.clone(),
                    best_segment: stat.best.clone(),
                    worst_segment: stat.worst.clone(),
                    spread: stat.spread,
                    relative_spread_pct: round2(relative_spread),
                    segment_details: stat.segments.clone(),
                });
            }
        }
    }
    insights.sort_by(|a, b| {
        b.relative_spread_pct
            .partial_cmp(&a.relative_spread_pct)
            .expect("finite spreads")
    });
    insights
}

/// Intersect every anomalous metric's keywords with every theme's
/// keywords; record all nonempty intersections.
fn detect_anomaly_theme_overlap(quant: &QuantReport, qual: &QualReport) -> Vec<AnomalyThemeOverlap> {
    let mut overlaps = Vec::new();
    for (col, &count) in &quant.anomaly_summary {
        if count == 0 {
            continue;
        }
        let col_keywords = extract_keywords(col);
        for topic in &qual.topics {
            let overlap: Vec<String> = topic_keywords(topic)
                .intersection(&col_keywords)
                .cloned()
                .collect();
            if !overlap.is_empty() {
                overlaps.push(AnomalyThemeOverlap {
                    anomalous_metric: col.clone(),
                    anomaly_count: count,
                    related_topic: topic.label.clone(),
                    topic_sentiment: topic.avg_sentiment,
                    overlap_keywords: overlap,
                });
            }
        }
    }
    overlaps
}
