//! Column-role classification
//!
//! Labels every table column as date, metric, dimension, or unknown by
//! matching column names against fixed keyword patterns, falling back on
//! value types when no pattern fires. Never errs: in the worst case a
//! column lands in `unknown` or the numeric fallback makes it a metric.

use regex::RegexBuilder;
use serde::Serialize;
use tracing::debug;

use crate::table::Table;

const DATE_KEYWORDS: &str = r"(date|time|timestamp|period|month|week|day|year)";
const METRIC_KEYWORDS: &str = r"(view|visit|session|download|click|bounce|engagement|rate|duration|revenue|conversion|user|subscriber|score|count|total|avg|average|time.on|page.view|impressions|ctr|open.rate|churn|retention|signup|install|uninstall|error|latency|load.time|lcp|fcp|cls|satisfaction|nps|csat|response)";
const DIMENSION_KEYWORDS: &str = r"(device|platform|browser|country|region|city|channel|source|medium|segment|category|type|group|cohort|plan|tier|os|version|campaign|age.group|gender|language)";

/// The four disjoint column sets. Every input column appears in exactly
/// one of them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnClassification {
    pub date_cols: Vec<String>,
    pub metric_cols: Vec<String>,
    pub dimension_cols: Vec<String>,
    pub unknown_cols: Vec<String>,
}

/// Classify every column of the table.
pub fn classify_columns(table: &Table) -> ColumnClassification {
    let date_re = keyword_regex(DATE_KEYWORDS);
    let metric_re = keyword_regex(METRIC_KEYWORDS);
    let dimension_re = keyword_regex(DIMENSION_KEYWORDS);

    let mut result = ColumnClassification::default();
    let row_count = table.row_count();
    let dimension_cap = 20.0_f64.max(row_count as f64 * 0.3);

    for col in table.columns() {
        let name = col.trim();

        if date_re.is_match(name) && table.parses_as_dates(col) {
            result.date_cols.push(name.to_string());
            continue;
        }
        if metric_re.is_match(name) && table.is_numeric_column(col) {
            result.metric_cols.push(name.to_string());
            continue;
        }
        if dimension_re.is_match(name) {
            result.dimension_cols.push(name.to_string());
            continue;
        }

        // Fallback heuristics on value types.
        if table.is_numeric_column(col) {
            result.metric_cols.push(name.to_string());
        } else if table.is_text_column(col) {
            if table.cardinality(col) as f64 <= dimension_cap {
                result.dimension_cols.push(name.to_string());
            } else {
                result.unknown_cols.push(name.to_string());
            }
        } else {
            result.unknown_cols.push(name.to_string());
        }
    }

    debug!(
        dates = ?result.date_cols,
        metrics = ?result.metric_cols,
        dimensions = ?result.dimension_cols,
        unknown = ?result.unknown_cols,
        "classified columns"
    );
    result
}

fn keyword_regex(pattern: &str) -> regex::Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("keyword patterns are fixed and valid")
}
