//! Pipeline error type
//!
//! The pipeline degrades rather than fails: stages short on data emit
//! empty results. The only surfaced errors are the two "no usable input"
//! conditions, which the fusion stage must detect and pass through
//! without attempting correlation.

use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightError {
    #[error("No valid quantitative data was provided.")]
    NoQuantData,

    #[error("No qualitative documents were provided.")]
    NoQualData,

    #[error("No analyzable sentences found in the provided text.")]
    NoSentences,
}
