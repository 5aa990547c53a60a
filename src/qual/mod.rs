//! Qualitative analysis pipeline
//!
//! Splits feedback documents into sentences, scores each sentence with
//! the lexicon sentiment analyzer, aggregates a document-level view, and
//! clusters the sentences into themes.

pub mod nmf;
pub mod sentences;
pub mod sentiment;
pub mod topics;
pub mod vectorize;

use serde::Serialize;
use tracing::info;

use crate::error::InsightError;
use crate::quant::stats::round4;

pub use sentiment::{classify_sentiment, SentimentAnalyzer, SentimentScore};
pub use topics::Topic;

/// Sentence counts per sentiment bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Document-level sentiment: mean compound over all sentences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSentiment {
    pub compound: f64,
    pub label: String,
    pub distribution: SentimentDistribution,
}

/// Per-sentence scored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceSentiment {
    pub text: String,
    pub compound: f64,
    pub label: String,
}

/// Full output of the qualitative pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct QualReport {
    pub sentence_count: usize,
    pub document_sentiment: DocumentSentiment,
    pub topics: Vec<Topic>,
    pub all_sentiments: Vec<SentenceSentiment>,
}

/// Run the full qualitative pipeline over decoded documents.
///
/// An empty document list yields [`InsightError::NoQualData`]; documents
/// from which no sentence survives splitting yield
/// [`InsightError::NoSentences`].
pub fn analyze(documents: &[String]) -> Result<QualReport, InsightError> {
    if documents.is_empty() {
        return Err(InsightError::NoQualData);
    }
    let sentence_list = sentences::split_documents(documents);
    if sentence_list.is_empty() {
        return Err(InsightError::NoSentences);
    }

    let analyzer = SentimentAnalyzer::new();
    let scores = analyzer.score_sentences(&sentence_list);

    let compounds: Vec<f64> = scores.iter().map(|s| s.compound).collect();
    let doc_compound = compounds.iter().sum::<f64>() / compounds.len() as f64;
    let positive = compounds
        .iter()
        .filter(|&&c| c >= sentiment::POSITIVE_THRESHOLD)
        .count();
    let negative = compounds
        .iter()
        .filter(|&&c| c <= sentiment::NEGATIVE_THRESHOLD)
        .count();
    let neutral = compounds.len() - positive - negative;

    let topics = topics::extract_topics(&sentence_list, &scores);

    let all_sentiments = sentence_list
        .iter()
        .zip(&scores)
        .map(|(text, score)| SentenceSentiment {
            text: text.clone(),
            compound: score.compound,
            label: classify_sentiment(score.compound).to_string(),
        })
        .collect();

    info!(
        sentences = sentence_list.len(),
        topics = topics.len(),
        document_compound = doc_compound,
        "qual analysis complete"
    );

    Ok(QualReport {
        sentence_count: sentence_list.len(),
        document_sentiment: DocumentSentiment {
            compound: round4(doc_compound),
            label: classify_sentiment(doc_compound).to_string(),
            distribution: SentimentDistribution {
                positive,
                negative,
                neutral,
            },
        },
        topics,
        all_sentiments,
    })
}
