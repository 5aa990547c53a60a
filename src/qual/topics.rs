//! Topic extraction
//!
//! Clusters sentences into themes with TF-IDF + NMF: vectorize, factorize,
//! assign each sentence to its strongest component, then label each topic
//! from its heaviest terms and attach sentiment and representative quotes.
//! Fewer than three sentences bypasses clustering into a single catch-all
//! topic.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::quant::stats::round4;
use crate::qual::nmf::{self, NmfConfig};
use crate::qual::sentiment::{classify_sentiment, SentimentScore};
use crate::qual::vectorize::{clean_text, TfidfVectorizer};

const MAX_TOPICS: usize = 5;
const MIN_TOPICS: usize = 2;
const SENTENCES_PER_TOPIC: usize = 3;
const TOP_WORDS_PER_TOPIC: usize = 6;
const MAX_QUOTES_PER_TOPIC: usize = 3;
const LABEL_WORDS: usize = 3;
const MIN_SENTENCES_FOR_CLUSTERING: usize = 3;

/// One extracted theme. Every sentence belongs to exactly one topic.
#[derive(Debug, Clone)]
pub struct Topic {
    pub topic_id: usize,
    pub label: String,
    pub top_words: Vec<String>,
    /// Internal membership list; serialized only as its count.
    pub sentence_indices: Vec<usize>,
    pub representative_quotes: Vec<String>,
    pub avg_sentiment: f64,
    pub sentiment_label: String,
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Topic", 7)?;
        s.serialize_field("topic_id", &self.topic_id)?;
        s.serialize_field("label", &self.label)?;
        s.serialize_field("top_words", &self.top_words)?;
        s.serialize_field("sentence_count", &self.sentence_indices.len())?;
        s.serialize_field("representative_quotes", &self.representative_quotes)?;
        s.serialize_field("avg_sentiment", &self.avg_sentiment)?;
        s.serialize_field("sentiment_label", &self.sentiment_label)?;
        s.end()
    }
}

/// Extract topics from sentences and their sentiment scores.
///
/// Returns an empty list when vectorization finds no usable terms.
pub fn extract_topics(sentences: &[String], scores: &[SentimentScore]) -> Vec<Topic> {
    if sentences.len() < MIN_SENTENCES_FOR_CLUSTERING {
        return vec![catch_all_topic(sentences, scores)];
    }

    let n_topics = MAX_TOPICS.min(MIN_TOPICS.max(sentences.len() / SENTENCES_PER_TOPIC));

    let cleaned: Vec<String> = sentences.iter().map(|s| clean_text(s)).collect();
    let Some(tm) = TfidfVectorizer::new().fit_transform(&cleaned) else {
        return Vec::new();
    };
    let n_topics = n_topics.min(tm.terms.len());

    let model = nmf::factorize(&tm.matrix, &NmfConfig::new(n_topics));

    // Hard assignment: strongest affinity, first maximum on ties.
    let assignments: Vec<usize> = model
        .w
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_val = f64::NEG_INFINITY;
            for (i, &v) in row.iter().enumerate() {
                if v > best_val {
                    best_val = v;
                    best = i;
                }
            }
            best
        })
        .collect();

    let mut topics = Vec::new();
    for topic_idx in 0..n_topics {
        let sentence_indices: Vec<usize> = assignments
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == topic_idx)
            .map(|(i, _)| i)
            .collect();
        if sentence_indices.is_empty() {
            continue;
        }

        // Heaviest terms of this component, ties to the lower
        // (alphabetically earlier) term index.
        let row = model.h.row(topic_idx);
        let mut weighted: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("finite weights").then(a.0.cmp(&b.0)));
        let top_words: Vec<String> = weighted
            .iter()
            .take(TOP_WORDS_PER_TOPIC)
            .map(|&(i, _)| tm.terms[i].clone())
            .collect();

        let avg = mean_compound(&sentence_indices, scores);

        // Quotes: largest sentiment magnitude first, stable on ties.
        let mut by_magnitude = sentence_indices.clone();
        by_magnitude.sort_by(|&a, &b| {
            scores[b]
                .compound
                .abs()
                .partial_cmp(&scores[a].compound.abs())
                .expect("finite compounds")
        });
        let representative_quotes: Vec<String> = by_magnitude
            .iter()
            .take(MAX_QUOTES_PER_TOPIC)
            .map(|&i| sentences[i].clone())
            .collect();

        topics.push(Topic {
            topic_id: topic_idx,
            label: label_from(&top_words),
            top_words,
            sentence_indices,
            representative_quotes,
            avg_sentiment: round4(avg),
            sentiment_label: classify_sentiment(avg).to_string(),
        });
    }

    // Most polarized themes first.
    topics.sort_by(|a, b| {
        b.avg_sentiment
            .abs()
            .partial_cmp(&a.avg_sentiment.abs())
            .expect("finite sentiments")
    });

    debug!(count = topics.len(), "extracted topics");
    topics
}

fn catch_all_topic(sentences: &[String], scores: &[SentimentScore]) -> Topic {
    let avg = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.compound).sum::<f64>() / scores.len() as f64
    };
    Topic {
        topic_id: 0,
        label: "General Feedback".to_string(),
        top_words: Vec::new(),
        sentence_indices: (0..sentences.len()).collect(),
        representative_quotes: sentences.iter().take(MAX_QUOTES_PER_TOPIC).cloned().collect(),
        avg_sentiment: round4(avg),
        sentiment_label: classify_sentiment(avg).to_string(),
    }
}

fn mean_compound(indices: &[usize], scores: &[SentimentScore]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| scores[i].compound).sum::<f64>() / indices.len() as f64
}

/// "export failures / csv download / broken" → "Export Failures / Csv Download / Broken"
fn label_from(top_words: &[String]) -> String {
    top_words
        .iter()
        .take(LABEL_WORDS)
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" / ")
}

fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
