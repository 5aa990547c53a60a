//! Text cleaning and TF-IDF vectorization
//!
//! Converts sentences into an L2-normalized term-weight matrix over
//! unigrams and bigrams, with stop-word removal, a document-frequency
//! ceiling, and a vocabulary cap. Term weight = tf · (ln((1+n)/(1+df)) + 1),
//! the smoothed-IDF convention.

use std::collections::HashSet;
use std::sync::OnceLock;

use hashbrown::HashMap;
use ndarray::Array2;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Lowercase, strip non-alphanumerics, collapse whitespace.
pub fn clean_text(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("fixed pattern"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("fixed pattern"));

    let lowered = text.to_lowercase();
    let stripped = non_alnum.replace_all(&lowered, " ");
    spaces.replace_all(stripped.trim(), " ").to_string()
}

/// Fitted term-weight matrix with its vocabulary.
#[derive(Debug)]
pub struct TermMatrix {
    /// Sentences × terms, rows L2-normalized.
    pub matrix: Array2<f64>,
    /// Terms in vocabulary order (alphabetical).
    pub terms: Vec<String>,
}

/// TF-IDF vectorizer over unigrams and bigrams.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    max_df_ratio: f64,
    min_token_len: usize,
    stop_words: &'static HashSet<&'static str>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            max_features: 500,
            max_df_ratio: 0.9,
            min_token_len: 2,
            stop_words: stop_words(),
        }
    }

    /// Set the vocabulary cap.
    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = max;
        self
    }

    /// Set the document-frequency ceiling as a ratio of the corpus size.
    pub fn max_df_ratio(mut self, ratio: f64) -> Self {
        self.max_df_ratio = ratio;
        self
    }

    /// Unigram + bigram terms of one cleaned sentence, stop words removed
    /// before bigram construction.
    fn terms_of(&self, cleaned: &str) -> Vec<String> {
        let tokens: Vec<&str> = cleaned
            .unicode_words()
            .filter(|w| w.len() >= self.min_token_len && !self.stop_words.contains(w))
            .collect();
        let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        terms.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
        terms
    }

    /// Vectorize the cleaned sentences. Returns `None` when no term
    /// survives preprocessing (the caller degrades to an empty topic
    /// list).
    pub fn fit_transform(&self, cleaned: &[String]) -> Option<TermMatrix> {
        let n_docs = cleaned.len();
        if n_docs == 0 {
            return None;
        }
        let docs: Vec<Vec<String>> = cleaned.iter().map(|s| self.terms_of(s)).collect();

        // Document frequencies and corpus frequencies.
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(|t| t.as_str()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
            for term in doc {
                *corpus_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Drop corpus-wide boilerplate terms above the df ceiling.
        let max_df = self.max_df_ratio * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = doc_freq
            .iter()
            .filter(|&(_, &df)| df as f64 <= max_df)
            .map(|(&term, &df)| (term, df))
            .collect();
        if kept.is_empty() {
            return None;
        }

        // Vocabulary cap: most frequent terms first, ties alphabetical.
        if kept.len() > self.max_features {
            kept.sort_by(|a, b| {
                corpus_freq[b.0]
                    .cmp(&corpus_freq[a.0])
                    .then_with(|| a.0.cmp(b.0))
            });
            kept.truncate(self.max_features);
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let terms: Vec<String> = kept.iter().map(|&(t, _)| t.to_string()).collect();
        let index: HashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, &(t, _))| (t, i))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|&(_, df)| ((1 + n_docs) as f64 / (1 + df) as f64).ln() + 1.0)
            .collect();

        let mut matrix = Array2::zeros((n_docs, terms.len()));
        for (doc_idx, doc) in docs.iter().enumerate() {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for term in doc {
                *counts.entry(term.as_str()).or_insert(0) += 1;
            }
            for (term, count) in counts {
                if let Some(&term_idx) = index.get(term) {
                    matrix[[doc_idx, term_idx]] = count as f64 * idf[term_idx];
                }
            }
            // L2-normalize the row.
            let norm = matrix.row(doc_idx).iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                matrix.row_mut(doc_idx).mapv_inplace(|v| v / norm);
            }
        }

        Some(TermMatrix { matrix, terms })
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        [
            "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
            "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
            "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
            "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
            "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
            "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
            "while", "of", "at", "by", "for", "with", "about", "against", "between", "through",
            "during", "before", "after", "above", "below", "to", "from", "up", "down", "in",
            "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
            "there", "when", "where", "why", "how", "all", "both", "each", "few", "more", "most",
            "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
            "too", "very", "s", "t", "can", "will", "just", "don", "should", "now", "also",
            "would", "could", "might",
        ]
        .into_iter()
        .collect()
    })
}
