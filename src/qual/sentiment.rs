//! Lexicon-based sentiment scoring
//!
//! Scores each sentence with a curated signed lexicon (valences roughly
//! ±1 to ±3.4). A negator in the three preceding tokens flips and damps
//! a word's valence; otherwise a booster amplifies it. The summed
//! valences normalize into a compound score in [−1, 1].

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::quant::stats::{round3, round4};

const NEGATION_FACTOR: f64 = -0.75;
const BOOST_POSITIVE: f64 = 1.25;
const BOOST_NEGATIVE: f64 = 1.15;
const NORMALIZATION_ALPHA: f64 = 15.0;
const LOOKBEHIND_WINDOW: usize = 3;

pub const POSITIVE_THRESHOLD: f64 = 0.3;
pub const NEGATIVE_THRESHOLD: f64 = -0.3;
pub const NEUTRAL_BAND: f64 = 0.1;

/// Polarity scores for one piece of text. `pos + neg + neu ≈ 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentScore {
    pub compound: f64,
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
}

impl SentimentScore {
    fn neutral() -> Self {
        Self {
            compound: 0.0,
            pos: 0.0,
            neg: 0.0,
            neu: 1.0,
        }
    }
}

/// Map a compound score to its label.
pub fn classify_sentiment(compound: f64) -> &'static str {
    if compound >= POSITIVE_THRESHOLD {
        "positive"
    } else if compound <= NEGATIVE_THRESHOLD {
        "negative"
    } else if compound.abs() <= NEUTRAL_BAND {
        "neutral"
    } else {
        "mixed"
    }
}

/// Lexicon sentiment analyzer.
pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    negators: HashSet<&'static str>,
    boosters: HashSet<&'static str>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicon: build_lexicon(),
            negators: build_negators(),
            boosters: build_boosters(),
        }
    }

    /// Score one sentence.
    pub fn polarity_scores(&self, text: &str) -> SentimentScore {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = word_pattern().find_iter(&lowered).map(|m| m.as_str()).collect();
        if words.is_empty() {
            return SentimentScore::neutral();
        }

        let mut valences = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let Some(&base) = self.lexicon.get(word) else {
                continue;
            };
            if base == 0.0 {
                continue;
            }
            let window = &words[i.saturating_sub(LOOKBEHIND_WINDOW)..i];
            let val = if window.iter().any(|w| self.negators.contains(w)) {
                base * NEGATION_FACTOR
            } else if window.iter().any(|w| self.boosters.contains(w)) {
                base * if base > 0.0 { BOOST_POSITIVE } else { BOOST_NEGATIVE }
            } else {
                base
            };
            valences.push(val);
        }

        if valences.is_empty() {
            return SentimentScore::neutral();
        }

        let raw_sum: f64 = valences.iter().sum();
        let compound = (raw_sum / (raw_sum * raw_sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0);

        let pos_sum: f64 = valences.iter().filter(|&&v| v > 0.0).sum();
        let neg_sum: f64 = valences.iter().filter(|&&v| v < 0.0).map(|v| v.abs()).sum();
        let total = pos_sum + neg_sum + 1e-6;

        let pos = round3(pos_sum / total);
        let neg = round3(neg_sum / total);
        let neu = round3(1.0 - pos - neg).max(0.0);

        SentimentScore {
            compound: round4(compound),
            pos,
            neg,
            neu,
        }
    }

    /// Score every sentence in order.
    pub fn score_sentences(&self, sentences: &[String]) -> Vec<SentimentScore> {
        sentences.iter().map(|s| self.polarity_scores(s)).collect()
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z']+").expect("fixed pattern"))
}

/// Curated valence lexicon, word → score in roughly [−3.4, +3.2].
fn build_lexicon() -> HashMap<&'static str, f64> {
    [
        // Strong negative
        ("broken", -2.8),
        ("unusable", -3.2),
        ("terrible", -3.4),
        ("horrible", -3.1),
        ("worst", -3.0),
        ("frustrating", -2.6),
        ("frustrated", -2.6),
        ("unbearable", -3.0),
        ("impossible", -2.5),
        ("failure", -2.8),
        ("failed", -2.5),
        ("bug", -2.2),
        ("crash", -2.8),
        ("crashed", -2.8),
        ("angry", -2.5),
        ("hate", -3.2),
        ("awful", -3.1),
        ("poor", -2.0),
        ("slow", -1.8),
        ("confusing", -2.2),
        ("confused", -2.0),
        ("difficult", -1.8),
        ("problem", -2.0),
        ("problems", -2.0),
        ("issue", -1.5),
        ("issues", -1.5),
        ("concern", -1.3),
        ("concerns", -1.3),
        ("complaint", -1.8),
        ("complaints", -1.8),
        ("dropped", -1.5),
        ("decline", -1.5),
        ("declined", -1.5),
        ("decrease", -1.2),
        ("lost", -1.5),
        ("worse", -2.2),
        ("bad", -2.5),
        ("wrong", -2.0),
        ("error", -2.2),
        ("errors", -2.2),
        ("ugly", -2.5),
        ("boring", -2.0),
        ("annoying", -2.2),
        ("disappointed", -2.3),
        ("stopped", -1.5),
        ("defeats", -1.8),
        ("buried", -1.5),
        ("hidden", -1.3),
        ("blank", -1.8),
        ("heavy", -1.2),
        ("heavier", -1.3),
        ("urgent", -1.0),
        // Mild negative
        ("hard", -1.2),
        ("complicated", -1.5),
        ("lacking", -1.2),
        ("missing", -1.3),
        ("negative", -1.5),
        ("tiny", -1.0),
        ("small", -0.5),
        // Strong positive
        ("excellent", 3.2),
        ("fantastic", 3.2),
        ("wonderful", 3.2),
        ("amazing", 3.1),
        ("outstanding", 3.0),
        ("brilliant", 3.0),
        ("perfect", 3.0),
        ("perfectly", 3.0),
        ("love", 2.8),
        ("loved", 2.8),
        ("great", 2.5),
        ("beautiful", 2.8),
        ("impressive", 2.5),
        ("impressed", 2.5),
        ("best", 2.8),
        ("superior", 2.2),
        ("essential", 1.8),
        ("valuable", 2.0),
        ("intuitive", 2.2),
        // Moderate positive
        ("good", 1.8),
        ("nice", 1.5),
        ("fine", 1.0),
        ("clean", 1.5),
        ("professional", 1.8),
        ("improved", 1.8),
        ("improvements", 1.5),
        ("improvement", 1.5),
        ("easy", 1.5),
        ("easier", 1.8),
        ("simple", 1.2),
        ("simpler", 1.5),
        ("fast", 1.5),
        ("faster", 1.8),
        ("quick", 1.3),
        ("smooth", 1.5),
        ("helpful", 2.0),
        ("useful", 1.8),
        ("informative", 1.8),
        ("comprehensive", 1.5),
        ("reliable", 1.8),
        ("solid", 1.3),
        ("appreciate", 2.0),
        ("appreciated", 2.0),
        ("positive", 1.5),
        ("well", 1.2),
        ("works", 1.0),
        ("sound", 1.2),
        // Boosters and negators score zero themselves
        ("very", 0.0),
        ("extremely", 0.0),
        ("really", 0.0),
        ("much", 0.0),
        ("not", 0.0),
        ("no", 0.0),
        ("never", 0.0),
        ("cannot", 0.0),
    ]
    .into_iter()
    .collect()
}

fn build_negators() -> HashSet<&'static str> {
    [
        "not", "no", "never", "cannot", "cant", "don", "doesn", "didn", "won", "wouldn",
        "shouldn", "couldn", "isn", "aren", "wasn",
    ]
    .into_iter()
    .collect()
}

fn build_boosters() -> HashSet<&'static str> {
    [
        "very",
        "extremely",
        "really",
        "incredibly",
        "absolutely",
        "particularly",
        "especially",
        "significantly",
        "definitely",
        "much",
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_neutral() {
        let a = SentimentAnalyzer::new();
        let s = a.polarity_scores("");
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
    }

    #[test]
    fn test_no_lexicon_hits_is_neutral() {
        let a = SentimentAnalyzer::new();
        let s = a.polarity_scores("the report covers quarterly figures");
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
    }

    #[test]
    fn test_compound_bounded() {
        let a = SentimentAnalyzer::new();
        let pileup = "terrible horrible awful worst broken unusable hate bad wrong".repeat(5);
        let s = a.polarity_scores(&pileup);
        assert!(s.compound >= -1.0 && s.compound <= 1.0);
        assert!(s.compound < -0.9);
    }

    #[test]
    fn test_negation_flips_contribution() {
        let a = SentimentAnalyzer::new();
        let plain = a.polarity_scores("the interface is good");
        let negated = a.polarity_scores("the interface is not good");
        assert!(plain.compound > 0.0);
        assert!(negated.compound < 0.0);
        // damped flip: |not good| < |good|
        assert!(negated.compound.abs() < plain.compound.abs());
    }

    #[test]
    fn test_booster_amplifies() {
        let a = SentimentAnalyzer::new();
        let plain = a.polarity_scores("this release is terrible");
        let boosted = a.polarity_scores("this release is absolutely terrible");
        assert!(boosted.compound < plain.compound);
    }

    #[test]
    fn test_negator_suppresses_booster() {
        let a = SentimentAnalyzer::new();
        // "not really good": negator wins over the booster in the window
        let s = a.polarity_scores("not really good");
        let expected = 1.8 * -0.75;
        let manual = expected / (expected * expected + 15.0_f64).sqrt();
        assert!((s.compound - round4(manual)).abs() < 1e-9);
    }

    #[test]
    fn test_shares_sum_to_one() {
        let a = SentimentAnalyzer::new();
        let s = a.polarity_scores("the good parts are great but the export is broken and slow");
        assert!((s.pos + s.neg + s.neu - 1.0).abs() < 0.01);
        assert!(s.pos > 0.0);
        assert!(s.neg > 0.0);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify_sentiment(0.3), "positive");
        assert_eq!(classify_sentiment(-0.3), "negative");
        assert_eq!(classify_sentiment(0.05), "neutral");
        assert_eq!(classify_sentiment(-0.1), "neutral");
        assert_eq!(classify_sentiment(0.2), "mixed");
        assert_eq!(classify_sentiment(-0.15), "mixed");
    }
}
