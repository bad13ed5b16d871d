//! Feedback sentiment, scored per comment and averaged per dealer.
//!
//! The lexicon scorer is a stand-in for a real classifier. Anything that
//! implements [`SentimentScorer`] can replace it without touching the
//! aggregation.

use crate::{
    config::{Polarity, SentimentConfig},
    records::FeedbackEntry,
    types::DealerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Scores a free-text comment into [-1, 1]. An empty or unscorable
/// comment must score exactly 0.0.
pub trait SentimentScorer {
    fn score_text(&self, text: &str) -> f64;
}

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn classify(score: f64, config: &SentimentConfig) -> Self {
        if score > config.positive_threshold {
            Self::Positive
        } else if score < config.negative_threshold {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral  => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A feedback form with its derived sentiment fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFeedback {
    pub dealer_id:       DealerId,
    pub feedback_date:   NaiveDate,
    pub feedback_source: String,
    pub comments:        String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerSentiment {
    pub dealer_id:           DealerId,
    pub avg_sentiment_score: f64,
}

// ── Lexicon scorer ───────────────────────────────────────────────────────────

pub struct LexiconScorer {
    lexicon: HashMap<String, Polarity>,
}

impl LexiconScorer {
    pub fn new<I>(lexicon: I) -> Self
    where
        I: IntoIterator<Item = (String, Polarity)>,
    {
        Self {
            lexicon: lexicon
                .into_iter()
                .map(|(token, polarity)| (token.to_lowercase(), polarity))
                .collect(),
        }
    }

    pub fn from_config(config: &SentimentConfig) -> Self {
        Self::new(config.lexicon.iter().map(|(t, p)| (t.clone(), *p)))
    }
}

/// Lower-case, drop periods and commas, split on whitespace.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl SentimentScorer for LexiconScorer {
    /// `(pos − neg) / (pos + neg)` over exact token hits; 0.0 without hits.
    fn score_text(&self, text: &str) -> f64 {
        let (mut pos, mut neg) = (0u32, 0u32);
        for token in tokenize(text) {
            match self.lexicon.get(&token) {
                Some(Polarity::Positive) => pos += 1,
                Some(Polarity::Negative) => neg += 1,
                None => {}
            }
        }

        if pos == 0 && neg == 0 {
            return 0.0;
        }
        (f64::from(pos) - f64::from(neg)) / f64::from(pos + neg)
    }
}

// ── Enrichment & aggregation ─────────────────────────────────────────────────

/// Score and label every feedback row. Input order is preserved.
pub fn enrich_feedback<S: SentimentScorer + ?Sized>(
    feedback: &[FeedbackEntry],
    scorer:   &S,
    config:   &SentimentConfig,
) -> Vec<ScoredFeedback> {
    feedback
        .iter()
        .map(|entry| {
            let sentiment_score = scorer.score_text(&entry.comments);
            ScoredFeedback {
                dealer_id:       entry.dealer_id.clone(),
                feedback_date:   entry.feedback_date,
                feedback_source: entry.feedback_source.clone(),
                comments:        entry.comments.clone(),
                sentiment_score,
                sentiment_label: SentimentLabel::classify(sentiment_score, config),
            }
        })
        .collect()
}

/// Mean comment score per dealer. Dealers without feedback get no row:
/// absence means "no signal", which is not the same as a neutral 0.
pub fn aggregate_dealer_sentiment(scored: &[ScoredFeedback]) -> Vec<DealerSentiment> {
    let mut by_dealer: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in scored {
        let (sum, count) = by_dealer.entry(row.dealer_id.as_str()).or_default();
        *sum += row.sentiment_score;
        *count += 1;
    }

    by_dealer
        .into_iter()
        .map(|(dealer_id, (sum, count))| DealerSentiment {
            dealer_id:           dealer_id.to_string(),
            avg_sentiment_score: sum / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_periods_and_commas() {
        let tokens: Vec<String> = tokenize("Good,timely. SUPPORT  here").collect();
        assert_eq!(tokens, vec!["good", "timely", "support", "here"]);
    }
}
