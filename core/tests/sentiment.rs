use chrono::NaiveDate;
use kam_core::{
    config::{Polarity, PipelineConfig},
    records::FeedbackEntry,
    sentiment::{
        aggregate_dealer_sentiment, enrich_feedback, LexiconScorer, SentimentLabel, SentimentScorer,
    },
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn scorer() -> LexiconScorer {
    LexiconScorer::from_config(&PipelineConfig::standard().sentiment)
}

fn form(dealer: &str, comments: &str) -> FeedbackEntry {
    FeedbackEntry {
        dealer_id:       dealer.into(),
        feedback_date:   NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
        feedback_source: "Survey".into(),
        comments:        comments.into(),
    }
}

/// Always scores the same value, whatever the text.
struct Fixed(f64);

impl SentimentScorer for Fixed {
    fn score_text(&self, _text: &str) -> f64 {
        self.0
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn unscored_comments_are_exactly_zero() {
    let s = scorer();
    assert_eq!(s.score_text(""), 0.0);
    assert_eq!(s.score_text("Training for staff is needed."), 0.0);
}

/// Case and trailing punctuation do not matter; no stemming is done.
#[test]
fn lexicon_hits_are_case_insensitive_exact_tokens() {
    let s = scorer();
    assert_eq!(s.score_text("Inventory allocation is GOOD."), 1.0);
    assert_eq!(s.score_text("Warranty delays affecting trust."), -1.0);
    assert_eq!(s.score_text("Marketing support is insufficient."), 0.0);
    assert_eq!(s.score_text("goodness"), 0.0, "no partial-token matches");
}

#[test]
fn scores_stay_within_bounds() {
    let s = scorer();
    for text in [
        "good good good",
        "bad, poor, problem. issue",
        "satisfied but delays and complaints",
        "...,,,",
    ] {
        let score = s.score_text(text);
        assert!((-1.0..=1.0).contains(&score), "'{text}' scored {score}");
    }
}

/// Thresholds are strict: exactly ±0.2 is Neutral.
#[test]
fn labels_use_strict_thresholds() {
    let config = PipelineConfig::standard().sentiment;
    assert_eq!(SentimentLabel::classify(0.2, &config), SentimentLabel::Neutral);
    assert_eq!(SentimentLabel::classify(0.2001, &config), SentimentLabel::Positive);
    assert_eq!(SentimentLabel::classify(-0.2, &config), SentimentLabel::Neutral);
    assert_eq!(SentimentLabel::classify(-0.2001, &config), SentimentLabel::Negative);
}

/// Enrichment keeps input order and carries the source fields through.
#[test]
fn enrichment_labels_every_row_in_order() {
    let config = PipelineConfig::standard().sentiment;
    let feedback = vec![
        form("D002", "Timely delivery of vehicles."),
        form("D001", "Price discounting pressure in region."),
        form("D002", "More EV models required."),
    ];

    let scored = enrich_feedback(&feedback, &scorer(), &config);
    let labels: Vec<SentimentLabel> = scored.iter().map(|f| f.sentiment_label).collect();
    assert_eq!(labels, vec![SentimentLabel::Positive, SentimentLabel::Negative, SentimentLabel::Neutral]);
    assert_eq!(scored[1].dealer_id, "D001");
    assert_eq!(scored[1].feedback_source, "Survey");
}

/// The per-dealer mean only covers dealers that left feedback.
#[test]
fn dealers_without_feedback_have_no_aggregate() {
    let config = PipelineConfig::standard().sentiment;
    let feedback = vec![
        form("D002", "Timely delivery of vehicles."),
        form("D002", "More EV models required."),
        form("D005", "Warranty delays affecting trust."),
    ];

    let agg = aggregate_dealer_sentiment(&enrich_feedback(&feedback, &scorer(), &config));
    assert_eq!(agg.len(), 2);
    assert_eq!(agg[0].dealer_id, "D002");
    assert_eq!(agg[0].avg_sentiment_score, 0.5);
    assert_eq!(agg[1].avg_sentiment_score, -1.0);
    assert!(agg.iter().all(|a| a.dealer_id != "D001"));
}

/// Any scorer plugs into enrichment.
#[test]
fn custom_scorer_replaces_lexicon() {
    let config = PipelineConfig::standard().sentiment;
    let scored = enrich_feedback(&[form("D001", "whatever")], &Fixed(-0.9), &config);
    assert_eq!(scored[0].sentiment_score, -0.9);
    assert_eq!(scored[0].sentiment_label, SentimentLabel::Negative);
}

#[test]
fn lexicon_tokens_are_lower_cased_on_construction() {
    let s = LexiconScorer::new([("Stellar".to_string(), Polarity::Positive)]);
    assert_eq!(s.score_text("stellar quarter"), 1.0);
}
