//! Sentiment signal extraction.
//!
//! Counts lexical polarity hits weighted by position: the headline and any
//! executive-summary section carry more weight than body text. Also tallies
//! keyword evidence for the fixed dominant-emotion vocabulary.

use std::collections::BTreeMap;

use tracing::debug;

use docintel_shared::{Document, Emotion, Result, SentimentSignal, StageValue};

use crate::{Extractor, is_heading, tokenize};

/// Weight applied to hits in the first non-empty line.
const HEADLINE_WEIGHT: f64 = 3.0;

/// Weight applied to hits inside an executive-summary section.
const SUMMARY_WEIGHT: f64 = 2.0;

/// Weight applied to body hits.
const BODY_WEIGHT: f64 = 1.0;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "positive",
    "success",
    "successful",
    "growth",
    "improvement",
    "benefit",
    "advantage",
    "opportunity",
    "strong",
    "effective",
    "efficient",
    "savings",
    "exceeded",
    "outstanding",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "poor",
    "negative",
    "problem",
    "issue",
    "risk",
    "concern",
    "challenge",
    "difficulty",
    "failure",
    "weak",
    "ineffective",
    "decline",
    "loss",
    "delay",
];

/// Keyword evidence per dominant emotion. `Neutral` has no keywords — it is
/// the fallback when nothing else scores.
const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Optimistic,
        &["optimistic", "promising", "hopeful", "bright", "opportunity", "growth"],
    ),
    (
        Emotion::Confident,
        &["confident", "certain", "assured", "definite", "strong", "proven"],
    ),
    (
        Emotion::Cautious,
        &["careful", "cautious", "conservative", "prudent", "uncertain", "tentative"],
    ),
    (
        Emotion::Negative,
        &["negative", "poor", "failure", "weak", "declining", "critical"],
    ),
];

/// Extractor producing a [`SentimentSignal`] from lexical polarity evidence.
#[derive(Debug, Default)]
pub struct SentimentExtractor;

impl Extractor for SentimentExtractor {
    fn name(&self) -> &'static str {
        "extract_sentiment"
    }

    fn run(&self, doc: &Document) -> Result<StageValue> {
        Ok(StageValue::Sentiment(extract_signal(&doc.text)))
    }
}

/// Scan text and accumulate weighted polarity plus emotion keyword counts.
pub fn extract_signal(text: &str) -> SentimentSignal {
    let mut signal = SentimentSignal::default();
    let mut emotion_counts: BTreeMap<Emotion, u32> = BTreeMap::new();

    let mut seen_headline = false;
    let mut in_summary = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_heading(trimmed) {
            in_summary = trimmed.to_lowercase().contains("executive summary");
        }

        let weight = if !seen_headline {
            seen_headline = true;
            HEADLINE_WEIGHT
        } else if in_summary {
            SUMMARY_WEIGHT
        } else {
            BODY_WEIGHT
        };

        for token in tokenize(trimmed) {
            if POSITIVE_WORDS.contains(&token.as_str()) {
                signal.positive_hits += 1;
                signal.weighted_positive += weight;
            }
            if NEGATIVE_WORDS.contains(&token.as_str()) {
                signal.negative_hits += 1;
                signal.weighted_negative += weight;
            }
            for (emotion, keywords) in EMOTION_KEYWORDS {
                if keywords.contains(&token.as_str()) {
                    *emotion_counts.entry(*emotion).or_insert(0) += 1;
                }
            }
        }
    }

    signal.emotion_counts = emotion_counts;

    debug!(
        positive = signal.positive_hits,
        negative = signal.negative_hits,
        "sentiment signal extracted"
    );

    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_polarity_hits() {
        let signal = extract_signal("Strong growth and excellent results despite one risk.");
        assert_eq!(signal.positive_hits, 3);
        assert_eq!(signal.negative_hits, 1);
    }

    #[test]
    fn headline_hits_weigh_more() {
        // "growth" in the headline vs "risk" in the body.
        let signal = extract_signal("Growth outlook\n\nSome risk remains in the plan.");
        assert_eq!(signal.positive_hits, 1);
        assert_eq!(signal.negative_hits, 1);
        assert!(signal.weighted_positive > signal.weighted_negative);
    }

    #[test]
    fn executive_summary_section_weighs_more_than_body() {
        let text = "Title line\n\n# Executive Summary\nstrong results\n\n# Detail\nstrong results";
        let signal = extract_signal(text);
        assert_eq!(signal.positive_hits, 2);
        // One hit at weight 2 (summary) + one at weight 1 (body).
        assert!((signal.weighted_positive - (SUMMARY_WEIGHT + BODY_WEIGHT)).abs() < 1e-9);
    }

    #[test]
    fn emotion_keywords_are_tallied() {
        let signal =
            extract_signal("An optimistic, promising plan from a confident team.");
        assert_eq!(signal.emotion_counts[&Emotion::Optimistic], 2);
        assert_eq!(signal.emotion_counts[&Emotion::Confident], 1);
    }

    #[test]
    fn neutral_text_has_no_hits() {
        let signal = extract_signal("The meeting is scheduled for Tuesday.");
        assert_eq!(signal.positive_hits, 0);
        assert_eq!(signal.negative_hits, 0);
        assert!(signal.emotion_counts.is_empty());
    }

    #[test]
    fn identical_text_yields_identical_signal() {
        let text = "Strong growth with some concern about delay.";
        assert_eq!(extract_signal(text), extract_signal(text));
    }
}
