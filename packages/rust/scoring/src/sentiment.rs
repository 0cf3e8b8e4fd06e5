//! Sentiment scoring.

use docintel_shared::{Emotion, Score, SentimentAssessment, SentimentSignal};

use crate::confidence::confidence;

/// At or above 60 the label is "Positive", at or below 40 "Negative",
/// "Neutral" in between.
const POSITIVE_THRESHOLD: u32 = 60;
const NEGATIVE_THRESHOLD: u32 = 40;

/// Map a polarity signal to a 0–100 sentiment score with confidence.
///
/// `fact_coverage` is the entity-extraction coverage backing the score
/// (use [`crate::FALLBACK_COVERAGE`] when entity extraction was unavailable).
pub fn score_sentiment(signal: &SentimentSignal, fact_coverage: f64) -> SentimentAssessment {
    let total = signal.weighted_positive + signal.weighted_negative;

    // Polarity in [-1, 1]; 0 when the document carries no polarity evidence.
    let polarity = if total > 0.0 {
        (signal.weighted_positive - signal.weighted_negative) / total
    } else {
        0.0
    };

    let value = (50.0 + 50.0 * polarity).round().clamp(0.0, 100.0) as u32;
    let label = label_for(value);

    // Agreement: a lopsided signal agrees with itself; an even split is the
    // highest-variance case and bottoms out at 0.5.
    let agreement = if total > 0.0 {
        0.5 + 0.5 * (signal.weighted_positive - signal.weighted_negative).abs() / total
    } else {
        0.5
    };

    SentimentAssessment {
        score: Score::new(value, 100, confidence(fact_coverage, agreement), label),
        emotion: dominant_emotion(signal, label),
    }
}

fn label_for(value: u32) -> &'static str {
    if value >= POSITIVE_THRESHOLD {
        "Positive"
    } else if value <= NEGATIVE_THRESHOLD {
        "Negative"
    } else {
        "Neutral"
    }
}

/// Pick the dominant emotion: highest keyword count, ties broken by fixed
/// vocabulary order. Without keyword evidence, fall back to the label's
/// natural emotion.
fn dominant_emotion(signal: &SentimentSignal, label: &str) -> Emotion {
    let mut best: Option<(Emotion, u32)> = None;
    for emotion in Emotion::ALL {
        let count = signal.emotion_counts.get(&emotion).copied().unwrap_or(0);
        if count > 0 && best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((emotion, count));
        }
    }

    match best {
        Some((emotion, _)) => emotion,
        None => match label {
            "Positive" => Emotion::Optimistic,
            "Negative" => Emotion::Cautious,
            _ => Emotion::Neutral,
        },
    }
}
