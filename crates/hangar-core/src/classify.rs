//! Deterministic intent classifier.
//!
//! Weighted keyword/regex scoring over lowercased input. The confidence value
//! is a heuristic normalization, not a calibrated probability: the normalizer
//! is chosen so that a typical strong-signal message saturates near 1.0. The
//! pattern set, weights, and thresholds are a tuned unit and are exposed as
//! data so they stay independently testable; do not "improve" them silently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Raw score divisor for the summary classifier.
pub const SCORE_NORMALIZER: f64 = 6.0;
/// Above this confidence the message is classified as a summary request.
pub const SUMMARY_THRESHOLD: f64 = 0.25;
/// At or above this confidence the orchestrator answers locally without
/// touching the upstream model.
pub const SHORT_CIRCUIT_CONFIDENCE: f64 = 0.7;

/// Raw score divisor for the greeting classifier (alternate provider route).
pub const GREETING_NORMALIZER: f64 = 3.0;
/// Above this confidence the message is classified as a greeting.
pub const GREETING_THRESHOLD: f64 = 0.5;

/// Flight-identifier-shaped token. A mention reduces ambiguity but still
/// contributes weight 1 to the summary score.
pub const FLIGHT_ID_PATTERN: &str = r"a400-\d{1,2}";

/// One scored signal: a regex matched at most once against the lowercased
/// input, contributing its weight additively.
pub struct WeightedPattern {
    pub pattern: &'static str,
    pub weight: u32,
}

/// Summary-intent signal table. Strong signals first, moderate after.
pub const SUMMARY_SIGNALS: &[WeightedPattern] = &[
    WeightedPattern { pattern: r"\bhow many\b", weight: 3 },
    WeightedPattern { pattern: r"\bsquadron summary\b|\bsquadron\b", weight: 3 },
    WeightedPattern { pattern: r"\boverall health\b|\boverall status\b", weight: 2 },
    WeightedPattern { pattern: r"\bdeployable\b|\bdeployable state\b|\bnon-deployable\b", weight: 2 },
    WeightedPattern { pattern: r"\btotal aircraft\b|\btotal flights\b", weight: 2 },
    WeightedPattern { pattern: r"\bsummary\b", weight: 1 },
    WeightedPattern { pattern: r"\bhealth\b", weight: 1 },
];

static SUMMARY_REGEXES: Lazy<Vec<(Regex, u32)>> = Lazy::new(|| {
    SUMMARY_SIGNALS
        .iter()
        .map(|p| (Regex::new(p.pattern).expect("summary signal pattern"), p.weight))
        .collect()
});

static FLIGHT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(FLIGHT_ID_PATTERN).expect("flight id pattern"));

static GREETING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(hello|hi|hey)\b").expect("greeting pattern"));

/// Closed intent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Summary,
    Greeting,
    Other,
}

/// Ephemeral classification result, also written to the audit log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub intent: Intent,
    /// Clamped to [0, 1]. Heuristic, not a probability.
    pub confidence: f64,
    pub flight_id_mention: bool,
}

/// Scores the message against the summary signal table. Identical input
/// always yields identical output.
pub fn classify(text: &str) -> Classification {
    let t = text.to_lowercase();
    let mut score: u32 = SUMMARY_REGEXES
        .iter()
        .filter(|(re, _)| re.is_match(&t))
        .map(|(_, w)| *w)
        .sum();
    let flight_id_mention = FLIGHT_ID_RE.is_match(&t);
    if flight_id_mention {
        score += 1;
    }
    let confidence = (f64::from(score) / SCORE_NORMALIZER).min(1.0);
    let intent = if confidence > SUMMARY_THRESHOLD { Intent::Summary } else { Intent::Other };
    Classification { intent, confidence, flight_id_mention }
}

/// Greeting classifier for the alternate provider route: a single strong
/// signal with its own normalizer and cutoff.
pub fn classify_greeting(text: &str) -> Classification {
    let t = text.to_lowercase();
    let score: u32 = if GREETING_RE.is_match(&t) { 3 } else { 0 };
    let confidence = (f64::from(score) / GREETING_NORMALIZER).min(1.0);
    let intent = if confidence > GREETING_THRESHOLD { Intent::Greeting } else { Intent::Other };
    Classification {
        intent,
        confidence,
        flight_id_mention: FLIGHT_ID_RE.is_match(&t),
    }
}
