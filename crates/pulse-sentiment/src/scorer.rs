//! Lexicon-based polarity scorer for short social-media text.
//!
//! Word valences sit on a `[-4.0, 4.0]` scale. Preceding intensifiers nudge a
//! valence away from (or toward) zero, a negation within the three previous
//! words flips and dampens it, and trailing exclamation marks amplify the sum.
//! The sum is normalized into `compound` with `x / sqrt(x² + α)`.

use crate::types::SentimentScore;

/// Maps a unit of text to polarity scores. Implementations must be pure.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}

/// Word valences, lowercase keys.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive
    ("love", 3.2),
    ("loved", 2.9),
    ("loving", 2.9),
    ("like", 2.0),
    ("great", 3.1),
    ("good", 1.9),
    ("awesome", 3.1),
    ("amazing", 2.8),
    ("excellent", 3.2),
    ("best", 3.2),
    ("better", 1.9),
    ("happy", 2.7),
    ("beautiful", 2.9),
    ("nice", 1.8),
    ("cool", 1.3),
    ("fun", 2.3),
    ("wonderful", 2.7),
    ("fantastic", 2.6),
    ("perfect", 2.7),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("glad", 2.0),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("win", 2.8),
    ("winning", 2.4),
    ("helpful", 1.8),
    ("useful", 1.9),
    ("impressive", 2.3),
    ("brilliant", 2.8),
    ("lol", 1.8),
    ("yay", 2.4),
    ("congrats", 2.4),
    ("support", 1.7),
    ("recommend", 1.5),
    ("enjoy", 2.2),
    ("cute", 2.0),
    ("hope", 1.9),
    // Negative
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("worst", -3.1),
    ("worse", -2.1),
    ("hate", -2.7),
    ("hated", -3.2),
    ("horrible", -2.5),
    ("sad", -2.1),
    ("angry", -2.3),
    ("ugly", -2.3),
    ("boring", -1.3),
    ("broken", -2.1),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("problem", -1.7),
    ("wrong", -2.1),
    ("scary", -2.2),
    ("fear", -2.2),
    ("dangerous", -2.1),
    ("stupid", -2.4),
    ("annoying", -1.7),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("useless", -1.8),
    ("poor", -2.1),
    ("crash", -1.7),
    ("scam", -2.5),
    ("fake", -2.1),
    ("worried", -1.2),
    ("sucks", -1.5),
    ("unfortunately", -1.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "without",
];

/// Intensifiers and dampeners applied to the following word.
const BOOSTERS: &[(&str, f64)] = &[
    ("very", 0.293),
    ("really", 0.293),
    ("extremely", 0.293),
    ("so", 0.293),
    ("incredibly", 0.293),
    ("super", 0.293),
    ("totally", 0.293),
    ("slightly", -0.293),
    ("barely", -0.293),
    ("somewhat", -0.293),
];

const NEGATION_SCALAR: f64 = -0.74;
const NEGATION_WINDOW: usize = 3;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Default scorer backed by [`LEXICON`]. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentScore {
        polarity_scores(text)
    }
}

/// Score `text` with the built-in lexicon.
///
/// Returns an all-zero score for empty or whitespace-only text.
#[must_use]
pub fn polarity_scores(text: &str) -> SentimentScore {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return SentimentScore::default();
    }

    let mut valences = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let Some(mut valence) = lookup(LEXICON, word) else {
            valences.push(0.0);
            continue;
        };

        if let Some(boost) = i
            .checked_sub(1)
            .and_then(|prev| lookup(BOOSTERS, &words[prev]))
        {
            valence += boost * valence.signum();
        }

        let window_start = i.saturating_sub(NEGATION_WINDOW);
        if words[window_start..i].iter().any(|w| is_negation(w)) {
            valence *= NEGATION_SCALAR;
        }

        valences.push(valence);
    }

    let mut sum: f64 = valences.iter().sum();
    if sum != 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let bangs = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64;
        sum += (bangs * EXCLAMATION_BOOST).copysign(sum);
    }

    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &v in &valences {
        if v > 0.0 {
            pos_sum += v + 1.0;
        } else if v < 0.0 {
            neg_sum += v - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    let total = pos_sum + neg_sum.abs() + neu_count;

    SentimentScore {
        compound: round_to(compound, 4),
        positive: round_to(pos_sum / total, 3),
        neutral: round_to(neu_count / total, 3),
        negative: round_to(neg_sum.abs() / total, 3),
    }
}

fn lookup(table: &[(&str, f64)], word: &str) -> Option<f64> {
    table
        .iter()
        .find(|(entry, _)| *entry == word)
        .map(|&(_, weight)| weight)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
