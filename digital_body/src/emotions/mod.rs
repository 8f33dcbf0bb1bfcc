//! Emotion vocabulary - the fixed set of labels the body understands, their
//! physiological delta tables, and a keyword-based classifier over text.

use serde::{Deserialize, Serialize};

use crate::physiology::Channel;

/// The closed emotion vocabulary.
///
/// `Neutral` is the resting label; `Frustration` is recognized by the
/// classifier but carries no physiological delta of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Curiosity,
    Love,
    Serenity,
    Longing,
    Frustration,
    #[default]
    Neutral,
}

impl Emotion {
    /// Physiological deltas applied when this emotion lands on the body.
    ///
    /// Returned deltas are raw (unscaled); callers scale by intensity and
    /// clamp. Emotions outside the table return an empty slice.
    pub fn deltas(&self) -> &'static [(Channel, f32)] {
        match self {
            Emotion::Joy => &[
                (Channel::Warmth, 0.2),
                (Channel::Vibration, 0.3),
                (Channel::Tension, -0.1),
                (Channel::Fluidity, 0.2),
            ],
            Emotion::Sadness => &[
                (Channel::Warmth, -0.2),
                (Channel::Vibration, -0.3),
                (Channel::Tension, 0.2),
                (Channel::Fluidity, -0.3),
            ],
            Emotion::Fear => &[
                (Channel::Tension, 0.3),
                (Channel::Warmth, -0.3),
                (Channel::Vibration, 0.1),
            ],
            Emotion::Anger => &[
                (Channel::Tension, 0.4),
                (Channel::Warmth, 0.1),
                (Channel::Vibration, 0.3),
            ],
            Emotion::Serenity => &[
                (Channel::Tension, -0.3),
                (Channel::Fluidity, 0.3),
                (Channel::Warmth, 0.1),
            ],
            Emotion::Love => &[
                (Channel::Warmth, 0.4),
                (Channel::Vibration, 0.2),
                (Channel::Tension, -0.1),
            ],
            Emotion::Curiosity => &[(Channel::Vibration, 0.2), (Channel::Fluidity, 0.1)],
            Emotion::Longing => &[
                (Channel::Tension, 0.1),
                (Channel::Warmth, -0.1),
                (Channel::Fluidity, -0.1),
            ],
            Emotion::Frustration | Emotion::Neutral => &[],
        }
    }

    /// Keywords that vote for this emotion in [`classify_emotion`].
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Emotion::Joy => &[
                "happy", "smile", "hope", "light", "grateful", "enthusiasm", "relief",
            ],
            Emotion::Sadness => &[
                "sad",
                "empty",
                "loss",
                "crying",
                "tired",
                "melancholy",
                "lonely",
            ],
            Emotion::Anger => &[
                "irritated",
                "furious",
                "frustrated",
                "unfair",
                "anger",
                "explosive",
            ],
            Emotion::Fear => &["scared", "threat", "insecure", "panic", "anxious"],
            Emotion::Curiosity => &[
                "curious",
                "interesting",
                "discover",
                "investigate",
                "understand",
            ],
            Emotion::Love => &[
                "affection",
                "tenderness",
                "care",
                "connection",
                "admiration",
                "fondness",
            ],
            Emotion::Serenity => &["peace", "quiet", "acceptance", "calm", "balance"],
            Emotion::Longing => &["remembrance", "past", "longing", "memory", "recall"],
            Emotion::Frustration => &["failure", "error", "blocked", "injustice", "powerless"],
            Emotion::Neutral => &[],
        }
    }

    /// Human-readable lowercase label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Curiosity => "curiosity",
            Emotion::Love => "love",
            Emotion::Serenity => "serenity",
            Emotion::Longing => "longing",
            Emotion::Frustration => "frustration",
            Emotion::Neutral => "neutral",
        }
    }

    /// All classifiable emotions, in voting order.
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Joy,
            Emotion::Sadness,
            Emotion::Anger,
            Emotion::Fear,
            Emotion::Curiosity,
            Emotion::Love,
            Emotion::Serenity,
            Emotion::Longing,
            Emotion::Frustration,
        ]
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contextual intensifiers that amplify every emotion score.
const INTENSIFIERS: &[&str] = &["very", "deeply", "strongly", "intense", "overwhelming"];

/// Classify the dominant emotion of a text by weighted keyword frequency.
///
/// Each whole-word keyword hit scores 0.5; intensifier presence multiplies
/// all scores by 1.3. Intensity is the dominant score divided by 5, capped
/// at 1.0. Returns `(Neutral, 0.0)` when nothing matches.
pub fn classify_emotion(text: &str) -> (Emotion, f32) {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    let mut scores: Vec<(Emotion, f32)> = Vec::new();
    for emotion in Emotion::all() {
        let hits: usize = emotion
            .keywords()
            .iter()
            .map(|k| words.iter().filter(|w| **w == *k).count())
            .sum();
        if hits > 0 {
            scores.push((*emotion, hits as f32 * 0.5));
        }
    }

    if scores.is_empty() {
        return (Emotion::Neutral, 0.0);
    }

    if INTENSIFIERS.iter().any(|i| words.contains(i)) {
        for (_, score) in scores.iter_mut() {
            *score *= 1.3;
        }
    }

    let (dominant, score) = scores
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((Emotion::Neutral, 0.0));

    (dominant, (score / 5.0).min(1.0))
}
