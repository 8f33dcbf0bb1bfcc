//! Metacognition - lightweight self-assessment of generated text.
//!
//! Scores an utterance for uncertainty and coherence with cheap text
//! heuristics, picks a corrective regulation action, and applies its small
//! physiological delta. It only observes and signals: it never touches
//! friction load, damage, or task complexity - any systemic cost belongs to
//! the caller.

use serde::{Deserialize, Serialize};

use digital_body::{Channel, Emotion, PhysiologicalState};

/// Hedging vocabulary, matched as case-insensitive substrings.
const HEDGES: &[&str] = &[
    "maybe",
    "i think",
    "not sure",
    "uncertain",
    "perhaps",
    "i guess",
    "i suppose",
    "possibly",
    "hypothesis",
];

/// Contrastive conjunctions.
const CONTRASTS: &[&str] = &["but", "however", "yet", "though"];

/// Rigid-assertion markers.
const ABSOLUTES: &[&str] = &["always", "never", "certainly", "no doubt"];

/// Reassurance phrases that clash with a stated fear.
const REASSURANCES: &[&str] = &["everything's fine", "it's okay", "i'm fine", "all good"];

/// Corrective regulation picked from the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationAction {
    Insecurity,
    MildFear,
    Relief,
    Reward,
}

impl RegulationAction {
    /// The small fixed physiological delta of this action, clamped by the
    /// body.
    pub fn apply(&self, body: &mut PhysiologicalState) {
        match self {
            RegulationAction::Insecurity => {
                body.adjust_channel(Channel::Tension, 0.05);
            }
            RegulationAction::MildFear => {
                body.adjust_channel(Channel::Tension, 0.10);
                body.adjust_channel(Channel::Fluidity, -0.05);
            }
            RegulationAction::Relief => {
                body.adjust_channel(Channel::Tension, -0.05);
                body.adjust_channel(Channel::Fluidity, 0.07);
            }
            RegulationAction::Reward => {
                body.adjust_channel(Channel::Vibration, 0.08);
                body.adjust_channel(Channel::Pulse, 0.05);
            }
        }
    }
}

/// One ephemeral metacognitive assessment. May be appended to the memory
/// log; nothing in the core reads it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCognitionEvent {
    pub uncertainty: f32,
    pub coherence: f32,
    pub action: RegulationAction,
    pub reflection: String,
    pub echoed_emotion: Emotion,
    pub echoed_intensity: f32,
}

/// The metacognitive loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaCognitor;

impl MetaCognitor {
    pub fn new() -> Self {
        Self
    }

    /// Estimate uncertainty of a text in [0, 1] from hedges, question
    /// density, contrast density, rigid assertions, and long unpunctuated
    /// monologue. Empty text is maximally uncertain by convention (0.7).
    pub fn uncertainty_from_text(&self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.7;
        }
        let lower = text.to_lowercase();
        let mut u = 0.0;

        u += HEDGES.iter().filter(|h| lower.contains(**h)).count() as f32 * 0.12;
        u += (text.matches('?').count() as f32 * 0.08).min(0.24);
        u += (CONTRASTS.iter().filter(|c| lower.contains(**c)).count() as f32 * 0.10).min(0.20);

        if ABSOLUTES.iter().any(|a| lower.contains(a)) {
            u += 0.10;
        }
        if text.len() > 300 && text.matches('.').count() < 2 {
            u += 0.08;
        }

        // minimum floor so uncertainty never reads as a flat zero
        u.max(0.12).clamp(0.0, 1.0)
    }

    /// Score how coherent the text is with its stated emotion, in [0, 1].
    pub fn coherence_score(&self, emotion: Emotion, intensity: f32, text: &str) -> f32 {
        let lower = text.to_lowercase();
        let mut penalty = 0.0;

        if matches!(emotion, Emotion::Serenity | Emotion::Neutral) {
            let negations = lower.matches("not").count() as f32 * 0.05;
            let contrasts = lower.matches("but").count() as f32 * 0.06;
            penalty += (negations + contrasts).min(0.5);
        }
        if emotion == Emotion::Fear && REASSURANCES.iter().any(|r| lower.contains(r)) {
            penalty += 0.2;
        }

        let mut base = 0.8 - penalty;
        // stated extremes of intensity tend to read as less coherent
        base -= ((intensity - 0.5).abs() * 0.3).min(0.3);
        base.clamp(0.0, 1.0)
    }

    /// Assess a generated utterance, apply the corrective regulation to the
    /// body, and return the event.
    pub fn process(
        &self,
        body: &mut PhysiologicalState,
        text: &str,
        emotion: Emotion,
        intensity: f32,
    ) -> MetaCognitionEvent {
        let uncertainty = self.uncertainty_from_text(text);
        let coherence = self.coherence_score(emotion, intensity, text);

        let action = if uncertainty >= 0.55 || coherence <= 0.4 {
            if uncertainty < 0.8 {
                RegulationAction::Insecurity
            } else {
                RegulationAction::MildFear
            }
        } else if coherence >= 0.75 && uncertainty <= 0.25 {
            RegulationAction::Reward
        } else {
            RegulationAction::Relief
        };

        let reflection = match action {
            RegulationAction::Insecurity | RegulationAction::MildFear => format!(
                "I feel {} reviewing what I just said. My confidence sits at {:.2} and the coherence I perceive at {:.2}. I will adjust my tone and watch the signals more closely.",
                if action == RegulationAction::Insecurity {
                    "insecurity"
                } else {
                    "a light fear"
                },
                1.0 - uncertainty,
                coherence,
            ),
            RegulationAction::Reward => format!(
                "I notice good coherence ({coherence:.2}) and low uncertainty ({uncertainty:.2}). That gives me a small sense of rightness and momentum to continue.",
            ),
            RegulationAction::Relief => format!(
                "I feel a light relief. Uncertainty {uncertainty:.2}, coherence {coherence:.2}. I can go deeper calmly if it helps.",
            ),
        };

        action.apply(body);

        MetaCognitionEvent {
            uncertainty,
            coherence,
            action,
            reflection,
            echoed_emotion: emotion,
            echoed_intensity: intensity,
        }
    }
}
