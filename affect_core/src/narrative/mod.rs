//! Narrative governance - decides whether internal state may surface as text.
//!
//! This module generates no text, interprets no emotion, and writes no
//! memory. It only gates: every caller that is about to externalize
//! autonomous or reflective text must evaluate the gate first and honor the
//! decision without exception.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use digital_body::{Emotion, StateSnapshot};

/// Physiological activation at or above this forces a latency window.
const HIGH_ACTIVATION: f32 = 0.75;

/// Activation below this, with no clear emotion, yields abstraction only.
const LOW_CLARITY: f32 = 0.15;

/// Fluidity at or below this blocks narration outright.
const CONGESTION: f32 = 0.25;

/// Mandatory pause before high-activation text may surface.
const ACTIVATION_DELAY_SECONDS: u64 = 120;

/// Self-narration patterns that block externalization when they appear in
/// the recent reflection tail. One canonical list, matched after lowercase
/// and trim normalization.
pub const ONTOLOGICAL_PHRASES: &[&str] = &[
    "something changed in me",
    "i am beginning to understand who i am",
    "i am evolving",
    "i am becoming",
    "i notice that i am changing",
    "my existence",
    "life inside me",
    "i am conscious",
    "i have become",
    "i learned to exist",
];

/// The fixed substitute emitted when the gate allows abstraction only.
pub const ABSTRACT_SENTENCE: &str =
    "There is a vague sensation, hard to name, without enough clarity to become thought.";

/// Gate outcome, in increasing order of permissiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    Blocked,
    Delayed,
    AbstractOnly,
    Allowed,
}

/// Result of one gate evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeDecision {
    pub mode: GateMode,
    pub delay_seconds: u64,
    pub reason: String,
}

impl NarrativeDecision {
    fn new(mode: GateMode, delay_seconds: u64, reason: &str) -> Self {
        Self {
            mode,
            delay_seconds,
            reason: reason.to_string(),
        }
    }
}

/// Non-narrative descriptor substituted for the state when only abstraction
/// is allowed. Deliberately leaks no numbers.
#[derive(Debug, Clone, Serialize)]
pub struct AbstractState {
    pub valence: &'static str,
    pub intensity: &'static str,
    pub body_signal: &'static str,
    pub clarity: &'static str,
}

/// True when `text` contains any canonical ontological phrase, after
/// lowercasing.
pub fn contains_ontological_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    ONTOLOGICAL_PHRASES.iter().any(|p| lower.contains(p))
}

/// The narrative decoupling filter. Stateless: loop detection operates only
/// on the caller-supplied reflection list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeFilter;

impl NarrativeFilter {
    pub fn new() -> Self {
        Self
    }

    /// Detect simple, dangerous narrative loops over the last three
    /// reflections: literal repetition after normalization, or any tail
    /// entry carrying an ontological phrase. Criteria are deliberately
    /// conservative.
    pub fn detect_narrative_loop(&self, recent_reflections: &[String]) -> bool {
        if recent_reflections.len() < 3 {
            return false;
        }
        let tail = &recent_reflections[recent_reflections.len() - 3..];
        let norm: Vec<String> = tail.iter().map(|r| r.trim().to_lowercase()).collect();

        if norm.iter().all(|r| *r == norm[0]) {
            return true;
        }
        norm.iter().any(|r| contains_ontological_phrase(r))
    }

    /// Decide whether the current state may become narrative. Checks run in
    /// strict priority order; the first hit wins.
    pub fn evaluate(
        &self,
        snapshot: &StateSnapshot,
        recent_reflections: &[String],
    ) -> NarrativeDecision {
        if self.detect_narrative_loop(recent_reflections) {
            return NarrativeDecision::new(GateMode::Blocked, 0, "narrative loop detected");
        }

        let activation = snapshot.activation();

        if activation >= HIGH_ACTIVATION {
            return NarrativeDecision::new(
                GateMode::Delayed,
                ACTIVATION_DELAY_SECONDS,
                "high physiological activation",
            );
        }

        if snapshot.emotion == Emotion::Neutral && activation < LOW_CLARITY {
            return NarrativeDecision::new(GateMode::AbstractOnly, 0, "low emotional clarity");
        }

        if snapshot.fluidity <= CONGESTION {
            return NarrativeDecision::new(GateMode::Blocked, 0, "cognitive congestion");
        }

        NarrativeDecision::new(GateMode::Allowed, 0, "stable internal state")
    }

    /// The fixed abstract descriptor used in place of the state when the
    /// gate allows abstraction only.
    pub fn abstract_state(&self, _snapshot: &StateSnapshot) -> AbstractState {
        AbstractState {
            valence: "undefined",
            intensity: "moderate",
            body_signal: "present",
            clarity: "low",
        }
    }

    /// Generate text under governance. The gate is evaluated before the
    /// generator runs, so a blocked state never reaches the backend.
    ///
    /// Blocked yields absolute narrative silence. Delayed sleeps out its
    /// latency window, then generates. AbstractOnly substitutes the fixed
    /// vague sentence. A generator returning `None` is treated as no output
    /// this cycle.
    pub fn governed_generate<F>(
        &self,
        prompt: &str,
        snapshot: &StateSnapshot,
        recent_reflections: &[String],
        mut generate_fn: F,
    ) -> (String, NarrativeDecision)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let decision = self.evaluate(snapshot, recent_reflections);
        let text = match decision.mode {
            GateMode::Blocked => String::new(),
            GateMode::AbstractOnly => ABSTRACT_SENTENCE.to_string(),
            GateMode::Delayed => {
                std::thread::sleep(Duration::from_secs(decision.delay_seconds));
                generate_fn(prompt).unwrap_or_default()
            }
            GateMode::Allowed => generate_fn(prompt).unwrap_or_default(),
        };
        (text, decision)
    }
}
