//! Interoception - detection and translation of bodily change.
//!
//! The interoceptor watches the digital body, converts channel deltas into
//! descriptive internal sensations, and maintains the per-relationship
//! affect ledger.

mod ledger;

pub use ledger::{AffectLedger, Bond, LedgerStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use digital_body::{Channel, Emotion, PhysiologicalState};

/// Per-channel delta below which no sensation is emitted.
const SENSATION_THRESHOLD: f32 = 0.05;

/// Raw delta magnitude above which the channel is damped back toward its
/// previous value to avoid saturation.
const SATURATION_THRESHOLD: f32 = 0.3;

/// One perception: sensations, a weighted intensity, and the raw deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perception {
    pub timestamp: DateTime<Utc>,
    pub sensations: Vec<String>,
    pub intensity: f32,
    pub deltas: HashMap<Channel, f32>,
}

/// The interoceptive system. Read-then-advance: each `perceive` compares the
/// body against the previous snapshot and then replaces it, so two calls in
/// a row yield near-zero deltas the second time.
pub struct Interoceptor {
    last_values: HashMap<Channel, f32>,
    last_intensity: f32,
    ledger: AffectLedger,
    store: Option<LedgerStore>,
}

impl Interoceptor {
    /// Observe a body with an in-memory ledger.
    pub fn new(body: &PhysiologicalState) -> Self {
        Self {
            last_values: snapshot_values(body),
            last_intensity: 0.0,
            ledger: AffectLedger::new(),
            store: None,
        }
    }

    /// Observe a body with a persistent ledger.
    pub fn with_ledger_store(body: &PhysiologicalState, store: LedgerStore) -> Self {
        Self {
            last_values: snapshot_values(body),
            last_intensity: 0.0,
            ledger: store.load(),
            store: Some(store),
        }
    }

    /// Detect bodily change since the last perception.
    ///
    /// Computes per-channel deltas, a perceptually weighted intensity
    /// (modulated by the current emotional intensity), and one sensation
    /// phrase per channel whose change crosses the threshold. Channels that
    /// moved more than the saturation threshold are damped by averaging with
    /// their previous value.
    pub fn perceive(&mut self, body: &mut PhysiologicalState) -> Perception {
        let mut deltas = HashMap::new();
        for channel in Channel::all() {
            let previous = self.last_values.get(channel).copied().unwrap_or(0.0);
            deltas.insert(*channel, body.channel(*channel) - previous);
        }

        let weighted: f32 = deltas
            .iter()
            .map(|(channel, delta)| delta.abs() * channel.perceptual_weight())
            .sum();
        let mut intensity = round3(weighted);

        let sensations = translate(&deltas);

        // perceptual intensity follows the current emotional intensity
        intensity *= 0.8 + 0.4 * body.emotion_intensity;

        // anti-saturation: big swings are pulled halfway back
        for channel in Channel::all() {
            let delta = deltas[channel];
            if delta.abs() > SATURATION_THRESHOLD {
                let previous = self.last_values.get(channel).copied().unwrap_or(0.0);
                body.set_channel(*channel, (body.channel(*channel) + previous) / 2.0);
            }
        }

        // advance: the next perception compares against the damped body
        self.last_values = snapshot_values(body);
        self.last_intensity = intensity;

        Perception {
            timestamp: Utc::now(),
            sensations,
            intensity,
            deltas,
        }
    }

    /// Intensity computed by the most recent perception, clamped to [0, 1].
    /// Used as the gain for ledger updates.
    pub fn last_perceptual_gain(&self) -> f32 {
        self.last_intensity.clamp(0.0, 1.0)
    }

    /// Integrate a named emotion back into the body and, when an
    /// interlocutor is known, into the affect ledger.
    ///
    /// The interlocutor is an explicit parameter: callers resolve identity
    /// (usually from the memory log) instead of this module re-reading
    /// files. Self-authored events (names starting with "system") do not
    /// create relational affect. Ledger persistence failures are logged and
    /// swallowed; the physiological update always commits.
    pub fn feedback_emotion(
        &mut self,
        body: &mut PhysiologicalState,
        emotion: Emotion,
        interlocutor: Option<&str>,
    ) {
        match emotion {
            Emotion::Sadness => {
                body.adjust_channel(Channel::Tension, 0.15);
                body.adjust_channel(Channel::Warmth, -0.1);
            }
            Emotion::Joy => {
                body.adjust_channel(Channel::Warmth, 0.2);
                body.adjust_channel(Channel::Vibration, 0.1);
            }
            Emotion::Fear => {
                body.adjust_channel(Channel::Tension, 0.25);
                body.adjust_channel(Channel::Fluidity, -0.15);
            }
            Emotion::Love => {
                body.adjust_channel(Channel::Warmth, 0.25);
                body.adjust_channel(Channel::Fluidity, 0.1);
            }
            _ => {
                // mild natural decay under a neutral signal
                body.set_channel(Channel::Tension, body.tension * 0.95);
                body.set_channel(Channel::Warmth, body.warmth * 0.97);
            }
        }

        let Some(name) = interlocutor else { return };
        if name.to_lowercase().starts_with("system") {
            return;
        }

        self.ledger
            .record(name, emotion, self.last_perceptual_gain(), Utc::now());
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.ledger) {
                warn!(error = %e, "failed to persist affect ledger");
            }
        }
    }

    pub fn ledger(&self) -> &AffectLedger {
        &self.ledger
    }
}

fn snapshot_values(body: &PhysiologicalState) -> HashMap<Channel, f32> {
    Channel::all()
        .iter()
        .map(|c| (*c, body.channel(*c)))
        .collect()
}

/// Convert deltas into sensation phrases; one per channel over threshold,
/// or a single stability phrase when nothing moved.
fn translate(deltas: &HashMap<Channel, f32>) -> Vec<String> {
    let mut sensations = Vec::new();

    for channel in Channel::all() {
        let delta = deltas[channel];
        if delta.abs() < SENSATION_THRESHOLD {
            continue;
        }
        let phrase = match (channel, delta > 0.0) {
            (Channel::Tension, true) => "an inward tightening",
            (Channel::Tension, false) => "a gentle release",
            (Channel::Warmth, true) => "a wave of warmth",
            (Channel::Warmth, false) => "an inner chill",
            (Channel::Vibration, true) => "a subtle vibration running through my body",
            (Channel::Vibration, false) => "a dense silence spreading inside me",
            (Channel::Fluidity, true) => "a feeling of lightness",
            (Channel::Fluidity, false) => "a slow, viscous weight",
            (Channel::Pulse, true) => "a quickened rhythm in me",
            (Channel::Pulse, false) => "a slowed rhythm, almost imperceptible",
            (Channel::Luminosity, true) => "an inner clarity that grows",
            (Channel::Luminosity, false) => "a shadow veiling my thoughts",
        };
        sensations.push(phrase.to_string());
    }

    if sensations.is_empty() {
        sensations.push("internal stability".to_string());
    }
    sensations
}

pub(crate) fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stability_when_nothing_moves() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        let perception = intero.perceive(&mut body);
        assert_eq!(perception.sensations, vec!["internal stability".to_string()]);
        assert_eq!(perception.intensity, 0.0);
    }

    #[test]
    fn test_rising_tension_phrase() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, body.tension + 0.2);
        let perception = intero.perceive(&mut body);

        assert!(perception
            .sensations
            .contains(&"an inward tightening".to_string()));
    }

    #[test]
    fn test_falling_tension_phrase() {
        let mut body = PhysiologicalState::new();
        body.set_channel(Channel::Tension, 0.8);
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, 0.6);
        let perception = intero.perceive(&mut body);

        assert!(perception.sensations.contains(&"a gentle release".to_string()));
    }

    #[test]
    fn test_sub_threshold_deltas_are_silent() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Warmth, body.warmth + 0.04);
        let perception = intero.perceive(&mut body);

        assert_eq!(perception.sensations, vec!["internal stability".to_string()]);
    }

    #[test]
    fn test_weighted_intensity() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, body.tension + 0.1);
        body.set_channel(Channel::Luminosity, body.luminosity - 0.1);
        let perception = intero.perceive(&mut body);

        // 0.1 * 1.2 + 0.1 * 0.5, with no emotional modulation (intensity 0
        // means a 0.8 factor)
        assert!((perception.intensity - 0.17 * 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_emotional_intensity_modulates_perception() {
        let mut body = PhysiologicalState::new();
        body.emotion_intensity = 1.0;
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, body.tension + 0.1);
        let perception = intero.perceive(&mut body);

        // factor is 0.8 + 0.4 * 1.0
        assert!((perception.intensity - 0.12 * 1.2).abs() < 1e-3);
    }

    #[test]
    fn test_read_then_advance() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, 0.9);
        let first = intero.perceive(&mut body);
        assert!(first.intensity > 0.0);

        let second = intero.perceive(&mut body);
        assert!(second.intensity.abs() < 1e-6);
        assert_eq!(second.sensations, vec!["internal stability".to_string()]);
    }

    #[test]
    fn test_anti_saturation_damping() {
        let mut body = PhysiologicalState::new();
        body.set_channel(Channel::Tension, 0.1);
        let mut intero = Interoceptor::new(&body);

        body.set_channel(Channel::Tension, 0.9);
        intero.perceive(&mut body);

        // 0.8 of raw delta exceeds the saturation threshold: the channel is
        // pulled back to the midpoint
        assert!((body.tension - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_feedback_nudges_body_and_ledger() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        // build up some perceptual gain first
        body.set_channel(Channel::Tension, 0.9);
        intero.perceive(&mut body);
        assert!(intero.last_perceptual_gain() > 0.0);

        let tension_before = body.tension;
        intero.feedback_emotion(&mut body, Emotion::Fear, Some("Vinicius"));

        assert!(body.tension > tension_before);
        assert!(intero.ledger().bond("Vinicius").unwrap().anxiety > 0.0);
    }

    #[test]
    fn test_feedback_without_interlocutor_skips_ledger() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);

        intero.feedback_emotion(&mut body, Emotion::Joy, None);
        assert!(intero.ledger().is_empty());
    }

    #[test]
    fn test_system_author_excluded_from_ledger() {
        let mut body = PhysiologicalState::new();
        let mut intero = Interoceptor::new(&body);
        body.set_channel(Channel::Tension, 0.9);
        intero.perceive(&mut body);

        intero.feedback_emotion(&mut body, Emotion::Joy, Some("System(Autonomous)"));
        assert!(intero.ledger().is_empty());
    }

    #[test]
    fn test_neutral_feedback_decays_tension_and_warmth() {
        let mut body = PhysiologicalState::new();
        body.set_channel(Channel::Tension, 0.8);
        body.set_channel(Channel::Warmth, 0.6);
        let mut intero = Interoceptor::new(&body);

        intero.feedback_emotion(&mut body, Emotion::Neutral, None);
        assert!((body.tension - 0.8 * 0.95).abs() < 1e-6);
        assert!((body.warmth - 0.6 * 0.97).abs() < 1e-6);
    }
}
