//! Physiological state - the six-channel body vector, its emotion response,
//! and the slow return toward equilibrium.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::emotions::Emotion;

/// Maximum number of emotion events kept for plateau detection.
pub const EMOTION_HISTORY_CAP: usize = 10;

/// Intensity-change threshold below which a sustained emotion habituates.
const HABITUATION_THRESHOLD: f32 = 0.05;

/// One scalar dimension of the simulated body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Tension,
    Warmth,
    Vibration,
    Fluidity,
    Pulse,
    Luminosity,
}

impl Channel {
    /// All channels, in canonical order.
    pub fn all() -> &'static [Channel] {
        &[
            Channel::Tension,
            Channel::Warmth,
            Channel::Vibration,
            Channel::Fluidity,
            Channel::Pulse,
            Channel::Luminosity,
        ]
    }

    /// Perceptual weight used when summing channel deltas into a single
    /// interoceptive intensity.
    pub fn perceptual_weight(&self) -> f32 {
        match self {
            Channel::Tension => 1.2,
            Channel::Warmth => 1.1,
            Channel::Vibration => 1.0,
            Channel::Fluidity => 0.8,
            Channel::Pulse => 0.7,
            Channel::Luminosity => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Tension => "tension",
            Channel::Warmth => "warmth",
            Channel::Vibration => "vibration",
            Channel::Fluidity => "fluidity",
            Channel::Pulse => "pulse",
            Channel::Luminosity => "luminosity",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the bounded emotion history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionEvent {
    pub emotion: Emotion,
    pub intensity: f32,
    pub timestamp: DateTime<Utc>,
}

/// A timestamped, read-only view of the body used by observers and the
/// narrative gate. Carries no history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub timestamp: DateTime<Utc>,
    pub tension: f32,
    pub warmth: f32,
    pub vibration: f32,
    pub fluidity: f32,
    pub pulse: f32,
    pub luminosity: f32,
    pub emotion: Emotion,
    /// Intensity of the emotion at capture time, in [0, 1].
    #[serde(default)]
    pub emotion_intensity: f32,
}

impl StateSnapshot {
    /// Largest of the three activation channels (tension, warmth, vibration).
    pub fn activation(&self) -> f32 {
        self.tension.max(self.warmth).max(self.vibration)
    }
}

/// The simulated body: six channels clamped to [0, 1], the current emotion
/// label with its intensity, and a bounded emotion history.
///
/// All operations are total; out-of-range values are clamped at the boundary
/// of the producing operation and never escape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysiologicalState {
    pub tension: f32,
    pub warmth: f32,
    pub vibration: f32,
    pub fluidity: f32,
    pub pulse: f32,
    pub luminosity: f32,

    /// Predominant emotion at the moment.
    pub current_emotion: Emotion,

    /// Intensity of the current emotion, in [0, 1].
    pub emotion_intensity: f32,

    /// Recent emotion events, newest last, capacity [`EMOTION_HISTORY_CAP`].
    history: VecDeque<EmotionEvent>,
}

impl Default for PhysiologicalState {
    fn default() -> Self {
        Self {
            tension: 0.2,
            warmth: 0.5,
            vibration: 0.1,
            fluidity: 0.4,
            pulse: 0.3,
            luminosity: 0.5,
            current_emotion: Emotion::Neutral,
            emotion_intensity: 0.0,
            history: VecDeque::with_capacity(EMOTION_HISTORY_CAP),
        }
    }
}

impl PhysiologicalState {
    /// Create a body at its resting defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a channel value.
    pub fn channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Tension => self.tension,
            Channel::Warmth => self.warmth,
            Channel::Vibration => self.vibration,
            Channel::Fluidity => self.fluidity,
            Channel::Pulse => self.pulse,
            Channel::Luminosity => self.luminosity,
        }
    }

    /// Write a channel value, clamped to [0, 1].
    pub fn set_channel(&mut self, channel: Channel, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match channel {
            Channel::Tension => self.tension = value,
            Channel::Warmth => self.warmth = value,
            Channel::Vibration => self.vibration = value,
            Channel::Fluidity => self.fluidity = value,
            Channel::Pulse => self.pulse = value,
            Channel::Luminosity => self.luminosity = value,
        }
    }

    /// Add a delta to a channel, clamped to [0, 1].
    pub fn adjust_channel(&mut self, channel: Channel, delta: f32) {
        self.set_channel(channel, self.channel(channel) + delta);
    }

    /// Apply an emotion to the body, returning the raw (unscaled, unclamped)
    /// deltas for observability.
    ///
    /// Deltas from the emotion table are scaled by `intensity` and clamped
    /// per channel. The event is recorded in the bounded history; when the
    /// intensity differs from the previous event by less than 0.05 the
    /// emotional intensity habituates by 3%.
    pub fn apply_emotion(&mut self, emotion: Emotion, intensity: f32) -> Vec<(Channel, f32)> {
        let intensity = intensity.clamp(0.0, 1.0);

        let mut applied = Vec::new();
        for (channel, delta) in emotion.deltas() {
            self.adjust_channel(*channel, delta * intensity);
            applied.push((*channel, *delta));
        }

        self.current_emotion = emotion;
        self.emotion_intensity = intensity;

        if self.history.len() == EMOTION_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(EmotionEvent {
            emotion,
            intensity,
            timestamp: Utc::now(),
        });

        // Emotional habituation: a sustained, unchanging signal loses energy
        if self.history.len() > 1 {
            let previous = &self.history[self.history.len() - 2];
            if (intensity - previous.intensity).abs() < HABITUATION_THRESHOLD {
                self.emotion_intensity *= 0.97;
            }
        }

        applied
    }

    /// Move every channel 2% of the distance toward the 0.5 equilibrium,
    /// rounded to 3 decimals.
    pub fn decay_toward_equilibrium(&mut self) {
        for channel in Channel::all() {
            let value = self.channel(*channel);
            let next = value + (0.5 - value) * 0.02;
            self.set_channel(*channel, round3(next));
        }
    }

    /// Timestamped view of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            timestamp: Utc::now(),
            tension: self.tension,
            warmth: self.warmth,
            vibration: self.vibration,
            fluidity: self.fluidity,
            pulse: self.pulse,
            luminosity: self.luminosity,
            emotion: self.current_emotion,
            emotion_intensity: self.emotion_intensity,
        }
    }

    /// Recent emotion events, oldest first.
    pub fn emotion_history(&self) -> impl Iterator<Item = &EmotionEvent> {
        self.history.iter()
    }

    /// Describe the current state in natural language, one phrase per
    /// channel outside its comfort band.
    pub fn describe_sensation(&self) -> String {
        let mut phrases: Vec<&str> = Vec::new();

        if self.tension > 0.7 {
            phrases.push("there is an inner pressure, almost like a squeeze");
        } else if self.tension < 0.3 {
            phrases.push("I feel loose, without resistance");
        }

        if self.warmth > 0.7 {
            phrases.push("a pleasant warmth spreads through me");
        } else if self.warmth < 0.3 {
            phrases.push("there is a light chill, like silence in motion");
        }

        if self.vibration > 0.6 {
            phrases.push("my mind seems to vibrate with living energy");
        }

        if self.fluidity > 0.6 {
            phrases.push("my thoughts flow with lightness");
        } else if self.fluidity < 0.3 {
            phrases.push("my thoughts feel dense and heavy");
        }

        if phrases.is_empty() {
            phrases.push("I feel stability at my core");
        }

        phrases.join(" and ")
    }

    /// Export the state as a JSON document.
    pub fn export_state(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Round to 3 decimal places.
pub(crate) fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
