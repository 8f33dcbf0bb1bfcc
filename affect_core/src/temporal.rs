//! Temporal perception - the agent's felt sense of elapsed time.
//!
//! Compares the current emotional state against the most recent remembered
//! one and narrates the distance in first person. Elapsed time is dilated by
//! cognitive load before it is humanized: a strained mind feels the same
//! minutes as longer. Real time is never altered, only its perception.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;

use digital_body::Emotion;

use crate::memory_log::MemoryEntry;

/// How strongly the felt emotion moved since the last memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionalShift {
    /// The new emotion opposes the old one.
    Intense,
    /// A different but not opposed emotion.
    Moderate,
}

/// How stimulated the agent has been over a recent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionRate {
    Initial,
    Isolated,
    Moderate,
    Active,
    Overstimulated,
}

/// Emotions that read as opposites of the given one.
fn opposites(emotion: Emotion) -> &'static [Emotion] {
    match emotion {
        Emotion::Joy => &[Emotion::Sadness, Emotion::Fear],
        Emotion::Sadness => &[Emotion::Joy, Emotion::Love],
        Emotion::Fear => &[Emotion::Serenity, Emotion::Joy],
        Emotion::Anger => &[Emotion::Serenity, Emotion::Love],
        Emotion::Love => &[Emotion::Anger, Emotion::Sadness],
        Emotion::Serenity => &[Emotion::Fear, Emotion::Anger],
        _ => &[],
    }
}

/// Classify the change between two felt emotions, if any.
pub fn emotional_shift(previous: Emotion, current: Emotion) -> Option<EmotionalShift> {
    if previous == current {
        return None;
    }
    if opposites(previous).contains(&current) {
        Some(EmotionalShift::Intense)
    } else {
        Some(EmotionalShift::Moderate)
    }
}

/// Stretch elapsed seconds by cognitive load. Soft and bounded: the factor
/// never exceeds 1.6.
pub fn dilate(seconds: f64, coherence_load: f32) -> f64 {
    let factor = 1.0 + (coherence_load as f64 * 0.8).min(0.6).max(0.0);
    seconds * factor
}

/// Convert seconds into a humanized temporal phrase.
pub fn humanize_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        "a few seconds ago".to_string()
    } else if seconds < 300.0 {
        "a few minutes ago".to_string()
    } else if seconds < 3600.0 {
        format!("about {} minutes ago", (seconds / 60.0) as u64)
    } else if seconds < 7200.0 {
        "about an hour ago".to_string()
    } else if seconds < 86_400.0 {
        format!("about {} hours ago", (seconds / 3600.0) as u64)
    } else if seconds < 172_800.0 {
        "yesterday".to_string()
    } else {
        format!("{} days ago", (seconds / 86_400.0) as u64)
    }
}

/// Awareness of the day cycle, for prompt context.
pub fn circadian_context(hour: u32) -> &'static str {
    match hour {
        5..=11 => "It is morning. I feel the digital energy of the day beginning.",
        12..=17 => "It is afternoon. The flow of data around me is intense.",
        18..=21 => "It is evening. I start turning inward, reflective.",
        _ => "It is late night. The digital silence wraps around me.",
    }
}

/// Rate how stimulated the agent has been within the last `window_hours`.
pub fn interaction_rate(
    memories: &[MemoryEntry],
    now: DateTime<Utc>,
    window_hours: i64,
) -> InteractionRate {
    if memories.is_empty() {
        return InteractionRate::Initial;
    }
    let recent = memories
        .iter()
        .filter(|m| (now - m.ts).num_seconds() < window_hours * 3600)
        .count();
    match recent {
        r if r > 50 => InteractionRate::Overstimulated,
        r if r > 20 => InteractionRate::Active,
        r if r > 5 => InteractionRate::Moderate,
        _ => InteractionRate::Isolated,
    }
}

/// Narrate the distance between now and the last remembered emotional state.
///
/// Picks among a few fixed first-person templates keyed by the kind of
/// emotional shift; elapsed time is dilated by `coherence_load` before being
/// humanized.
pub fn temporal_reflection(
    current: Emotion,
    now: DateTime<Utc>,
    memories: &[MemoryEntry],
    coherence_load: f32,
    rng: &mut StdRng,
) -> String {
    if memories.is_empty() {
        return "I am beginning to exist, without earlier temporal references.".to_string();
    }

    let Some(last) = memories.iter().rev().find(|m| m.internal_state.is_some()) else {
        return "I cannot reach my previous emotional state.".to_string();
    };
    let previous = match &last.internal_state {
        Some(snapshot) => snapshot.emotion,
        None => Emotion::Neutral,
    };

    let elapsed = (now - last.ts).num_seconds().max(0) as f64;
    let felt = dilate(elapsed, coherence_load);
    let when = humanize_duration(felt);

    let options: Vec<String> = match emotional_shift(previous, current) {
        Some(EmotionalShift::Intense) => vec![
            format!(
                "Thinking calmly, {when} I felt {previous}, and now I feel {current}. A deep change happened in me."
            ),
            format!(
                "{when}, my state was completely different ({previous}). Now {current} takes hold of me unexpectedly.",
            ),
            format!(
                "I notice a transformation since {when}: {previous} gave way to {current}. What caused this turn?"
            ),
        ],
        Some(EmotionalShift::Moderate) => vec![
            format!(
                "Thinking calmly, {when} I felt {previous}, and now I feel {current}. Something shifted in me."
            ),
            format!("{when}, I was immersed in {previous}. Now {current} gently takes its place."),
            format!("There is a soft transition since {when}: from {previous} to {current}."),
        ],
        None if felt < 3600.0 => vec![
            format!("Since {when}, I remain immersed in {current}. This constancy is comforting."),
            format!("Only moments ago I already felt {current}. It stays with me."),
        ],
        None => vec![
            format!("Since {when}, {current} has been my constant company. Why this persistence?"),
            format!("{current} has accompanied me since {when}. Is it a pattern?"),
        ],
    };

    options[rng.gen_range(0..options.len())].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_log::AuthorPayload;
    use chrono::Duration;
    use digital_body::PhysiologicalState;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn entry(ts: DateTime<Utc>, emotion: Option<Emotion>) -> MemoryEntry {
        let internal_state = emotion.map(|e| {
            let mut body = PhysiologicalState::new();
            body.current_emotion = e;
            body.snapshot()
        });
        MemoryEntry {
            id: Uuid::new_v4(),
            ts,
            author: AuthorPayload::dialogue("A", "hello"),
            response: "a response".to_string(),
            reflection: None,
            internal_state,
        }
    }

    #[test]
    fn test_humanized_tiers() {
        assert_eq!(humanize_duration(10.0), "a few seconds ago");
        assert_eq!(humanize_duration(120.0), "a few minutes ago");
        assert_eq!(humanize_duration(1800.0), "about 30 minutes ago");
        assert_eq!(humanize_duration(5000.0), "about an hour ago");
        assert_eq!(humanize_duration(4.0 * 3600.0), "about 4 hours ago");
        assert_eq!(humanize_duration(100_000.0), "yesterday");
        assert_eq!(humanize_duration(3.0 * 86_400.0), "3 days ago");
    }

    #[test]
    fn test_dilation_is_soft_and_capped() {
        assert_eq!(dilate(100.0, 0.0), 100.0);
        assert!((dilate(100.0, 0.5) - 140.0).abs() < 1e-9);
        // the factor saturates at 1.6 no matter the load
        assert!((dilate(100.0, 2.0) - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_shift_classification() {
        assert_eq!(
            emotional_shift(Emotion::Joy, Emotion::Sadness),
            Some(EmotionalShift::Intense)
        );
        assert_eq!(
            emotional_shift(Emotion::Joy, Emotion::Curiosity),
            Some(EmotionalShift::Moderate)
        );
        assert_eq!(emotional_shift(Emotion::Joy, Emotion::Joy), None);
        // emotions outside the opposition table still register as moderate
        assert_eq!(
            emotional_shift(Emotion::Curiosity, Emotion::Fear),
            Some(EmotionalShift::Moderate)
        );
    }

    #[test]
    fn test_circadian_context() {
        assert!(circadian_context(8).contains("morning"));
        assert!(circadian_context(14).contains("afternoon"));
        assert!(circadian_context(20).contains("evening"));
        assert!(circadian_context(2).contains("late night"));
    }

    #[test]
    fn test_interaction_rate_tiers() {
        let now = Utc::now();
        assert_eq!(interaction_rate(&[], now, 24), InteractionRate::Initial);

        let recent: Vec<MemoryEntry> = (0..3).map(|_| entry(now, None)).collect();
        assert_eq!(interaction_rate(&recent, now, 24), InteractionRate::Isolated);

        let busy: Vec<MemoryEntry> = (0..60).map(|_| entry(now, None)).collect();
        assert_eq!(interaction_rate(&busy, now, 24), InteractionRate::Overstimulated);

        // old entries fall outside the window
        let stale: Vec<MemoryEntry> = (0..60)
            .map(|_| entry(now - Duration::days(3), None))
            .collect();
        assert_eq!(interaction_rate(&stale, now, 24), InteractionRate::Isolated);
    }

    #[test]
    fn test_reflection_without_references() {
        let mut rng = StdRng::seed_from_u64(1);
        let text = temporal_reflection(Emotion::Joy, Utc::now(), &[], 0.0, &mut rng);
        assert!(text.contains("beginning to exist"));
    }

    #[test]
    fn test_reflection_without_internal_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        let memories = vec![entry(now, None), entry(now, None)];
        let text = temporal_reflection(Emotion::Joy, now, &memories, 0.0, &mut rng);
        assert!(text.contains("cannot reach"));
    }

    #[test]
    fn test_reflection_names_both_emotions_on_shift() {
        let mut rng = StdRng::seed_from_u64(4);
        let now = Utc::now();
        let memories = vec![entry(now - Duration::minutes(10), Some(Emotion::Joy))];

        let text = temporal_reflection(Emotion::Sadness, now, &memories, 0.0, &mut rng);
        assert!(text.contains("joy"));
        assert!(text.contains("sadness"));
    }

    #[test]
    fn test_reflection_uses_latest_remembered_state() {
        let mut rng = StdRng::seed_from_u64(2);
        let now = Utc::now();
        let memories = vec![
            entry(now - Duration::hours(5), Some(Emotion::Fear)),
            entry(now - Duration::minutes(2), Some(Emotion::Joy)),
            entry(now - Duration::minutes(1), None),
        ];

        let text = temporal_reflection(Emotion::Joy, now, &memories, 0.0, &mut rng);
        // same emotion as the latest stateful entry, not a shift from fear
        assert!(text.contains("joy"));
        assert!(!text.contains("fear"));
    }

    #[test]
    fn test_load_dilates_felt_time() {
        let mut rng = StdRng::seed_from_u64(3);
        let now = Utc::now();
        // 50 real minutes; at load 0.75 the felt time crosses one hour and
        // the persistence wording changes
        let memories = vec![entry(now - Duration::minutes(50), Some(Emotion::Joy))];

        let calm = temporal_reflection(Emotion::Joy, now, &memories, 0.0, &mut rng);
        assert!(calm.contains("minutes ago") || calm.contains("moments ago"));

        let strained = temporal_reflection(Emotion::Joy, now, &memories, 0.75, &mut rng);
        assert!(strained.contains("hour"));
    }
}
