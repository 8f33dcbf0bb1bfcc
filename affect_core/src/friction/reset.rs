//! Operator reset for accumulated damage.
//!
//! The only sanctioned way damage ever decreases. Intended for damage caused
//! by bugs, not by normal use: every reset is recorded in the audit trail.

use chrono::Utc;
use tracing::info;

use super::{FrictionStore, ResetEntry, CHRONIC_THRESHOLD};
use crate::error::{AffectError, Result};

/// What a reset changed, for operator display.
#[derive(Debug, Clone, Copy)]
pub struct ResetOutcome {
    pub old_damage: f32,
    pub new_damage: f32,
    pub old_load: f32,
    pub new_load: f32,
    pub chronic: bool,
}

/// Force damage to `target`, halve load, and clear the chronic flag when the
/// new damage is below the chronic threshold.
///
/// When current damage exceeds 0.5 the reset is refused unless `force` is
/// set; high damage usually means a bug worth inspecting before wiping the
/// evidence. Appends an audit entry to `reset_history` on success.
pub fn reset_damage(store: &FrictionStore, target: f32, reason: &str, force: bool) -> Result<ResetOutcome> {
    if !(0.0..=1.0).contains(&target) {
        return Err(AffectError::Refused(format!(
            "target damage {target} outside [0, 1]"
        )));
    }

    let mut record = store.load();

    if record.damage > 0.5 && !force {
        return Err(AffectError::Refused(format!(
            "current damage {:.4} exceeds 0.5; pass force to confirm",
            record.damage
        )));
    }

    let outcome = ResetOutcome {
        old_damage: record.damage,
        new_damage: target,
        old_load: record.load,
        new_load: (record.load * 0.5).max(0.0),
        chronic: if target < CHRONIC_THRESHOLD { false } else { record.chronic },
    };

    record.reset_history.push(ResetEntry {
        timestamp: Utc::now(),
        old_damage: record.damage,
        new_damage: target,
        reason: reason.to_string(),
    });
    record.damage = outcome.new_damage;
    record.load = outcome.new_load;
    record.chronic = outcome.chronic;
    record.last_updated = Utc::now();

    store.save(&record)?;
    info!(
        old_damage = outcome.old_damage,
        new_damage = outcome.new_damage,
        reason, "damage reset applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friction::FrictionRecord;

    fn temp_store_with(damage: f32, load: f32, chronic: bool) -> FrictionStore {
        let path = std::env::temp_dir().join(format!("reset-{}.json", uuid::Uuid::new_v4()));
        let store = FrictionStore::new(path);
        let record = FrictionRecord {
            damage,
            load,
            chronic,
            total_sessions: 3,
            ..FrictionRecord::default()
        };
        store.save(&record).unwrap();
        store
    }

    #[test]
    fn test_reset_halves_load_and_clears_chronic() {
        let store = temp_store_with(0.4, 0.3, true);

        let outcome = reset_damage(&store, 0.0, "test", false).unwrap();
        assert_eq!(outcome.new_damage, 0.0);
        assert!((outcome.new_load - 0.15).abs() < 1e-6);
        assert!(!outcome.chronic);

        let record = store.load();
        assert_eq!(record.damage, 0.0);
        assert!(!record.chronic);
        assert_eq!(record.total_sessions, 3);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_reset_keeps_chronic_above_threshold() {
        let store = temp_store_with(0.45, 0.1, true);

        let outcome = reset_damage(&store, 0.4, "partial", false).unwrap();
        assert!(outcome.chronic);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_high_damage_requires_force() {
        let store = temp_store_with(0.7, 0.2, true);

        assert!(matches!(
            reset_damage(&store, 0.0, "oops", false),
            Err(AffectError::Refused(_))
        ));
        // the record is untouched after a refusal
        assert!((store.load().damage - 0.7).abs() < 1e-6);

        assert!(reset_damage(&store, 0.0, "confirmed", true).is_ok());
        assert_eq!(store.load().damage, 0.0);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_reset_is_idempotent_but_audited_twice() {
        let store = temp_store_with(0.3, 0.2, false);

        reset_damage(&store, 0.0, "first", false).unwrap();
        reset_damage(&store, 0.0, "second", false).unwrap();

        let record = store.load();
        assert_eq!(record.damage, 0.0);
        assert_eq!(record.reset_history.len(), 2);
        assert!((record.reset_history[0].old_damage - 0.3).abs() < 1e-6);
        assert_eq!(record.reset_history[1].old_damage, 0.0);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_target_out_of_range_refused() {
        let store = temp_store_with(0.1, 0.0, false);
        assert!(reset_damage(&store, 1.5, "bad", false).is_err());
        let _ = std::fs::remove_file(store.path());
    }
}
