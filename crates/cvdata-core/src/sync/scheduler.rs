//! Tiered sweep scheduling
//!
//! One loop owns all tiers. Each tier has an explicit due time; a tick runs
//! every tier that is due and pushes its due time one interval forward, so
//! sweeps never overlap on the same index.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::SyncSettings;

/// Sweep cadence group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical,
    Normal,
    Background,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Critical, Self::Normal, Self::Background];
}

/// Outcome of sweeping one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSweep {
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
struct Slot {
    tier: Tier,
    interval: Duration,
    due: Instant,
}

/// Due times per tier.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    slots: Vec<Slot>,
}

impl SyncScheduler {
    /// Every tier is due at `start`.
    pub fn new(settings: &SyncSettings, start: Instant) -> Self {
        let slot = |tier, interval| Slot {
            tier,
            interval,
            due: start,
        };
        Self {
            slots: vec![
                slot(Tier::Critical, settings.critical_interval()),
                slot(Tier::Normal, settings.normal_interval()),
                slot(Tier::Background, settings.background_interval()),
            ],
        }
    }

    /// Tiers whose due time has passed, most urgent first.
    pub fn due_tiers(&self, now: Instant) -> Vec<Tier> {
        self.slots
            .iter()
            .filter(|s| s.due <= now)
            .map(|s| s.tier)
            .collect()
    }

    /// Record a sweep of `tier` at `now`.
    pub fn mark_ran(&mut self, tier: Tier, now: Instant) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.tier == tier) {
            slot.due = now + slot.interval;
        }
    }

    /// Earliest due time across tiers.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.slots.iter().map(|s| s.due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tiers_fall_due_on_their_own_cadence() {
        let start = Instant::now();
        let mut scheduler = SyncScheduler::new(&SyncSettings::default(), start);
        assert_eq!(scheduler.due_tiers(start), Tier::ALL.to_vec());

        for tier in Tier::ALL {
            scheduler.mark_ran(tier, start);
        }
        assert!(scheduler.due_tiers(start).is_empty());
        assert_eq!(scheduler.next_wakeup(), Some(start + Duration::from_secs(30)));

        let later = start + Duration::from_secs(301);
        assert_eq!(scheduler.due_tiers(later), vec![Tier::Critical, Tier::Normal]);
    }
}
