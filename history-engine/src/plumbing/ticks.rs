//! `TicksSinceStart` plumbing provider: buckets each commit into a tick
//! index counted from the first commit seen (spec §4.1). The epoch is
//! whichever commit the provider observes first — callers that need a
//! stable epoch across runs pre-seed it via [`EpochTickProvider::with_epoch`].

use chrono::{DateTime, Utc};

use history_core::ids::Tick;
use history_core::model::Commit;
use history_core::plumbing::TickProvider;

pub struct EpochTickProvider {
    epoch: Option<DateTime<Utc>>,
    tick_size: chrono::Duration,
}

impl EpochTickProvider {
    pub fn new(tick_size: std::time::Duration) -> Self {
        Self {
            epoch: None,
            tick_size: chrono::Duration::from_std(tick_size).unwrap_or(chrono::Duration::hours(24)),
        }
    }

    pub fn with_epoch(tick_size: std::time::Duration, epoch: DateTime<Utc>) -> Self {
        let mut provider = Self::new(tick_size);
        provider.epoch = Some(epoch);
        provider
    }

    pub fn epoch(&self) -> Option<DateTime<Utc>> {
        self.epoch
    }
}

impl TickProvider for EpochTickProvider {
    fn compute(&mut self, commit: &dyn Commit) -> Tick {
        let when = commit.author_signature().when;
        let epoch = *self.epoch.get_or_insert(when);

        let elapsed = when.signed_duration_since(epoch);
        if elapsed.num_seconds() <= 0 {
            return Tick::ZERO;
        }
        let tick_secs = self.tick_size.num_seconds().max(1);
        Tick((elapsed.num_seconds() / tick_secs) as u32)
    }
}
