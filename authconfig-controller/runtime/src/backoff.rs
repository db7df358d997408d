use crate::core::ResourceId;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

pub(crate) const BASE_DELAY: Duration = Duration::from_millis(5);
pub(crate) const MAX_DELAY: Duration = Duration::from_secs(1000);

/// Per-AuthConfig exponential backoff for failed reconciliations.
///
/// An AuthConfig that is deleted after a failure is never reconciled again,
/// so its entry is never reset. Entries that have not failed for twice the
/// maximum delay are dropped the next time any failure is recorded.
#[derive(Debug)]
pub(crate) struct Backoff {
    base: Duration,
    max: Duration,
    failures: Mutex<HashMap<ResourceId, Failures>>,
}

#[derive(Debug)]
struct Failures {
    count: u32,
    last: Instant,
}

// === impl Backoff ===

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BASE_DELAY, MAX_DELAY)
    }
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: Mutex::default(),
        }
    }

    /// Records a failure and returns how long to wait before retrying.
    pub(crate) fn next(&self, id: &ResourceId) -> Duration {
        self.next_at(id, Instant::now())
    }

    fn next_at(&self, id: &ResourceId, now: Instant) -> Duration {
        let stale_after = self.max.saturating_mul(2);
        let mut failures = self.failures.lock();
        failures.retain(|_, f| now.saturating_duration_since(f.last) <= stale_after);

        let f = failures.entry(id.clone()).or_insert(Failures {
            count: 0,
            last: now,
        });
        let delay = self
            .base
            .saturating_mul(2u32.saturating_pow(f.count))
            .min(self.max);
        f.count = f.count.saturating_add(1);
        f.last = now;
        delay
    }

    pub(crate) fn reset(&self, id: &ResourceId) {
        self.failures.lock().remove(id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.failures.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ResourceId {
        ResourceId::new("authorino", name)
    }

    #[test]
    fn doubles_until_capped() {
        let backoff = Backoff::default();
        let delays = (0..4).map(|_| backoff.next(&id("a"))).collect::<Vec<_>>();
        assert_eq!(
            delays,
            [5, 10, 20, 40].map(Duration::from_millis).to_vec()
        );

        for _ in 0..40 {
            backoff.next(&id("a"));
        }
        assert_eq!(backoff.next(&id("a")), MAX_DELAY);
    }

    #[test]
    fn tracks_each_config_separately() {
        let backoff = Backoff::default();
        backoff.next(&id("a"));
        backoff.next(&id("a"));
        assert_eq!(backoff.next(&id("b")), BASE_DELAY);
    }

    #[test]
    fn success_resets_delay() {
        let backoff = Backoff::default();
        backoff.next(&id("a"));
        backoff.next(&id("a"));
        backoff.reset(&id("a"));
        assert_eq!(backoff.next(&id("a")), BASE_DELAY);
        assert_eq!(backoff.len(), 1);
    }

    /// A config that failed and was then deleted is forgotten once it has gone
    /// long enough without another failure.
    #[test]
    fn forgets_configs_that_stop_failing() {
        let backoff = Backoff::default();
        let start = Instant::now();
        backoff.next_at(&id("deleted"), start);
        backoff.next_at(&id("deleted"), start);

        // Still retrying within the window, so the entry is kept.
        backoff.next_at(&id("other"), start + MAX_DELAY);
        assert_eq!(backoff.len(), 2);

        backoff.next_at(&id("other"), start + MAX_DELAY * 3);
        assert_eq!(backoff.len(), 1);
        assert_eq!(
            backoff.next_at(&id("deleted"), start + MAX_DELAY * 3),
            BASE_DELAY
        );
    }
}
