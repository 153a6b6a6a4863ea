//! Per-user violation counters.
//!
//! All violation kinds share one counter per user. Counters only grow and
//! live for the process lifetime. Once a count reaches the threshold the
//! user stays terminated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use proctor_models::{LedgerState, ViolationKind};

use crate::metrics;

/// Result of recording one violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Count after this violation
    pub count: u64,
    /// Whether the count has reached the threshold
    pub terminal: bool,
}

/// Process-wide violation ledger.
pub struct ViolationLedger {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
    threshold: u64,
}

impl ViolationLedger {
    pub fn new(threshold: u64) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            threshold,
        }
    }

    /// Get or create the counter for a user.
    fn counter(&self, user: &str) -> Arc<AtomicU64> {
        {
            let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(counter) = counters.get(user) {
                return Arc::clone(counter);
            }
        }

        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(counters.entry(user.to_string()).or_default())
    }

    /// Increment the user's counter and report the new count.
    ///
    /// Exactly one call per user observes the count reaching the threshold.
    pub fn record(&self, user: &str, kind: ViolationKind) -> LedgerEntry {
        let count = self.counter(user).fetch_add(1, Ordering::AcqRel) + 1;
        let terminal = count >= self.threshold;

        metrics::record_violation(kind.as_str());
        if count == self.threshold {
            metrics::record_termination(kind.as_str());
            warn!(user, kind = %kind, count, "Violation threshold reached, user terminated");
        } else {
            info!(user, kind = %kind, count, terminal, "Violation recorded");
        }

        LedgerEntry { count, terminal }
    }

    /// Current count for a user (0 if never seen).
    pub fn count(&self, user: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .map_or(0, |counter| counter.load(Ordering::Acquire))
    }

    pub fn state(&self, user: &str) -> LedgerState {
        LedgerState::from_count(self.count(user), self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments_by_one() {
        let ledger = ViolationLedger::new(10);
        assert_eq!(ledger.count("bob"), 0);
        assert_eq!(ledger.state("bob"), LedgerState::Clean);

        for expected in 1..=3 {
            let entry = ledger.record("bob", ViolationKind::TabChange);
            assert_eq!(entry, LedgerEntry { count: expected, terminal: false });
        }
        assert_eq!(ledger.state("bob"), LedgerState::Flagging);
    }

    #[test]
    fn test_kinds_share_one_counter() {
        let ledger = ViolationLedger::new(10);
        ledger.record("carol", ViolationKind::Gaze);
        ledger.record("carol", ViolationKind::Noise);
        let entry = ledger.record("carol", ViolationKind::WindowChange);
        assert_eq!(entry.count, 3);
        assert_eq!(ledger.count("dave"), 0);
    }

    #[test]
    fn test_terminated_is_sticky() {
        let ledger = ViolationLedger::new(3);
        ledger.record("erin", ViolationKind::TabChange);
        ledger.record("erin", ViolationKind::TabChange);
        assert!(ledger.record("erin", ViolationKind::TabChange).terminal);

        let after = ledger.record("erin", ViolationKind::Gaze);
        assert_eq!(after, LedgerEntry { count: 4, terminal: true });
        assert_eq!(ledger.state("erin"), LedgerState::Terminated);
    }

    #[test]
    fn test_concurrent_records_cross_threshold_once() {
        let ledger = ViolationLedger::new(100);
        let crossings = AtomicU64::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        if ledger.record("frank", ViolationKind::FullscreenExit).count == 100 {
                            crossings.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(ledger.count("frank"), 400);
        assert_eq!(crossings.load(Ordering::Relaxed), 1);
    }
}
