use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of lifecycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleStats {
    pub begin_calls: u64,
    pub end_calls: u64,
    pub failures: u64,
    pub no_ops: u64,
}

#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    begin_calls: AtomicU64,
    end_calls: AtomicU64,
    failures: AtomicU64,
    no_ops: AtomicU64,
}

impl StatsCounters {
    pub(super) fn record_begin(&self) {
        self.begin_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_end(&self) {
        self.end_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_no_op(&self) {
        self.no_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> LifecycleStats {
        LifecycleStats {
            begin_calls: self.begin_calls.load(Ordering::Relaxed),
            end_calls: self.end_calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            no_ops: self.no_ops.load(Ordering::Relaxed),
        }
    }
}
