//! Addresses waiting for physical deletion.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use cas_types::Address;

/// Why an address is waiting in the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingReason {
    /// Released under the deferred policy; eligible after the grace period.
    Deferred,
    /// An earlier delete or reference count failed; eligible on every sweep.
    Retry,
}

/// A queued delete.
#[derive(Clone, Debug)]
pub struct PendingDelete {
    pub address: Address,
    pub reason: PendingReason,
    pub queued_at: Instant,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl PendingDelete {
    fn is_due(&self, grace: Duration, now: Instant) -> bool {
        match self.reason {
            PendingReason::Deferred => now.saturating_duration_since(self.queued_at) >= grace,
            PendingReason::Retry => true,
        }
    }
}

/// Queue of deletes that have not yet happened.
///
/// Entries leave the queue only when the object was deleted or found to be
/// referenced again. Failures keep the entry, so a delete is never dropped.
#[derive(Debug, Default)]
pub(crate) struct DeleteQueue {
    entries: Mutex<HashMap<Address, PendingDelete>>,
}

impl DeleteQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a released address. Re-deferring restarts its grace period.
    pub(crate) fn defer(&self, address: &Address) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .entry(address.clone())
            .or_insert_with(|| PendingDelete {
                address: address.clone(),
                reason: PendingReason::Deferred,
                queued_at: Instant::now(),
                attempts: 0,
                last_error: None,
            });
        if entry.reason == PendingReason::Deferred {
            entry.queued_at = Instant::now();
        }
    }

    /// Queue an address whose delete could not be completed.
    pub(crate) fn retry(&self, address: &Address, error: String) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .entry(address.clone())
            .or_insert_with(|| PendingDelete {
                address: address.clone(),
                reason: PendingReason::Retry,
                queued_at: Instant::now(),
                attempts: 0,
                last_error: None,
            });
        entry.reason = PendingReason::Retry;
        entry.attempts += 1;
        entry.last_error = Some(error);
    }

    /// Addresses eligible for a sweep now.
    pub(crate) fn due(&self, grace: Duration) -> Vec<Address> {
        let now = Instant::now();
        let entries = self.entries.lock().expect("lock poisoned");
        let mut due: Vec<Address> = entries
            .values()
            .filter(|p| p.is_due(grace, now))
            .map(|p| p.address.clone())
            .collect();
        due.sort();
        due
    }

    pub(crate) fn remove(&self, address: &Address) -> Option<PendingDelete> {
        self.entries.lock().expect("lock poisoned").remove(address)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, address: &Address) -> Option<PendingDelete> {
        self.entries.lock().expect("lock poisoned").get(address).cloned()
    }

    pub(crate) fn snapshot(&self) -> Vec<PendingDelete> {
        let entries = self.entries.lock().expect("lock poisoned");
        let mut all: Vec<PendingDelete> = entries.values().cloned().collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        all
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }
}
