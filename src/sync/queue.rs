//! Debounced, per-key write queue
//!
//! Every key has at most one pending deadline and at most one request in
//! flight. Scheduling a key that already has a deadline moves the deadline
//! (the earlier timer is superseded). Scheduling a key whose request is in
//! flight arms a trailing write that only becomes due once the in-flight
//! request completes, so rapid edits coalesce into one trailing write
//! carrying the latest state.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    deadline: Option<u64>,
    in_flight: bool,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.deadline.is_none() && !self.in_flight
    }
}

/// Write scheduler keyed by `K`, driven by millisecond timestamps
#[derive(Debug, Clone)]
pub struct WriteQueue<K: Ord + Clone> {
    slots: BTreeMap<K, Slot>,
}

impl<K: Ord + Clone> Default for WriteQueue<K> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> WriteQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the write for `key` to fire at `due_at`
    pub fn schedule(&mut self, key: K, due_at: u64) {
        self.slots.entry(key).or_default().deadline = Some(due_at);
    }

    /// Drop the pending write for `key`; an in-flight request is unaffected
    pub fn cancel(&mut self, key: &K) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.deadline = None;
            if slot.is_idle() {
                self.slots.remove(key);
            }
        }
    }

    /// Keys whose deadline has passed and that have nothing in flight,
    /// earliest deadline first. Returned keys are marked in flight.
    pub fn take_due(&mut self, now: u64) -> Vec<K> {
        let mut due: Vec<(u64, K)> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.in_flight)
            .filter_map(|(key, slot)| match slot.deadline {
                Some(deadline) if deadline <= now => Some((deadline, key.clone())),
                _ => None,
            })
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);

        for (_, key) in &due {
            if let Some(slot) = self.slots.get_mut(key) {
                slot.deadline = None;
                slot.in_flight = true;
            }
        }

        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Take `key` immediately regardless of its deadline.
    ///
    /// Returns false when a request for `key` is already in flight; the
    /// write stays armed and becomes due as soon as that request completes.
    pub fn take_now(&mut self, key: &K, now: u64) -> bool {
        let slot = self.slots.entry(key.clone()).or_default();
        if slot.in_flight {
            slot.deadline = Some(now);
            return false;
        }
        slot.deadline = None;
        slot.in_flight = true;
        true
    }

    /// Mark the in-flight request for `key` finished.
    ///
    /// Returns true when a trailing write is still armed.
    pub fn complete(&mut self, key: &K) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        slot.in_flight = false;
        let rearmed = slot.deadline.is_some();
        if slot.is_idle() {
            self.slots.remove(key);
        }
        rearmed
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| s.deadline.is_some())
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| s.in_flight)
    }

    /// Earliest armed deadline, if any
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.values().filter_map(|s| s.deadline).min()
    }

    /// Drop every slot matching `pred`, in flight or not
    pub fn retain(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.slots.retain(|key, _| pred(key));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
