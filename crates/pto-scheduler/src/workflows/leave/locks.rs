use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::domain::SlotKey;

/// Registry of per-slot mutexes. Work for one (date, shift) serializes; distinct slots only
/// share the brief registry lookup. Entries live only while a caller holds or awaits them.
#[derive(Debug)]
pub struct SlotLocks {
    slots: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
    timeout: Duration,
}

/// The slot stayed locked for longer than the configured wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slot {slot} is busy; retry later")]
pub struct SlotBusy {
    pub slot: SlotKey,
}

impl SlotLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `work` while holding the slot's mutex, waiting at most the configured timeout.
    pub fn with_slot<T>(&self, slot: SlotKey, work: impl FnOnce() -> T) -> Result<T, SlotBusy> {
        let lock = {
            let mut slots = self.slots.lock();
            slots
                .entry(slot)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let outcome = match lock.try_lock_for(self.timeout) {
            Some(_guard) => {
                debug!(%slot, "slot lock acquired");
                Ok(work())
            }
            None => Err(SlotBusy { slot }),
        };

        self.release_idle(slot, &lock);
        outcome
    }

    /// Slots currently held or awaited.
    pub fn tracked_slots(&self) -> usize {
        self.slots.lock().len()
    }

    /// Drop the registry entry once nobody else holds or waits on the slot's mutex.
    fn release_idle(&self, slot: SlotKey, lock: &Arc<Mutex<()>>) {
        let mut slots = self.slots.lock();
        let idle = slots
            .get(&slot)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) == 2);
        if idle {
            slots.remove(&slot);
        }
    }
}
