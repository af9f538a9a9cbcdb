//! Process-local implementations of the storage and notification seams.
//!
//! Each store guards its state with a single `parking_lot::Mutex`, which gives the atomic
//! "read + conditional write" the scheduler relies on within one process.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use super::directory::{DirectoryError, StaffDirectory};
use super::domain::{
    DuplicatePolicy, LeaveRequest, LeaveStatus, NewLeaveRequest, RequestId, RosterLockEntry,
    SeniorityKey, SlotKey, StaffId, StaffMember, WaitlistEntry,
};
use super::repository::{
    LedgerError, Notification, Notifier, NotifyError, RequestLedger, RosterError, RosterLock,
};

#[derive(Debug, Default)]
pub struct InMemoryStaffDirectory {
    staff: Mutex<HashMap<StaffId, StaffMember>>,
}

impl InMemoryStaffDirectory {
    pub fn new(members: impl IntoIterator<Item = StaffMember>) -> Self {
        let staff = members
            .into_iter()
            .map(|member| (member.id, member))
            .collect();
        Self {
            staff: Mutex::new(staff),
        }
    }

    /// Administrative provisioning; replaces any existing record with the same id.
    pub fn upsert(&self, member: StaffMember) {
        self.staff.lock().insert(member.id, member);
    }

    pub fn len(&self) -> usize {
        self.staff.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.staff.lock().is_empty()
    }
}

impl StaffDirectory for InMemoryStaffDirectory {
    fn lookup(&self, id: StaffId) -> Result<StaffMember, DirectoryError> {
        self.staff
            .lock()
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound(id))
    }

    fn decrement_balance(&self, id: StaffId) -> Result<u32, DirectoryError> {
        let mut staff = self.staff.lock();
        let member = staff.get_mut(&id).ok_or(DirectoryError::NotFound(id))?;
        member.pto_balance = member
            .pto_balance
            .checked_sub(1)
            .ok_or(DirectoryError::InsufficientBalance(id))?;
        Ok(member.pto_balance)
    }

    fn restore_balance(&self, id: StaffId) -> Result<u32, DirectoryError> {
        let mut staff = self.staff.lock();
        let member = staff.get_mut(&id).ok_or(DirectoryError::NotFound(id))?;
        member.pto_balance = member.pto_balance.saturating_add(1);
        Ok(member.pto_balance)
    }
}

#[derive(Debug, Clone)]
struct LedgerRow {
    request: LeaveRequest,
    seniority: SeniorityKey,
}

#[derive(Debug)]
struct LedgerState {
    rows: BTreeMap<RequestId, LedgerRow>,
    next_id: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl LedgerState {
    fn slot_rows(&self, slot: SlotKey) -> impl Iterator<Item = &LedgerRow> + '_ {
        self.rows
            .values()
            .filter(move |row| row.request.slot() == slot)
    }

    /// Apply `adjust` to every waitlisted position in the slot; `None` leaves a row unchanged.
    fn shift_waitlist(&mut self, slot: SlotKey, adjust: impl Fn(u32) -> Option<u32>) {
        for row in self.rows.values_mut() {
            if row.request.slot() != slot || row.request.status != LeaveStatus::Waitlisted {
                continue;
            }
            if let Some(next) = row.request.waitlist_position.and_then(&adjust) {
                row.request.waitlist_position = Some(next);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRequestLedger {
    state: Mutex<LedgerState>,
    duplicates: DuplicatePolicy,
}

impl InMemoryRequestLedger {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            duplicates,
        }
    }

    /// Every stored request in identifier order.
    pub fn all(&self) -> Vec<LeaveRequest> {
        self.state
            .lock()
            .rows
            .values()
            .map(|row| row.request.clone())
            .collect()
    }

    pub fn for_slot(&self, slot: SlotKey) -> Vec<LeaveRequest> {
        self.state
            .lock()
            .slot_rows(slot)
            .map(|row| row.request.clone())
            .collect()
    }
}

impl RequestLedger for InMemoryRequestLedger {
    fn approved_count(&self, slot: SlotKey) -> Result<u32, LedgerError> {
        let state = self.state.lock();
        let count = state
            .slot_rows(slot)
            .filter(|row| row.request.status == LeaveStatus::Approved)
            .count();
        u32::try_from(count).map_err(|_| LedgerError::Unavailable("count overflow".to_string()))
    }

    fn waitlist_entries(&self, slot: SlotKey) -> Result<Vec<WaitlistEntry>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .slot_rows(slot)
            .filter(|row| row.request.status == LeaveStatus::Waitlisted)
            .map(|row| WaitlistEntry {
                request_id: row.request.id,
                staff_id: row.request.staff_id,
                seniority: row.seniority,
            })
            .collect())
    }

    fn append(&self, request: NewLeaveRequest) -> Result<RequestId, LedgerError> {
        let mut state = self.state.lock();
        let status = request.decision.status();

        if self.duplicates == DuplicatePolicy::Reject && status.is_active() {
            let duplicate = state.slot_rows(request.slot).any(|row| {
                row.request.staff_id == request.staff_id && row.request.status.is_active()
            });
            if duplicate {
                return Err(LedgerError::DuplicateSubmission {
                    staff_id: request.staff_id,
                    slot: request.slot,
                });
            }
        }

        if let Some(position) = request.decision.waitlist_position() {
            state.shift_waitlist(request.slot, |current| {
                (current >= position).then(|| current.saturating_add(1))
            });
        }

        let id = RequestId(state.next_id);
        state.next_id += 1;
        state.rows.insert(
            id,
            LedgerRow {
                request: LeaveRequest {
                    id,
                    staff_id: request.staff_id,
                    date: request.slot.date,
                    shift: request.slot.shift,
                    status,
                    waitlist_position: request.decision.waitlist_position(),
                },
                seniority: request.seniority,
            },
        );
        Ok(id)
    }

    fn fetch(&self, id: RequestId) -> Result<Option<LeaveRequest>, LedgerError> {
        Ok(self
            .state
            .lock()
            .rows
            .get(&id)
            .map(|row| row.request.clone()))
    }

    fn set_approved(&self, id: RequestId) -> Result<LeaveRequest, LedgerError> {
        let mut state = self.state.lock();
        let row = state.rows.get_mut(&id).ok_or(LedgerError::NotFound(id))?;
        if row.request.status != LeaveStatus::Waitlisted {
            return Err(LedgerError::InvalidTransition {
                id,
                from: row.request.status.label(),
            });
        }
        let vacated = row.request.waitlist_position.take();
        row.request.status = LeaveStatus::Approved;
        let promoted = row.request.clone();

        if let Some(vacated) = vacated {
            state.shift_waitlist(promoted.slot(), |current| {
                (current > vacated).then(|| current - 1)
            });
        }
        Ok(promoted)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRosterLock {
    entries: Mutex<BTreeMap<RequestId, RosterLockEntry>>,
}

impl InMemoryRosterLock {
    pub fn entries(&self) -> Vec<RosterLockEntry> {
        self.entries.lock().values().copied().collect()
    }
}

impl RosterLock for InMemoryRosterLock {
    fn lock(&self, entry: RosterLockEntry) -> Result<(), RosterError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&entry.request_id) {
            return Err(RosterError::AlreadyLocked(entry.request_id));
        }
        entries.insert(entry.request_id, entry);
        Ok(())
    }

    fn release(&self, request_id: RequestId) -> Result<(), RosterError> {
        self.entries.lock().remove(&request_id);
        Ok(())
    }

    fn entries_for(&self, request_id: RequestId) -> Result<Vec<RosterLockEntry>, RosterError> {
        Ok(self
            .entries
            .lock()
            .get(&request_id)
            .copied()
            .into_iter()
            .collect())
    }
}

/// Captures notifications instead of delivering them.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

impl Notifier for InMemoryNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification);
        Ok(())
    }
}
