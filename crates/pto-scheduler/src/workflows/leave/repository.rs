use serde::{Deserialize, Serialize};

use super::domain::{
    LeaveRequest, NewLeaveRequest, RequestId, RosterLockEntry, SlotKey, StaffId, WaitlistEntry,
};

/// Append-only store of leave outcomes; the source of truth for capacity and waitlists.
pub trait RequestLedger: Send + Sync {
    fn approved_count(&self, slot: SlotKey) -> Result<u32, LedgerError>;

    /// Every waitlisted entry for the slot, in no particular order.
    fn waitlist_entries(&self, slot: SlotKey) -> Result<Vec<WaitlistEntry>, LedgerError>;

    /// Record a decision. Stores that reject duplicates fail with `DuplicateSubmission` when
    /// the staff member already holds an approved or waitlisted request for the slot.
    ///
    /// A waitlisted entry at position `p` moves the slot's entries at `p` and behind back by one
    /// in the same write.
    fn append(&self, request: NewLeaveRequest) -> Result<RequestId, LedgerError>;

    fn fetch(&self, id: RequestId) -> Result<Option<LeaveRequest>, LedgerError>;

    /// Promote a waitlisted entry and close the gap it leaves in the slot's positions.
    /// Anything other than a waitlisted entry is an invalid transition.
    fn set_approved(&self, id: RequestId) -> Result<LeaveRequest, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("staff member {staff_id} already has an active request for {slot}")]
    DuplicateSubmission { staff_id: StaffId, slot: SlotKey },
    #[error("request {0} not found")]
    NotFound(RequestId),
    #[error("request {id} cannot move from {from} to approved")]
    InvalidTransition { id: RequestId, from: &'static str },
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Marks staff unavailable on the duty roster for approved leave.
pub trait RosterLock: Send + Sync {
    /// Create the lock entry. A second call for the same request yields `AlreadyLocked`.
    fn lock(&self, entry: RosterLockEntry) -> Result<(), RosterError>;

    fn release(&self, request_id: RequestId) -> Result<(), RosterError>;

    fn entries_for(&self, request_id: RequestId) -> Result<Vec<RosterLockEntry>, RosterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster already locked for request {0}")]
    AlreadyLocked(RequestId),
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

/// Outbound message hook (e-mail or otherwise). Delivery is best effort.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
