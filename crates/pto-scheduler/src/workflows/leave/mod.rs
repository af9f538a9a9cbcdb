//! Leave request scheduling: slot capacity, the seniority waitlist, and approval side effects.

pub mod approval;
pub mod capacity;
pub mod directory;
pub mod domain;
pub mod locks;
pub mod memory;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod tests;

pub use approval::{ApprovalError, ApprovalReceipt, ApprovalWorkflow, APPROVAL_SUBJECT};
pub use capacity::{CapacityError, CapacityPolicy};
pub use directory::{DirectoryError, StaffDirectory};
pub use domain::{
    DenialReason, DuplicatePolicy, LeaveDecision, LeaveRequest, LeaveStatus, NewLeaveRequest,
    RequestId, RosterLockEntry, SeniorityKey, ShiftCode, SlotKey, StaffId, StaffMember,
    WaitlistEntry,
};
pub use locks::{SlotBusy, SlotLocks};
pub use memory::{
    InMemoryNotifier, InMemoryRequestLedger, InMemoryRosterLock, InMemoryStaffDirectory,
};
pub use ranking::{WaitlistRanker, WaitlistStanding};
pub use repository::{
    LedgerError, Notification, Notifier, NotifyError, RequestLedger, RosterError, RosterLock,
};
pub use router::leave_router;
pub use scheduler::{RequestScheduler, SchedulingError, SubmissionReceipt};
pub use service::{LeaveRequestService, LeaveServiceError};
