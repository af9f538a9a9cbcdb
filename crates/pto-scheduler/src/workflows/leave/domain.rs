use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for staff records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub u64);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duty period code. Only codes with a configured limit are schedulable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftCode(pub u8);

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite waitlist priority: earlier hire date first, then lower academy class rank.
///
/// Field order matters: the derived `Ord` compares `hire_date` before `class_rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeniorityKey {
    pub hire_date: NaiveDate,
    pub class_rank: u32,
}

impl SeniorityKey {
    pub const fn new(hire_date: NaiveDate, class_rank: u32) -> Self {
        Self {
            hire_date,
            class_rank,
        }
    }
}

/// Directory snapshot of a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub badge_number: String,
    pub shift: ShiftCode,
    pub seniority: SeniorityKey,
    pub pto_balance: u32,
    pub email: String,
}

/// The (date, shift) pair that capacity and waitlists are accounted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub shift: ShiftCode,
}

impl SlotKey {
    pub const fn new(date: NaiveDate, shift: ShiftCode) -> Self {
        Self { date, shift }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Shift {})", self.date, self.shift)
    }
}

/// Outcome recorded for every leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Approved,
    Denied,
    Waitlisted,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveStatus::Approved => "approved",
            LeaveStatus::Denied => "denied",
            LeaveStatus::Waitlisted => "waitlisted",
        }
    }

    /// Approved and waitlisted requests hold a balance day and block resubmission.
    pub const fn is_active(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Waitlisted)
    }
}

/// Decision produced by the scheduler. The waitlist position lives on the variant so an
/// approved or denied decision can never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LeaveDecision {
    Approved,
    Denied { reason: DenialReason },
    Waitlisted { position: u32 },
}

impl LeaveDecision {
    pub const fn status(&self) -> LeaveStatus {
        match self {
            LeaveDecision::Approved => LeaveStatus::Approved,
            LeaveDecision::Denied { .. } => LeaveStatus::Denied,
            LeaveDecision::Waitlisted { .. } => LeaveStatus::Waitlisted,
        }
    }

    pub const fn waitlist_position(&self) -> Option<u32> {
        match self {
            LeaveDecision::Waitlisted { position } => Some(*position),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LeaveDecision::Approved => "Approved!".to_string(),
            LeaveDecision::Denied { reason } => format!("Denied: {}.", reason.describe()),
            LeaveDecision::Waitlisted { position } => {
                format!("All slots full. Added to waitlist (position {position}).")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    InsufficientBalance,
}

impl DenialReason {
    pub const fn describe(self) -> &'static str {
        match self {
            DenialReason::InsufficientBalance => "not enough PTO",
        }
    }
}

/// Ledger row. `waitlist_position` is `Some` iff `status` is waitlisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: RequestId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub shift: ShiftCode,
    pub status: LeaveStatus,
    pub waitlist_position: Option<u32>,
}

impl LeaveRequest {
    pub const fn slot(&self) -> SlotKey {
        SlotKey::new(self.date, self.shift)
    }
}

/// Input to `RequestLedger::append`; the ledger assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveRequest {
    pub staff_id: StaffId,
    pub slot: SlotKey,
    pub seniority: SeniorityKey,
    pub decision: LeaveDecision,
}

/// A waitlisted ledger row joined with the seniority captured at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub seniority: SeniorityKey,
}

/// Marker taking a staff member off the roster for an approved leave day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterLockEntry {
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub slot: SlotKey,
}

/// Whether a second active request for the same staff and slot is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Allow,
}
