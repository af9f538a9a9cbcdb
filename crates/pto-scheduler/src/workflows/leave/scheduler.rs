use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::capacity::{CapacityError, CapacityPolicy};
use super::directory::{DirectoryError, StaffDirectory};
use super::domain::{
    DenialReason, LeaveDecision, NewLeaveRequest, RequestId, SlotKey, StaffId, StaffMember,
    WaitlistEntry,
};
use super::locks::{SlotBusy, SlotLocks};
use super::ranking::{WaitlistRanker, WaitlistStanding};
use super::repository::{LedgerError, RequestLedger};

/// Decides each submission against slot capacity and the seniority waitlist.
pub struct RequestScheduler<D, L> {
    directory: Arc<D>,
    ledger: Arc<L>,
    policy: Arc<CapacityPolicy>,
    locks: Arc<SlotLocks>,
}

/// What the submitter is told once a decision is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub slot: SlotKey,
    pub decision: LeaveDecision,
    pub remaining_balance: u32,
}

impl SubmissionReceipt {
    pub fn message(&self) -> String {
        self.decision.message()
    }
}

impl<D, L> RequestScheduler<D, L>
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
{
    pub fn new(
        directory: Arc<D>,
        ledger: Arc<L>,
        policy: Arc<CapacityPolicy>,
        locks: Arc<SlotLocks>,
    ) -> Self {
        Self {
            directory,
            ledger,
            policy,
            locks,
        }
    }

    /// Submit a one-day leave request for `date` on the staff member's assigned shift.
    pub fn submit(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<SubmissionReceipt, SchedulingError> {
        let staff = self.directory.lookup(staff_id)?;
        let slot = SlotKey::new(date, staff.shift);
        // Unknown shifts abort before anything is written.
        self.policy.limit_for(staff.shift)?;

        let receipt = self.locks.with_slot(slot, || self.decide(&staff, slot))??;

        info!(
            staff_id = %receipt.staff_id,
            request_id = %receipt.request_id,
            %slot,
            outcome = receipt.decision.status().label(),
            position = ?receipt.decision.waitlist_position(),
            "leave request recorded"
        );
        Ok(receipt)
    }

    /// Runs under the slot lock.
    fn decide(
        &self,
        staff: &StaffMember,
        slot: SlotKey,
    ) -> Result<SubmissionReceipt, SchedulingError> {
        if staff.pto_balance == 0 {
            return self.record_denial(staff, slot);
        }

        let approved = self.ledger.approved_count(slot)?;
        let decision = if self.policy.has_capacity(slot.shift, slot.date, approved)? {
            LeaveDecision::Approved
        } else {
            let existing = submission_order(self.ledger.waitlist_entries(slot)?);
            LeaveDecision::Waitlisted {
                position: WaitlistRanker::insertion_position(&existing, staff.seniority),
            }
        };

        // Waitlisted requests consume a day too.
        let remaining_balance = match self.directory.decrement_balance(staff.id) {
            Ok(remaining) => remaining,
            Err(DirectoryError::InsufficientBalance(_)) => {
                return self.record_denial(staff, slot);
            }
            Err(other) => return Err(other.into()),
        };

        // The append is the last write; a waitlisted append renumbers the queue with it.
        let request_id = match self.ledger.append(NewLeaveRequest {
            staff_id: staff.id,
            slot,
            seniority: staff.seniority,
            decision,
        }) {
            Ok(id) => id,
            Err(err) => {
                if let Err(restore_err) = self.directory.restore_balance(staff.id) {
                    warn!(
                        staff_id = %staff.id,
                        error = %restore_err,
                        "failed to restore leave balance after rejected ledger write"
                    );
                }
                return Err(err.into());
            }
        };

        Ok(SubmissionReceipt {
            request_id,
            staff_id: staff.id,
            slot,
            decision,
            remaining_balance,
        })
    }

    fn record_denial(
        &self,
        staff: &StaffMember,
        slot: SlotKey,
    ) -> Result<SubmissionReceipt, SchedulingError> {
        let decision = LeaveDecision::Denied {
            reason: DenialReason::InsufficientBalance,
        };
        let request_id = self.ledger.append(NewLeaveRequest {
            staff_id: staff.id,
            slot,
            seniority: staff.seniority,
            decision,
        })?;

        Ok(SubmissionReceipt {
            request_id,
            staff_id: staff.id,
            slot,
            decision,
            remaining_balance: 0,
        })
    }
}

/// Ledger entries ordered by request id, so equal seniority keys rank by submission order.
fn submission_order(mut entries: Vec<WaitlistEntry>) -> Vec<WaitlistEntry> {
    entries.sort_by_key(|entry| entry.request_id);
    entries
}

/// Current waitlist of a slot, ranked.
pub(crate) fn ranked_waitlist<L>(
    ledger: &L,
    slot: SlotKey,
) -> Result<Vec<WaitlistStanding>, LedgerError>
where
    L: RequestLedger + ?Sized,
{
    let entries = submission_order(ledger.waitlist_entries(slot)?);
    Ok(WaitlistRanker::standings(entries))
}

/// Structural failures; business outcomes (denied, waitlisted) are never errors.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("staff member {0} not found")]
    StaffNotFound(StaffId),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Busy(#[from] SlotBusy),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Directory(DirectoryError),
}

impl From<DirectoryError> for SchedulingError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::NotFound(id) => Self::StaffNotFound(id),
            other => Self::Directory(other),
        }
    }
}
