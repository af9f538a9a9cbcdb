use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use super::approval::{ApprovalError, ApprovalReceipt, ApprovalWorkflow};
use super::capacity::{CapacityError, CapacityPolicy};
use super::directory::StaffDirectory;
use super::domain::{LeaveRequest, RequestId, ShiftCode, SlotKey, StaffId};
use super::locks::SlotLocks;
use super::ranking::WaitlistStanding;
use super::repository::{LedgerError, Notifier, RequestLedger, RosterLock};
use super::scheduler::{ranked_waitlist, RequestScheduler, SchedulingError, SubmissionReceipt};

/// Service composing the scheduler, approval workflow, and read-side queries over one set of
/// collaborators and one slot lock registry.
pub struct LeaveRequestService<D, L, R, N> {
    scheduler: RequestScheduler<D, L>,
    approvals: ApprovalWorkflow<D, L, R, N>,
    ledger: Arc<L>,
    policy: Arc<CapacityPolicy>,
}

impl<D, L, R, N> LeaveRequestService<D, L, R, N>
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        directory: Arc<D>,
        ledger: Arc<L>,
        roster: Arc<R>,
        notifier: Arc<N>,
        policy: CapacityPolicy,
        lock_timeout: Duration,
    ) -> Self {
        let policy = Arc::new(policy);
        let locks = Arc::new(SlotLocks::new(lock_timeout));

        let scheduler = RequestScheduler::new(
            directory.clone(),
            ledger.clone(),
            policy.clone(),
            locks.clone(),
        );
        let approvals = ApprovalWorkflow::new(
            directory,
            ledger.clone(),
            roster,
            notifier,
            policy.clone(),
            locks,
        );

        Self {
            scheduler,
            approvals,
            ledger,
            policy,
        }
    }

    pub fn submit(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<SubmissionReceipt, LeaveServiceError> {
        Ok(self.scheduler.submit(staff_id, date)?)
    }

    pub fn approve(&self, request_id: RequestId) -> Result<ApprovalReceipt, LeaveServiceError> {
        Ok(self.approvals.approve(request_id)?)
    }

    pub fn get(&self, request_id: RequestId) -> Result<LeaveRequest, LeaveServiceError> {
        self.ledger
            .fetch(request_id)?
            .ok_or(LeaveServiceError::RequestNotFound(request_id))
    }

    /// Ranked waitlist for one date and shift.
    pub fn waitlist(
        &self,
        date: NaiveDate,
        shift: ShiftCode,
    ) -> Result<Vec<WaitlistStanding>, LeaveServiceError> {
        self.policy.limit_for(shift)?;
        Ok(ranked_waitlist(
            self.ledger.as_ref(),
            SlotKey::new(date, shift),
        )?)
    }

    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error("request {0} not found")]
    RequestNotFound(RequestId),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
