use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::capacity::{CapacityError, CapacityPolicy};
use super::directory::StaffDirectory;
use super::domain::{LeaveRequest, LeaveStatus, RequestId, RosterLockEntry, SlotKey};
use super::locks::{SlotBusy, SlotLocks};
use super::repository::{
    LedgerError, Notification, Notifier, RequestLedger, RosterError, RosterLock,
};

pub const APPROVAL_SUBJECT: &str = "PTO Approved";

/// Promotes waitlisted requests and carries out the roster and notification side effects.
pub struct ApprovalWorkflow<D, L, R, N> {
    directory: Arc<D>,
    ledger: Arc<L>,
    roster: Arc<R>,
    notifier: Arc<N>,
    policy: Arc<CapacityPolicy>,
    locks: Arc<SlotLocks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalReceipt {
    pub request: LeaveRequest,
    pub notified: bool,
}

impl ApprovalReceipt {
    pub fn message(&self) -> String {
        if self.notified {
            "Request approved. Staff notified and locked out of schedule.".to_string()
        } else {
            "Request approved and staff locked out of schedule; notification was not delivered."
                .to_string()
        }
    }
}

impl<D, L, R, N> ApprovalWorkflow<D, L, R, N>
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
        policy: Arc<CapacityPolicy>,
        locks: Arc<SlotLocks>,
    ) -> Self {
        Self {
            directory,
            ledger,
            roster,
            notifier,
            policy,
            locks,
        }
    }

    /// Move a waitlisted request to approved. The balance was already charged at submission.
    ///
    /// Approval is a supervisor decision and may take the slot past its submission limit.
    pub fn approve(&self, request_id: RequestId) -> Result<ApprovalReceipt, ApprovalError> {
        let request = self
            .ledger
            .fetch(request_id)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;
        let slot = request.slot();
        self.policy.limit_for(slot.shift)?;

        let approved = self
            .locks
            .with_slot(slot, || self.promote(request_id, slot))??;

        info!(
            request_id = %approved.id,
            staff_id = %approved.staff_id,
            %slot,
            "waitlisted leave request approved"
        );

        // Committed; delivery is best effort from here on.
        let notified = self.notify(&approved);
        Ok(ApprovalReceipt {
            request: approved,
            notified,
        })
    }

    /// Runs under the slot lock.
    fn promote(&self, request_id: RequestId, slot: SlotKey) -> Result<LeaveRequest, ApprovalError> {
        let current = self
            .ledger
            .fetch(request_id)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;
        if current.status != LeaveStatus::Waitlisted {
            return Err(ApprovalError::InvalidTransition {
                id: request_id,
                from: current.status.label(),
            });
        }

        let entry = RosterLockEntry {
            request_id,
            staff_id: current.staff_id,
            slot,
        };
        match self.roster.lock(entry) {
            Ok(()) => {}
            Err(RosterError::AlreadyLocked(_)) => {
                warn!(%request_id, "roster lock already present; reusing it");
            }
            Err(other) => return Err(other.into()),
        }

        self.ledger.set_approved(request_id).map_err(|err| {
            if let Err(release_err) = self.roster.release(request_id) {
                warn!(%request_id, error = %release_err, "failed to release roster lock");
            }
            err.into()
        })
    }

    fn notify(&self, request: &LeaveRequest) -> bool {
        let staff = match self.directory.lookup(request.staff_id) {
            Ok(staff) => staff,
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "no contact for approval notice");
                return false;
            }
        };

        let notification = Notification {
            to: staff.email,
            subject: APPROVAL_SUBJECT.to_string(),
            body: format!(
                "Hello {}, your request for {} (Shift {}) has been approved.",
                staff.name, request.date, request.shift
            ),
        };

        match self.notifier.send(notification) {
            Ok(()) => true,
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "approval notification failed");
                false
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("request {0} not found")]
    RequestNotFound(RequestId),
    #[error("request {id} is {from}; only waitlisted requests can be approved")]
    InvalidTransition { id: RequestId, from: &'static str },
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Busy(#[from] SlotBusy),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for ApprovalError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound(id) => Self::RequestNotFound(id),
            LedgerError::InvalidTransition { id, from } => Self::InvalidTransition { id, from },
            other => Self::Ledger(other),
        }
    }
}
