use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use axum::response::Response;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde_json::Value;

use crate::workflows::leave::domain::{
    LeaveDecision, LeaveRequest, NewLeaveRequest, RequestId, SeniorityKey, ShiftCode, SlotKey,
    StaffId, StaffMember, WaitlistEntry,
};
use crate::workflows::leave::memory::{
    InMemoryNotifier, InMemoryRequestLedger, InMemoryRosterLock, InMemoryStaffDirectory,
};
use crate::workflows::leave::repository::{
    LedgerError, Notification, Notifier, NotifyError, RequestLedger,
};
use crate::workflows::leave::{CapacityPolicy, LeaveRequestService};

pub(super) type MemoryService = LeaveRequestService<
    InMemoryStaffDirectory,
    InMemoryRequestLedger,
    InMemoryRosterLock,
    InMemoryNotifier,
>;

pub(super) fn leave_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 24).expect("valid date")
}

pub(super) fn hired(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid hire date")
}

pub(super) fn officer(id: u64, shift: u8, hire_date: NaiveDate, rank: u32, balance: u32) -> StaffMember {
    StaffMember {
        id: StaffId(id),
        name: format!("Officer {id}"),
        badge_number: format!("B-{id:04}"),
        shift: ShiftCode(shift),
        seniority: SeniorityKey::new(hire_date, rank),
        pto_balance: balance,
        email: format!("officer{id}@example.org"),
    }
}

pub(super) fn policy(limits: &[(u8, u32)]) -> CapacityPolicy {
    CapacityPolicy::new(
        limits
            .iter()
            .map(|(shift, limit)| (ShiftCode(*shift), *limit))
            .collect::<BTreeMap<_, _>>(),
    )
}

pub(super) struct Harness {
    pub(super) service: MemoryService,
    pub(super) directory: Arc<InMemoryStaffDirectory>,
    pub(super) ledger: Arc<InMemoryRequestLedger>,
    pub(super) roster: Arc<InMemoryRosterLock>,
    pub(super) notifier: Arc<InMemoryNotifier>,
}

pub(super) fn harness(staff: Vec<StaffMember>, limits: &[(u8, u32)]) -> Harness {
    let directory = Arc::new(InMemoryStaffDirectory::new(staff));
    let ledger = Arc::new(InMemoryRequestLedger::default());
    let roster = Arc::new(InMemoryRosterLock::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = LeaveRequestService::new(
        directory.clone(),
        ledger.clone(),
        roster.clone(),
        notifier.clone(),
        policy(limits),
        Duration::from_millis(250),
    );
    Harness {
        service,
        directory,
        ledger,
        roster,
        notifier,
    }
}

/// Pre-load approvals for a slot as if submitted earlier by other staff.
pub(super) fn seed_approvals(ledger: &InMemoryRequestLedger, slot: SlotKey, count: u64) {
    for offset in 0..count {
        ledger
            .append(NewLeaveRequest {
                staff_id: StaffId(10_000 + offset),
                slot,
                seniority: SeniorityKey::new(hired(2000, 1, 1), 1),
                decision: LeaveDecision::Approved,
            })
            .expect("seed approval");
    }
}

pub(super) fn balance_of(harness: &Harness, id: u64) -> u32 {
    use crate::workflows::leave::StaffDirectory;
    harness
        .directory
        .lookup(StaffId(id))
        .expect("staff present")
        .pto_balance
}

#[derive(Default)]
pub(super) struct FailingNotifier {
    attempts: std::sync::atomic::AtomicUsize,
}

impl FailingNotifier {
    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Notifier for FailingNotifier {
    fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Transport("smtp relay refused connection".to_string()))
    }
}

/// Wraps the in-memory ledger and refuses appends while `fail_appends` is set.
#[derive(Default)]
pub(super) struct FlakyLedger {
    pub(super) inner: InMemoryRequestLedger,
    pub(super) fail_appends: AtomicBool,
}

impl RequestLedger for FlakyLedger {
    fn approved_count(&self, slot: SlotKey) -> Result<u32, LedgerError> {
        self.inner.approved_count(slot)
    }

    fn waitlist_entries(&self, slot: SlotKey) -> Result<Vec<WaitlistEntry>, LedgerError> {
        self.inner.waitlist_entries(slot)
    }

    fn append(&self, request: NewLeaveRequest) -> Result<RequestId, LedgerError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("database offline".to_string()));
        }
        self.inner.append(request)
    }

    fn fetch(&self, id: RequestId) -> Result<Option<LeaveRequest>, LedgerError> {
        self.inner.fetch(id)
    }

    fn set_approved(&self, id: RequestId) -> Result<LeaveRequest, LedgerError> {
        self.inner.set_approved(id)
    }
}

type Gate = (mpsc::Sender<()>, mpsc::Receiver<()>);

/// Wraps the in-memory ledger; once armed, the next `approved_count` parks until released.
#[derive(Default)]
pub(super) struct GatedLedger {
    pub(super) inner: InMemoryRequestLedger,
    gate: Mutex<Option<Gate>>,
}

impl GatedLedger {
    /// Returns the "caller is parked" signal and the release handle.
    pub(super) fn arm(&self) -> (mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }
}

impl RequestLedger for GatedLedger {
    fn approved_count(&self, slot: SlotKey) -> Result<u32, LedgerError> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            entered.send(()).expect("signal parked caller");
            release.recv().expect("wait for release");
        }
        self.inner.approved_count(slot)
    }

    fn waitlist_entries(&self, slot: SlotKey) -> Result<Vec<WaitlistEntry>, LedgerError> {
        self.inner.waitlist_entries(slot)
    }

    fn append(&self, request: NewLeaveRequest) -> Result<RequestId, LedgerError> {
        self.inner.append(request)
    }

    fn fetch(&self, id: RequestId) -> Result<Option<LeaveRequest>, LedgerError> {
        self.inner.fetch(id)
    }

    fn set_approved(&self, id: RequestId) -> Result<LeaveRequest, LedgerError> {
        self.inner.set_approved(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
