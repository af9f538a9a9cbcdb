use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use pto_scheduler::workflows::leave::{
    CapacityPolicy, DuplicatePolicy, InMemoryNotifier, InMemoryRequestLedger, InMemoryRosterLock,
    InMemoryStaffDirectory, LeaveDecision, LeaveRequestService, LeaveStatus, RequestLedger,
    RosterLock, SeniorityKey, ShiftCode, SlotKey, StaffDirectory, StaffId, StaffMember,
};

type Service = LeaveRequestService<
    InMemoryStaffDirectory,
    InMemoryRequestLedger,
    InMemoryRosterLock,
    InMemoryNotifier,
>;

struct Stores {
    directory: Arc<InMemoryStaffDirectory>,
    ledger: Arc<InMemoryRequestLedger>,
    roster: Arc<InMemoryRosterLock>,
    notifier: Arc<InMemoryNotifier>,
}

impl Stores {
    fn new(staff: Vec<StaffMember>) -> Self {
        Self {
            directory: Arc::new(InMemoryStaffDirectory::new(staff)),
            ledger: Arc::new(InMemoryRequestLedger::new(DuplicatePolicy::Reject)),
            roster: Arc::new(InMemoryRosterLock::default()),
            notifier: Arc::new(InMemoryNotifier::default()),
        }
    }

    fn service(&self, policy: CapacityPolicy) -> Service {
        LeaveRequestService::new(
            self.directory.clone(),
            self.ledger.clone(),
            self.roster.clone(),
            self.notifier.clone(),
            policy,
            Duration::from_secs(5),
        )
    }

    fn balance(&self, id: u64) -> u32 {
        self.directory
            .lookup(StaffId(id))
            .expect("staff present")
            .pto_balance
    }
}

fn holiday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 4).expect("valid date")
}

fn member(id: u64, shift: u8, hire_date: NaiveDate, rank: u32, balance: u32) -> StaffMember {
    StaffMember {
        id: StaffId(id),
        name: format!("Staff {id}"),
        badge_number: format!("B-{id}"),
        shift: ShiftCode(shift),
        seniority: SeniorityKey::new(hire_date, rank),
        pto_balance: balance,
        email: format!("staff{id}@example.org"),
    }
}

fn limits(pairs: &[(u8, u32)]) -> CapacityPolicy {
    CapacityPolicy::new(
        pairs
            .iter()
            .map(|(shift, limit)| (ShiftCode(*shift), *limit))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn full_shift_waitlists_then_approval_locks_roster() {
    let hired = NaiveDate::from_ymd_opt(2009, 4, 1).expect("valid date");
    let mut staff: Vec<StaffMember> = (1..=25).map(|id| member(id, 1, hired, 1, 1)).collect();
    staff.push(member(100, 1, hired, 9, 3));
    let stores = Stores::new(staff);
    let service = stores.service(CapacityPolicy::standard());

    for id in 1..=25 {
        let receipt = service.submit(StaffId(id), holiday()).expect("approved");
        assert_eq!(receipt.decision, LeaveDecision::Approved);
    }

    let waitlisted = service
        .submit(StaffId(100), holiday())
        .expect("waitlisted");
    assert_eq!(waitlisted.decision, LeaveDecision::Waitlisted { position: 1 });
    assert_eq!(stores.balance(100), 2);

    let receipt = service
        .approve(waitlisted.request_id)
        .expect("approval succeeds");

    assert_eq!(receipt.request.status, LeaveStatus::Approved);
    assert!(receipt.notified);
    assert_eq!(stores.balance(100), 2);
    assert_eq!(
        stores
            .roster
            .entries_for(waitlisted.request_id)
            .expect("roster entries")
            .len(),
        1
    );
    assert_eq!(stores.notifier.sent().len(), 1);
    assert_eq!(
        stores
            .ledger
            .approved_count(SlotKey::new(holiday(), ShiftCode(1)))
            .expect("count"),
        26
    );
}

#[test]
fn empty_balance_is_denied_and_recorded() {
    let stores = Stores::new(vec![member(
        1,
        2,
        NaiveDate::from_ymd_opt(2020, 5, 5).expect("valid date"),
        1,
        0,
    )]);
    let service = stores.service(CapacityPolicy::standard());

    let receipt = service.submit(StaffId(1), holiday()).expect("denied");
    assert_eq!(receipt.decision.status(), LeaveStatus::Denied);
    assert_eq!(stores.balance(1), 0);
    assert_eq!(stores.ledger.all().len(), 1);
}

#[test]
fn class_rank_orders_same_day_hires() {
    let same_day = NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid date");
    let stores = Stores::new(vec![member(1, 3, same_day, 5, 2), member(2, 3, same_day, 2, 2)]);
    let service = stores.service(limits(&[(3, 0)]));

    let a = service.submit(StaffId(1), holiday()).expect("a waitlisted");
    let b = service.submit(StaffId(2), holiday()).expect("b waitlisted");

    assert_eq!(service.get(b.request_id).expect("b").waitlist_position, Some(1));
    assert_eq!(service.get(a.request_id).expect("a").waitlist_position, Some(2));
}

#[test]
fn concurrent_submissions_never_oversell_a_slot() {
    const STAFF: u64 = 40;
    let base = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date");
    let staff = (1..=STAFF)
        .map(|id| {
            let hired = base + chrono::Duration::days(i64::try_from(id % 9).expect("small"));
            member(id, 3, hired, u32::try_from(id % 4).expect("small"), 2)
        })
        .collect();
    let stores = Stores::new(staff);
    let service = stores.service(CapacityPolicy::standard());

    thread::scope(|scope| {
        for id in 1..=STAFF {
            let service = &service;
            scope.spawn(move || {
                service
                    .submit(StaffId(id), holiday())
                    .expect("submission recorded");
            });
        }
    });

    let slot = SlotKey::new(holiday(), ShiftCode(3));
    let records = stores.ledger.for_slot(slot);
    assert_eq!(records.len(), usize::try_from(STAFF).expect("fits"));

    let approved = records
        .iter()
        .filter(|record| record.status == LeaveStatus::Approved)
        .count();
    assert_eq!(approved, 7);

    let mut positions: Vec<u32> = records
        .iter()
        .filter(|record| record.status == LeaveStatus::Waitlisted)
        .map(|record| record.waitlist_position.expect("waitlisted rows carry a position"))
        .collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=u32::try_from(STAFF).expect("fits") - 7).collect();
    assert_eq!(positions, expected);

    let standings = service.waitlist(holiday(), ShiftCode(3)).expect("waitlist");
    assert!(standings
        .windows(2)
        .all(|pair| pair[0].seniority <= pair[1].seniority));

    let submitters: HashSet<StaffId> = records.iter().map(|record| record.staff_id).collect();
    assert_eq!(submitters.len(), records.len());
    assert!((1..=STAFF).all(|id| stores.balance(id) == 1));
}

#[test]
fn racing_approvals_promote_each_request_once() {
    let hired = NaiveDate::from_ymd_opt(2012, 12, 12).expect("valid date");
    let stores = Stores::new((1..=12).map(|id| member(id, 2, hired, id as u32, 1)).collect());
    let service = stores.service(limits(&[(2, 0)]));
    let request_ids: Vec<_> = (1..=12)
        .map(|id| {
            service
                .submit(StaffId(id), holiday())
                .expect("waitlisted")
                .request_id
        })
        .collect();

    // Two supervisors click approve on the same five requests.
    let contested = &request_ids[2..7];
    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = contested
            .iter()
            .chain(contested.iter())
            .map(|request_id| {
                let service = &service;
                let request_id = *request_id;
                scope.spawn(move || service.approve(request_id).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("approval thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 5);
    assert_eq!(stores.roster.entries().len(), 5);
    assert_eq!(stores.notifier.sent().len(), 5);
    for request_id in contested {
        assert_eq!(
            stores
                .roster
                .entries_for(*request_id)
                .expect("roster entries")
                .len(),
            1
        );
    }

    let mut waiting: Vec<(u32, StaffId)> = stores
        .ledger
        .all()
        .into_iter()
        .filter(|record| record.status == LeaveStatus::Waitlisted)
        .filter_map(|record| record.waitlist_position.map(|position| (position, record.staff_id)))
        .collect();
    waiting.sort_unstable();
    let expected: Vec<(u32, StaffId)> = [1, 2, 8, 9, 10, 11, 12]
        .into_iter()
        .zip(1..)
        .map(|(staff, position)| (position, StaffId(staff)))
        .collect();
    assert_eq!(waiting, expected);
}
