use chrono::NaiveDate;
use clap::Args;
use pto_scheduler::error::AppError;
use pto_scheduler::workflows::leave::{
    CapacityPolicy, InMemoryNotifier, InMemoryRequestLedger, InMemoryRosterLock,
    InMemoryStaffDirectory, LeaveDecision, LeaveRequestService, LeaveServiceError, SeniorityKey,
    ShiftCode, StaffDirectory, StaffId, StaffMember, SubmissionReceipt,
};
use pto_scheduler::workflows::roster::StaffRosterImporter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const BUNDLED_ROSTER: &[u8] = include_bytes!("../../../crates/pto-scheduler/staff_roster.csv");
const COLLEAGUE_ID_BASE: u64 = 9_000;

type DemoService = LeaveRequestService<
    InMemoryStaffDirectory,
    InMemoryRequestLedger,
    InMemoryRosterLock,
    InMemoryNotifier,
>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Leave date to request (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date, default_value = "2025-12-24")]
    pub(crate) date: NaiveDate,
    /// Shift whose slot is filled and then contested
    #[arg(long, default_value_t = 1)]
    pub(crate) shift: u8,
    /// Roster CSV to load instead of the bundled sample roster
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
    /// Print each submission receipt as a JSON line
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterCheckArgs {
    /// Roster CSV export (id,name,badge_number,shift,start_date,class_rank,pto_balance,email)
    pub(crate) path: PathBuf,
    /// Emit the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        date,
        shift,
        roster_csv,
        json,
    } = args;
    let shift = ShiftCode(shift);

    let staff = match roster_csv {
        Some(path) => StaffRosterImporter::from_path(path)?,
        None => StaffRosterImporter::from_reader(BUNDLED_ROSTER)?,
    };
    let contenders: Vec<StaffMember> = staff
        .iter()
        .filter(|member| member.shift == shift)
        .cloned()
        .collect();

    let directory = Arc::new(InMemoryStaffDirectory::new(staff));
    let ledger = Arc::new(InMemoryRequestLedger::default());
    let roster = Arc::new(InMemoryRosterLock::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let standard = CapacityPolicy::standard();
    let limit = standard
        .limit_for(shift)
        .map_err(LeaveServiceError::from)?;

    let service = demo_service(&directory, &ledger, &roster, &notifier, standard);

    println!("PTO scheduler demo for {date} (Shift {shift})");
    println!("Capacity limit: {limit} approved requests");

    // Colleagues outside the roster book the slot out first.
    for offset in 0..u64::from(limit) {
        directory.upsert(colleague(COLLEAGUE_ID_BASE + offset, shift));
        service.submit(StaffId(COLLEAGUE_ID_BASE + offset), date)?;
    }
    println!("- {limit} colleagues already approved; the slot is full");

    println!("\nRoster submissions");
    for member in &contenders {
        let receipt = service.submit(member.id, date)?;
        render_receipt(member, &receipt, json)?;
    }

    let standings = service.waitlist(date, shift)?;
    println!("\nWaitlist ({} entries)", standings.len());
    for standing in &standings {
        let name = directory
            .lookup(standing.staff_id)
            .map(|member| member.name)
            .unwrap_or_else(|_| standing.staff_id.to_string());
        println!(
            "  {}. {} (hired {}, class rank {})",
            standing.position, name, standing.seniority.hire_date, standing.seniority.class_rank
        );
    }

    let Some(head) = standings.first() else {
        println!("\nNobody is waitlisted; nothing to approve.");
        return Ok(());
    };

    println!("\nSupervisor approves the waitlist head past the limit of {limit}");
    let approval = service.approve(head.request_id)?;
    println!("- {}", approval.message());
    for notice in notifier.sent() {
        println!("  To: {} | Subject: {}", notice.to, notice.subject);
        println!("  {}", notice.body);
    }
    println!(
        "- roster locks held: {} | remaining waitlist: {}",
        roster.entries().len(),
        service.waitlist(date, shift)?.len()
    );

    println!("\nBalances after the demo");
    for member in &contenders {
        if let Ok(current) = directory.lookup(member.id) {
            println!(
                "  {}: {} -> {} day(s)",
                member.name, member.pto_balance, current.pto_balance
            );
        }
    }

    Ok(())
}

pub(crate) fn run_roster_check(args: RosterCheckArgs) -> Result<(), AppError> {
    let members = StaffRosterImporter::from_path(&args.path)?;
    let summaries = summarize_roster(&members);

    if args.json {
        let payload = serde_json::to_string_pretty(&summaries)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{payload}");
        return Ok(());
    }

    println!("Roster {} ({} staff)", args.path.display(), members.len());
    for summary in &summaries {
        println!(
            "- Shift {}: {} staff | {} PTO days | {} with no balance | most senior: {}",
            summary.shift,
            summary.staff,
            summary.total_balance,
            summary.zero_balance,
            summary.most_senior.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ShiftSummary {
    pub(crate) shift: ShiftCode,
    pub(crate) staff: usize,
    pub(crate) total_balance: u32,
    pub(crate) zero_balance: usize,
    pub(crate) most_senior: Option<String>,
}

pub(crate) fn summarize_roster(members: &[StaffMember]) -> Vec<ShiftSummary> {
    let mut by_shift: BTreeMap<ShiftCode, Vec<&StaffMember>> = BTreeMap::new();
    for member in members {
        by_shift.entry(member.shift).or_default().push(member);
    }

    by_shift
        .into_iter()
        .map(|(shift, staff)| ShiftSummary {
            shift,
            staff: staff.len(),
            total_balance: staff.iter().map(|member| member.pto_balance).sum(),
            zero_balance: staff.iter().filter(|member| member.pto_balance == 0).count(),
            most_senior: staff
                .iter()
                .min_by_key(|member| member.seniority)
                .map(|member| member.name.clone()),
        })
        .collect()
}

fn demo_service(
    directory: &Arc<InMemoryStaffDirectory>,
    ledger: &Arc<InMemoryRequestLedger>,
    roster: &Arc<InMemoryRosterLock>,
    notifier: &Arc<InMemoryNotifier>,
    policy: CapacityPolicy,
) -> DemoService {
    LeaveRequestService::new(
        directory.clone(),
        ledger.clone(),
        roster.clone(),
        notifier.clone(),
        policy,
        Duration::from_millis(250),
    )
}

fn colleague(id: u64, shift: ShiftCode) -> StaffMember {
    let hired = NaiveDate::from_ymd_opt(1998, 1, 5).unwrap_or_default();
    StaffMember {
        id: StaffId(id),
        name: format!("Colleague {id}"),
        badge_number: format!("C-{id}"),
        shift,
        seniority: SeniorityKey::new(hired, 1),
        pto_balance: 1,
        email: format!("colleague{id}@example.org"),
    }
}

fn render_receipt(
    member: &StaffMember,
    receipt: &SubmissionReceipt,
    json: bool,
) -> Result<(), AppError> {
    if json {
        let line = serde_json::to_string(receipt)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{line}");
        return Ok(());
    }

    let marker = match receipt.decision {
        LeaveDecision::Approved => "+",
        LeaveDecision::Denied { .. } => "x",
        LeaveDecision::Waitlisted { .. } => "~",
    };
    println!(
        "  [{marker}] {} (balance {} -> {}): {}",
        member.name,
        member.pto_balance,
        receipt.remaining_balance,
        receipt.message()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_roster_summary_covers_each_shift() {
        let members = StaffRosterImporter::from_reader(BUNDLED_ROSTER).expect("bundled roster");
        let summaries = summarize_roster(&members);

        let shifts: Vec<u8> = summaries.iter().map(|summary| summary.shift.0).collect();
        assert_eq!(shifts, vec![1, 2, 3]);
        let first = &summaries[0];
        assert_eq!(first.staff, 4);
        assert_eq!(first.zero_balance, 1);
        assert_eq!(first.most_senior.as_deref(), Some("Priya Natarajan"));
    }

    #[test]
    fn demo_runs_against_bundled_roster() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 12, 24).expect("valid date"),
            shift: 1,
            roster_csv: None,
            json: false,
        };
        run_demo(args).expect("demo completes");
    }
}
