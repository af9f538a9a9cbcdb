use chrono::NaiveDate;
use pto_scheduler::workflows::leave::{SeniorityKey, ShiftCode, StaffId};
use pto_scheduler::workflows::roster::{StaffRosterImportError, StaffRosterImporter};

#[test]
fn bundled_roster_imports_every_officer() {
    let data = include_bytes!("../staff_roster.csv");
    let members = StaffRosterImporter::from_reader(&data[..]).expect("roster imports");

    assert_eq!(members.len(), 10);
    let marcus = members
        .iter()
        .find(|member| member.id == StaffId(2))
        .expect("marcus present");
    assert_eq!(marcus.shift, ShiftCode(1));
    assert_eq!(
        marcus.seniority,
        SeniorityKey::new(NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid date"), 2)
    );
    assert!(members
        .iter()
        .all(|member| (1..=3).contains(&member.shift.0)));
}

#[test]
fn missing_roster_file_is_an_io_error() {
    let err = StaffRosterImporter::from_path("does/not/exist.csv").expect_err("missing file");
    assert!(matches!(err, StaffRosterImportError::Io(_)));
}
