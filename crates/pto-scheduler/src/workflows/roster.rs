use crate::workflows::leave::{SeniorityKey, ShiftCode, StaffId, StaffMember};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum StaffRosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidStartDate { row: usize, value: String },
    DuplicateStaff { row: usize, id: StaffId },
}

impl std::fmt::Display for StaffRosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRosterImportError::Io(err) => write!(f, "failed to read staff roster: {}", err),
            StaffRosterImportError::Csv(err) => write!(f, "invalid staff roster CSV data: {}", err),
            StaffRosterImportError::InvalidStartDate { row, value } => write!(
                f,
                "row {}: start_date '{}' is not a YYYY-MM-DD date",
                row, value
            ),
            StaffRosterImportError::DuplicateStaff { row, id } => {
                write!(f, "row {}: staff id {} appears more than once", row, id)
            }
        }
    }
}

impl std::error::Error for StaffRosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StaffRosterImportError::Io(err) => Some(err),
            StaffRosterImportError::Csv(err) => Some(err),
            StaffRosterImportError::InvalidStartDate { .. }
            | StaffRosterImportError::DuplicateStaff { .. } => None,
        }
    }
}

impl From<std::io::Error> for StaffRosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for StaffRosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct StaffRow {
    id: u64,
    name: String,
    badge_number: String,
    shift: u8,
    start_date: String,
    class_rank: u32,
    pto_balance: u32,
    email: String,
}

impl StaffRow {
    fn into_member(self, row: usize) -> Result<StaffMember, StaffRosterImportError> {
        let hire_date = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").map_err(
            |_| StaffRosterImportError::InvalidStartDate {
                row,
                value: self.start_date.clone(),
            },
        )?;

        Ok(StaffMember {
            id: StaffId(self.id),
            name: self.name,
            badge_number: self.badge_number,
            shift: ShiftCode(self.shift),
            seniority: SeniorityKey::new(hire_date, self.class_rank),
            pto_balance: self.pto_balance,
            email: self.email,
        })
    }
}

/// Loads staff records from the roster office CSV export
/// (`id,name,badge_number,shift,start_date,class_rank,pto_balance,email`).
pub struct StaffRosterImporter;

impl StaffRosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<StaffMember>, StaffRosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<StaffMember>, StaffRosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut seen = HashSet::new();
        let mut members = Vec::new();

        // Row numbers are 1-based and count the header line.
        for (index, record) in csv_reader.deserialize::<StaffRow>().enumerate() {
            let row = index + 2;
            let member = record?.into_member(row)?;
            if !seen.insert(member.id) {
                return Err(StaffRosterImportError::DuplicateStaff { row, id: member.id });
            }
            members.push(member);
        }

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "id,name,badge_number,shift,start_date,class_rank,pto_balance,email\n";

    fn import(body: &str) -> Result<Vec<StaffMember>, StaffRosterImportError> {
        StaffRosterImporter::from_reader(Cursor::new(format!("{HEADER}{body}")))
    }

    #[test]
    fn parses_staff_rows() {
        let members = import(
            "1, Dana Ortiz ,B-1001,1,2010-01-01,5,3,dana@example.org\n\
             2,Lee Park,B-1002,3,2014-06-30,12,0,lee@example.org\n",
        )
        .expect("roster parses");

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Dana Ortiz");
        assert_eq!(members[0].shift, ShiftCode(1));
        assert_eq!(
            members[0].seniority,
            SeniorityKey::new(NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid"), 5)
        );
        assert_eq!(members[1].pto_balance, 0);
    }

    #[test]
    fn reports_row_of_bad_start_date() {
        let err = import("1,Dana Ortiz,B-1001,1,01/01/2010,5,3,dana@example.org\n")
            .expect_err("bad date rejected");
        assert!(matches!(
            err,
            StaffRosterImportError::InvalidStartDate { row: 2, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = import(
            "7,Dana Ortiz,B-1001,1,2010-01-01,5,3,dana@example.org\n\
             7,Lee Park,B-1002,3,2014-06-30,12,0,lee@example.org\n",
        )
        .expect_err("duplicate rejected");
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn negative_balance_is_a_csv_error() {
        let err = import("1,Dana Ortiz,B-1001,1,2010-01-01,5,-1,dana@example.org\n")
            .expect_err("negative balance rejected");
        assert!(matches!(err, StaffRosterImportError::Csv(_)));
    }
}
