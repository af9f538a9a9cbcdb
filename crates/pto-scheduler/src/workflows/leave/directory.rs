use super::domain::{StaffId, StaffMember};

/// Read access to staff records plus the one balance mutation the scheduler performs.
pub trait StaffDirectory: Send + Sync {
    fn lookup(&self, id: StaffId) -> Result<StaffMember, DirectoryError>;

    /// Consume one leave day, returning the remaining balance. Must be atomic per staff member.
    fn decrement_balance(&self, id: StaffId) -> Result<u32, DirectoryError>;

    /// Give back a day consumed by `decrement_balance` whose ledger write did not land.
    fn restore_balance(&self, id: StaffId) -> Result<u32, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("staff member {0} not found")]
    NotFound(StaffId),
    #[error("staff member {0} has no remaining leave balance")]
    InsufficientBalance(StaffId),
    #[error("staff directory unavailable: {0}")]
    Unavailable(String),
}
