use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::ShiftCode;

/// Per-shift ceiling on approved requests for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPolicy {
    limits: BTreeMap<ShiftCode, u32>,
}

impl CapacityPolicy {
    pub fn new(limits: BTreeMap<ShiftCode, u32>) -> Self {
        Self { limits }
    }

    /// Day (25), evening (15), and overnight (7) limits.
    pub fn standard() -> Self {
        Self::new(BTreeMap::from([
            (ShiftCode(1), 25),
            (ShiftCode(2), 15),
            (ShiftCode(3), 7),
        ]))
    }

    pub fn limit_for(&self, shift: ShiftCode) -> Result<u32, CapacityError> {
        self.limits
            .get(&shift)
            .copied()
            .ok_or(CapacityError::UnknownShift(shift))
    }

    /// Whether one more approval fits on `date`. Limits are per shift; `date` is not consulted.
    pub fn has_capacity(
        &self,
        shift: ShiftCode,
        _date: NaiveDate,
        approved_count: u32,
    ) -> Result<bool, CapacityError> {
        Ok(approved_count < self.limit_for(shift)?)
    }

    pub fn shifts(&self) -> impl Iterator<Item = (ShiftCode, u32)> + '_ {
        self.limits.iter().map(|(shift, limit)| (*shift, *limit))
    }
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("shift {0} has no configured capacity limit")]
    UnknownShift(ShiftCode),
}
