use serde::Serialize;

use super::domain::{RequestId, SeniorityKey, StaffId, WaitlistEntry};

/// Seniority ordering for one slot's waitlist.
pub struct WaitlistRanker;

/// A waitlist entry paired with its 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitlistStanding {
    pub position: u32,
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub seniority: SeniorityKey,
}

impl WaitlistRanker {
    /// Ascending seniority. `sort_by_key` is stable, so identical keys keep their input order.
    pub fn rank(mut entries: Vec<WaitlistEntry>) -> Vec<WaitlistEntry> {
        entries.sort_by_key(|entry| entry.seniority);
        entries
    }

    pub fn standings(entries: Vec<WaitlistEntry>) -> Vec<WaitlistStanding> {
        Self::rank(entries)
            .into_iter()
            .zip(1u32..)
            .map(|(entry, position)| WaitlistStanding {
                position,
                request_id: entry.request_id,
                staff_id: entry.staff_id,
                seniority: entry.seniority,
            })
            .collect()
    }

    /// Position a newcomer with `seniority` takes when appended after `existing`. Matches the
    /// stable re-sort of `existing` plus the newcomer: equal keys already queued stay ahead.
    pub fn insertion_position(existing: &[WaitlistEntry], seniority: SeniorityKey) -> u32 {
        let ahead = existing
            .iter()
            .filter(|entry| entry.seniority <= seniority)
            .count();
        u32::try_from(ahead).map_or(u32::MAX, |ahead| ahead.saturating_add(1))
    }

    /// Position of `request_id` once ranked, if it is present.
    pub fn position_of(entries: Vec<WaitlistEntry>, request_id: RequestId) -> Option<u32> {
        Self::standings(entries)
            .into_iter()
            .find(|standing| standing.request_id == request_id)
            .map(|standing| standing.position)
    }
}
