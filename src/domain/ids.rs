//! Node id allocation.

use chrono::Utc;

use crate::domain::NodeId;

/// Hands out fresh node ids.
pub trait IdSource {
    /// Return an id never returned before by this source.
    fn next_id(&mut self) -> NodeId;

    /// Make sure every future id is strictly greater than `floor`.
    fn reserve_above(&mut self, floor: u64);
}

/// Millisecond-clock ids, forced strictly monotonic.
///
/// Several ids requested within the same millisecond come out as
/// consecutive integers, so a parent and all its generated children never collide.
#[derive(Debug, Default, Clone)]
pub struct ClockIdSource {
    last: u64,
}

impl ClockIdSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_millis() -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

impl IdSource for ClockIdSource {
    fn next_id(&mut self) -> NodeId {
        let next = Self::now_millis().max(self.last.saturating_add(1));
        self.last = next;
        NodeId::Number(next)
    }

    fn reserve_above(&mut self, floor: u64) {
        self.last = self.last.max(floor);
    }
}

/// Counter ids starting at a fixed value. Deterministic, used for tests and fixtures.
#[derive(Debug, Clone)]
pub struct SequentialIdSource {
    next: u64,
}

impl SequentialIdSource {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIdSource {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdSource for SequentialIdSource {
    fn next_id(&mut self) -> NodeId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        NodeId::Number(id)
    }

    fn reserve_above(&mut self, floor: u64) {
        self.next = self.next.max(floor.saturating_add(1));
    }
}
