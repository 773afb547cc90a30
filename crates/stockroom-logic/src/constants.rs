//! Game constants: capacities, rewards, generation ranges and the item catalog.
//!
//! Capacity ceilings live here rather than in [`crate::slots::SlotStore`]:
//! the ledger enforces conservation only, callers enforce policy.

/// Maximum number of items the picker can hold at once.
pub const CARRY_CAPACITY: usize = 3;

/// Per-slot stocking ceiling. Slots at or above it receive no inbound work.
pub const SLOT_STOCK_CEILING: u32 = 15;

/// Highest quantity a slot can receive when the floor is first stocked.
pub const STARTING_STOCK_MAX: u32 = 10;

pub mod rewards {
    /// Points for shipping a fully picked order.
    pub const ORDER_SHIPPED: u32 = 100;
    /// Points for each inbound item put away.
    pub const ITEM_PUT_AWAY: u32 = 50;
    /// Points per second left on the clock when every phase is done.
    pub const TIME_BONUS_PER_SECOND: f64 = 10.0;
}

pub mod generation {
    /// Phases in a randomly generated round (inclusive).
    pub const MIN_PHASES: usize = 2;
    pub const MAX_PHASES: usize = 4;
    /// Seconds allotted per generated phase (inclusive).
    pub const MIN_PHASE_SECONDS: u32 = 15;
    pub const MAX_PHASE_SECONDS: u32 = 45;
    /// Distinct slots sampled for one order or inbound batch (inclusive).
    pub const MIN_TASK_SLOTS: usize = 1;
    pub const MAX_TASK_SLOTS: usize = 2;
    /// Upper bound (exclusive) of the numeric part of an order id.
    pub const ORDER_ID_RANGE: u32 = 1000;
    /// Upper bound (exclusive) of the numeric part of a round id.
    pub const ROUND_ID_RANGE: u32 = 10_000;
}

/// Item types that can arrive at the dock for an empty slot.
pub const ITEM_CATALOG: [&str; 4] = ["Red Box", "Blue Box", "Green Box", "Yellow Box"];
