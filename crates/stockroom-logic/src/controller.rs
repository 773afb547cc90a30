//! Round controller: the phase state machine and the command API.
//!
//! ```text
//! NotStarted ──start_round──▶ Phase(0) ──▶ Phase(1) ──▶ … ──▶ Finished
//!                                 ▲                              │
//!                                 └──────── restart_round ───────┘
//! ```
//!
//! A phase completes when its order ships (picking) or when every inbound
//! task is put away (inbound). Completing the last phase finishes the round.
//!
//! Every command validates first and commits after, so a rejected command
//! leaves stock, carrier, workload and score exactly as they were.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carrier::{CarrierFull, InventoryCarrier};
use crate::constants::rewards::{ITEM_PUT_AWAY, ORDER_SHIPPED, TIME_BONUS_PER_SECOND};
use crate::constants::SLOT_STOCK_CEILING;
use crate::round::{generate_round_config, Mode, RoundConfig, RoundConfigError, RoundState};
use crate::slots::{Slot, SlotStore, StockError};
use crate::tasks::{generate_inbound_tasks, generate_order, InboundTask, Order, OrderStatus};

/// Work for the active phase. The mode is always the workload's variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workload {
    /// `None` when nothing was in stock at the phase boundary.
    Picking(Option<Order>),
    Inbound(Vec<InboundTask>),
}

impl Workload {
    pub fn mode(&self) -> Mode {
        match self {
            Workload::Picking(_) => Mode::Picking,
            Workload::Inbound(_) => Mode::Inbound,
        }
    }
}

/// Broad class of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    CapacityExceeded,
}

/// Why a command was rejected. A rejected command changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no round has been started")]
    RoundNotStarted,
    #[error("round is finished")]
    RoundFinished,
    #[error("command needs {expected:?} mode, current mode is {actual:?}")]
    WrongMode { expected: Mode, actual: Mode },
    #[error("no active order")]
    NoActiveOrder,
    #[error("order has nothing left to pick at slot {0}")]
    NothingToPickAt(String),
    #[error("order is {0:?}, not ready to ship")]
    OrderNotPacked(OrderStatus),
    #[error("carrier is full ({capacity} items)")]
    CarrierFull { capacity: usize },
    #[error("no inbound item waiting at the dock")]
    NothingToReceive,
    #[error("no received task targets slot {0}")]
    NoTaskForSlot(String),
    #[error("{0} is not being carried")]
    ItemNotCarried(String),
    #[error("slot {slot} is at the stocking ceiling of {ceiling}")]
    SlotAtCeiling { slot: String, ceiling: u32 },
    #[error(transparent)]
    Stock(#[from] StockError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::NothingToPickAt(_)
            | CommandError::NothingToReceive
            | CommandError::NoTaskForSlot(_)
            | CommandError::ItemNotCarried(_)
            | CommandError::NoActiveOrder => ErrorKind::NotFound,
            CommandError::RoundNotStarted
            | CommandError::RoundFinished
            | CommandError::WrongMode { .. }
            | CommandError::OrderNotPacked(_) => ErrorKind::InvalidState,
            CommandError::CarrierFull { .. } | CommandError::SlotAtCeiling { .. } => {
                ErrorKind::CapacityExceeded
            }
            CommandError::Stock(err) => match err {
                StockError::UnknownSlot(_) | StockError::NoSnapshot => ErrorKind::NotFound,
                StockError::MixedItemType { .. }
                | StockError::InsufficientStock { .. }
                | StockError::QuantityOverflow(_) => ErrorKind::CapacityExceeded,
                StockError::ZeroQuantity(_) => ErrorKind::InvalidState,
            },
        }
    }
}

impl From<CarrierFull> for CommandError {
    fn from(full: CarrierFull) -> Self {
        CommandError::CarrierFull {
            capacity: full.capacity,
        }
    }
}

/// Bonus for seconds left on the clock: `floor(remaining * 10)`.
pub fn calculate_time_bonus(remaining_secs: f64) -> u32 {
    (remaining_secs.max(0.0) * TIME_BONUS_PER_SECOND).floor() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    InProgress,
    /// Every phase done before the clock ran out.
    Completed,
    /// Clock ran out with phases left.
    TimedOut,
}

/// Final tally for the presentation layer's round-end screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_id: String,
    pub outcome: RoundOutcome,
    pub score: u32,
    pub time_bonus: u32,
    pub total: u32,
}

/// Owns the floor, the picker's carrier and the round in play.
///
/// `R` is the random source used for round and workload generation.
pub struct RoundController<R> {
    store: SlotStore,
    rng: R,
    carrier: InventoryCarrier,
    workload: Workload,
    round: Option<RoundState>,
}

impl<R: Rng> RoundController<R> {
    pub fn new(store: SlotStore, rng: R) -> Self {
        Self {
            store,
            rng,
            carrier: InventoryCarrier::default(),
            workload: Workload::Picking(None),
            round: None,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn into_store(self) -> SlotStore {
        self.store
    }

    pub fn all_slots(&self) -> &[Slot] {
        self.store.all_slots()
    }

    pub fn get_slot_at(&self, x: i32, y: i32) -> Option<&Slot> {
        self.store.get_slot_at(x, y)
    }

    pub fn get_slot_by_id(&self, id: &str) -> Option<&Slot> {
        self.store.get_slot_by_id(id)
    }

    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    pub fn current_order(&self) -> Option<&Order> {
        match &self.workload {
            Workload::Picking(order) => order.as_ref(),
            Workload::Inbound(_) => None,
        }
    }

    /// Empty outside inbound mode.
    pub fn inbound_tasks(&self) -> &[InboundTask] {
        match &self.workload {
            Workload::Inbound(tasks) => tasks,
            Workload::Picking(_) => &[],
        }
    }

    pub fn inventory(&self) -> &InventoryCarrier {
        &self.carrier
    }

    pub fn mode(&self) -> Mode {
        self.workload.mode()
    }

    pub fn round_state(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn current_phase(&self) -> Option<Mode> {
        self.round.as_ref().and_then(RoundState::current_phase)
    }

    pub fn can_pick_item(&self) -> bool {
        self.carrier.has_space()
    }

    /// True when the inbound batch is non-empty and every task is put away.
    pub fn all_inbound_completed(&self) -> bool {
        let tasks = self.inbound_tasks();
        !tasks.is_empty() && tasks.iter().all(|t| t.is_completed)
    }

    /// Score with the time bonus applied if the round finished naturally.
    pub fn round_summary(&self, remaining_secs: f64) -> Option<RoundSummary> {
        let round = self.round.as_ref()?;
        let outcome = if round.is_finished {
            RoundOutcome::Completed
        } else if remaining_secs <= 0.0 {
            RoundOutcome::TimedOut
        } else {
            RoundOutcome::InProgress
        };
        let time_bonus = match outcome {
            RoundOutcome::Completed => calculate_time_bonus(remaining_secs),
            RoundOutcome::InProgress | RoundOutcome::TimedOut => 0,
        };
        Some(RoundSummary {
            round_id: round.config.id.clone(),
            outcome,
            score: round.score,
            time_bonus,
            total: round.score.saturating_add(time_bonus),
        })
    }

    // ── Round lifecycle ─────────────────────────────────────────────────

    /// Start a round with `config`, or with a generated one if `None`.
    ///
    /// Records the current stock as the restore point for [`Self::restart_round`].
    pub fn start_round(
        &mut self,
        config: Option<RoundConfig>,
    ) -> Result<&RoundState, RoundConfigError> {
        let config = match config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => generate_round_config(&mut self.rng),
        };
        let Some(first) = config.phases.first().copied() else {
            return Err(RoundConfigError::NoPhases(config.id));
        };

        self.carrier.clear();
        self.store.snapshot_stock();
        self.enter_phase(first);
        info!(
            "Round {} started: {} phases, {}s",
            config.id,
            config.phases.len(),
            config.time_limit
        );
        Ok(&*self.round.insert(RoundState::new(config)))
    }

    /// Replay the current round from its starting stock with the same config.
    pub fn restart_round(&mut self) -> Result<&RoundState, CommandError> {
        let config = self
            .round
            .as_ref()
            .map(|round| round.config.clone())
            .ok_or(CommandError::RoundNotStarted)?;
        let Some(first) = config.phases.first().copied() else {
            return Err(CommandError::RoundNotStarted);
        };

        self.store.restore_stock()?;
        self.carrier.clear();
        self.enter_phase(first);
        info!("Round {} restarted", config.id);
        Ok(&*self.round.insert(RoundState::new(config)))
    }

    /// Force the mode and regenerate its workload. Does not move the phase
    /// index.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<(), CommandError> {
        self.ensure_in_play()
            .inspect_err(|err| debug!("switch_mode({mode:?}) rejected: {err}"))?;
        self.enter_phase(mode);
        debug!("Mode switched to {mode:?}");
        Ok(())
    }

    fn ensure_in_play(&self) -> Result<&RoundState, CommandError> {
        match &self.round {
            None => Err(CommandError::RoundNotStarted),
            Some(round) if round.is_finished => Err(CommandError::RoundFinished),
            Some(round) => Ok(round),
        }
    }

    fn ensure_mode(&self, expected: Mode) -> Result<(), CommandError> {
        let actual = self.mode();
        if actual != expected {
            return Err(CommandError::WrongMode { expected, actual });
        }
        Ok(())
    }

    fn ensure_carrier_space(&self) -> Result<(), CommandError> {
        if !self.carrier.has_space() {
            return Err(CarrierFull {
                capacity: self.carrier.capacity(),
            }
            .into());
        }
        Ok(())
    }

    fn enter_phase(&mut self, mode: Mode) {
        self.workload = match mode {
            Mode::Picking => Workload::Picking(generate_order(&self.store, &mut self.rng)),
            Mode::Inbound => Workload::Inbound(generate_inbound_tasks(&self.store, &mut self.rng)),
        };
        match &self.workload {
            Workload::Picking(Some(order)) => {
                debug!("Order {} issued with {} lines", order.id, order.items.len())
            }
            Workload::Picking(None) => debug!("No stock available, no order issued"),
            Workload::Inbound(tasks) => debug!("{} inbound tasks issued", tasks.len()),
        }
    }

    /// Advance past the active phase. Score and carrier carry over.
    fn complete_phase(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match round.advance() {
            Some(mode) => {
                info!(
                    "Round {} entering phase {} ({mode:?})",
                    round.config.id, round.current_phase_index
                );
                self.enter_phase(mode);
            }
            None => info!(
                "Round {} finished with score {}",
                round.config.id, round.score
            ),
        }
    }

    fn add_score(&mut self, points: u32) {
        if let Some(round) = self.round.as_mut() {
            round.score = round.score.saturating_add(points);
        }
    }

    // ── Picking ─────────────────────────────────────────────────────────

    /// Pick one unit for the order line at `slot_id`.
    ///
    /// The stock removal must succeed before the pick is recorded.
    pub fn pick_item(&mut self, slot_id: &str) -> Result<(), CommandError> {
        self.try_pick(slot_id)
            .inspect_err(|err| debug!("pick_item({slot_id}) rejected: {err}"))
    }

    fn try_pick(&mut self, slot_id: &str) -> Result<(), CommandError> {
        self.ensure_in_play()?;
        self.ensure_mode(Mode::Picking)?;
        let order = self.current_order().ok_or(CommandError::NoActiveOrder)?;
        let line = order
            .unpicked_item_at(slot_id)
            .ok_or_else(|| CommandError::NothingToPickAt(slot_id.to_string()))?;
        let item_type = order.items[line].item_type.clone();
        self.ensure_carrier_space()?;

        self.store.remove_stock(slot_id, 1)?;
        self.carrier.push(item_type.as_str())?;
        if let Workload::Picking(Some(order)) = &mut self.workload {
            order.record_pick(line);
            debug!(
                "Picked {item_type} from {slot_id}, order {} is {:?}",
                order.id, order.status
            );
        }
        Ok(())
    }

    /// Ship the packed order, empty the carrier, award points and complete
    /// the phase.
    pub fn complete_order(&mut self) -> Result<(), CommandError> {
        self.try_complete_order()
            .inspect_err(|err| debug!("complete_order rejected: {err}"))
    }

    fn try_complete_order(&mut self) -> Result<(), CommandError> {
        self.ensure_in_play()?;
        self.ensure_mode(Mode::Picking)?;
        let Workload::Picking(Some(order)) = &mut self.workload else {
            return Err(CommandError::NoActiveOrder);
        };
        order.ship().map_err(CommandError::OrderNotPacked)?;
        debug!("Order {} shipped", order.id);

        self.carrier.clear();
        self.add_score(ORDER_SHIPPED);
        self.complete_phase();
        Ok(())
    }

    // ── Inbound ─────────────────────────────────────────────────────────

    /// Take the next waiting inbound item from the dock into the carrier.
    pub fn receive_item_from_dock(&mut self) -> Result<&InboundTask, CommandError> {
        let index = self
            .try_receive()
            .inspect_err(|err| debug!("receive_item_from_dock rejected: {err}"))?;
        self.inbound_tasks()
            .get(index)
            .ok_or(CommandError::NothingToReceive)
    }

    fn try_receive(&mut self) -> Result<usize, CommandError> {
        self.ensure_in_play()?;
        self.ensure_mode(Mode::Inbound)?;
        self.ensure_carrier_space()?;
        let Workload::Inbound(tasks) = &mut self.workload else {
            return Err(CommandError::NothingToReceive);
        };
        let index = tasks
            .iter()
            .position(|t| !t.is_received)
            .ok_or(CommandError::NothingToReceive)?;

        let task = &mut tasks[index];
        self.carrier.push(task.item_type.as_str())?;
        task.is_received = true;
        debug!(
            "Received {} for {} from the dock",
            task.item_type, task.target_slot_id
        );
        Ok(index)
    }

    /// Put a carried inbound item away into `slot_id`.
    pub fn put_away_item(&mut self, slot_id: &str) -> Result<(), CommandError> {
        self.try_put_away(slot_id)
            .inspect_err(|err| debug!("put_away_item({slot_id}) rejected: {err}"))
    }

    fn try_put_away(&mut self, slot_id: &str) -> Result<(), CommandError> {
        self.ensure_in_play()?;
        self.ensure_mode(Mode::Inbound)?;
        let tasks = self.inbound_tasks();
        let index = tasks
            .iter()
            .position(|t| t.target_slot_id == slot_id && t.is_received && !t.is_completed)
            .ok_or_else(|| CommandError::NoTaskForSlot(slot_id.to_string()))?;
        let item_type = tasks[index].item_type.clone();
        if !self.carrier.contains(&item_type) {
            return Err(CommandError::ItemNotCarried(item_type));
        }
        let held = self
            .store
            .get_slot_by_id(slot_id)
            .map(Slot::quantity)
            .ok_or_else(|| StockError::UnknownSlot(slot_id.to_string()))?;
        if held >= SLOT_STOCK_CEILING {
            return Err(CommandError::SlotAtCeiling {
                slot: slot_id.to_string(),
                ceiling: SLOT_STOCK_CEILING,
            });
        }

        self.store.add_stock(slot_id, &item_type, 1)?;

        self.carrier.take(&item_type);
        if let Workload::Inbound(tasks) = &mut self.workload {
            tasks[index].is_completed = true;
        }
        self.add_score(ITEM_PUT_AWAY);
        debug!("Put {item_type} away into {slot_id}");

        if self.all_inbound_completed() {
            self.complete_phase();
        }
        Ok(())
    }
}
