//! Pure warehouse simulation logic for Stockroom.
//!
//! This crate contains the whole simulation core of the game and nothing
//! else: no rendering, no input polling, no clock. A presentation layer reads
//! state through the query methods of [`RoundController`] and mutates it
//! only through its command methods.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Carry capacity, stocking ceiling, rewards, item catalog |
//! | [`layout`] | Rack layout description and the default two-zone floor |
//! | [`slots`] | Slot geometry and the stock ledger (add/remove, snapshot/restore) |
//! | [`carrier`] | Bounded set of items the picker is holding |
//! | [`tasks`] | Pick order and put-away task generation |
//! | [`round`] | Round configuration, phases, round state |
//! | [`controller`] | Round/phase state machine and the command API |
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use stockroom_logic::controller::RoundController;
//! use stockroom_logic::round::{Mode, RoundConfig};
//! use stockroom_logic::slots::SlotStore;
//!
//! let mut store = SlotStore::default();
//! store.add_stock("A-01-1", "Red Box", 1).unwrap();
//!
//! let mut controller = RoundController::new(store, StdRng::seed_from_u64(7));
//! let config = RoundConfig::new("demo", vec![Mode::Picking], 60);
//! controller.start_round(Some(config)).unwrap();
//!
//! controller.pick_item("A-01-1").unwrap();
//! controller.complete_order().unwrap();
//! assert_eq!(controller.round_state().unwrap().score, 100);
//! assert!(controller.round_state().unwrap().is_finished);
//! ```

pub mod carrier;
pub mod constants;
pub mod controller;
pub mod layout;
pub mod round;
pub mod slots;
pub mod tasks;

pub use controller::{CommandError, RoundController};
pub use slots::{Slot, SlotContents, SlotStore, StockError};
