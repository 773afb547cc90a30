//! Scripted picker standing in for the keyboard-driven player.
//!
//! Each tick the picker walks a few tiles toward its current goal over open
//! floor, and once standing on it issues exactly one command. Slots are
//! resolved from the picker's tile through `get_slot_at`, the same way a
//! rendered scene resolves the player sprite's position.

use rand::Rng;
use stockroom_logic::controller::CommandError;
use stockroom_logic::round::Mode;
use stockroom_logic::tasks::OrderStatus;
use stockroom_logic::RoundController;

/// Where the picker starts each round.
pub const START_TILE: (i32, i32) = (7, 12);
/// Tile where inbound items are collected.
pub const DOCK_TILE: (i32, i32) = (1, 9);
/// Tile where packed orders are shipped.
pub const PACK_STATION_TILE: (i32, i32) = (1, 5);
/// Tiles walked per one-second tick.
pub const TILES_PER_TICK: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Goal {
    Pick(String),
    Ship,
    Receive,
    PutAway(String),
}

/// What happened on a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    Idle,
    Walked,
    Command {
        name: &'static str,
        result: Result<(), CommandError>,
    },
}

#[derive(Debug, Clone)]
pub struct ScriptedPicker {
    pub x: i32,
    pub y: i32,
}

impl Default for ScriptedPicker {
    fn default() -> Self {
        Self {
            x: START_TILE.0,
            y: START_TILE.1,
        }
    }
}

impl ScriptedPicker {
    fn goal<R: Rng>(ctl: &RoundController<R>) -> Option<Goal> {
        match ctl.mode() {
            Mode::Picking => {
                let order = ctl.current_order()?;
                match order.status {
                    OrderStatus::Packing => Some(Goal::Ship),
                    OrderStatus::Shipped => None,
                    OrderStatus::Pending | OrderStatus::Picking => order
                        .items
                        .iter()
                        .find(|item| !item.is_picked())
                        .map(|item| Goal::Pick(item.slot_id.clone())),
                }
            }
            Mode::Inbound => {
                let tasks = ctl.inbound_tasks();
                let carried = tasks.iter().find(|t| {
                    t.is_received && !t.is_completed && ctl.inventory().contains(&t.item_type)
                });
                if let Some(task) = carried {
                    return Some(Goal::PutAway(task.target_slot_id.clone()));
                }
                let waiting = tasks.iter().any(|t| !t.is_received);
                (waiting && ctl.inventory().has_space()).then_some(Goal::Receive)
            }
        }
    }

    fn goal_tile<R: Rng>(ctl: &RoundController<R>, goal: &Goal) -> Option<(i32, i32)> {
        match goal {
            Goal::Pick(slot) | Goal::PutAway(slot) => {
                ctl.get_slot_by_id(slot).map(|s| (s.x, s.y))
            }
            Goal::Ship => Some(PACK_STATION_TILE),
            Goal::Receive => Some(DOCK_TILE),
        }
    }

    /// Step one tile toward `target`, horizontal first.
    fn step_toward(&mut self, target: (i32, i32)) {
        if self.x != target.0 {
            self.x += (target.0 - self.x).signum();
        } else if self.y != target.1 {
            self.y += (target.1 - self.y).signum();
        }
    }

    /// Spend one tick: walk toward the goal, and act if standing on it.
    pub fn tick<R: Rng>(&mut self, ctl: &mut RoundController<R>) -> TickAction {
        let Some(goal) = Self::goal(ctl) else {
            return TickAction::Idle;
        };
        let Some(target) = Self::goal_tile(ctl, &goal) else {
            return TickAction::Idle;
        };
        for _ in 0..TILES_PER_TICK {
            if (self.x, self.y) == target {
                break;
            }
            self.step_toward(target);
        }
        if (self.x, self.y) != target {
            return TickAction::Walked;
        }

        match goal {
            Goal::Pick(_) | Goal::PutAway(_) => {
                let Some(slot_id) = ctl.get_slot_at(self.x, self.y).map(|s| s.id.clone()) else {
                    return TickAction::Idle;
                };
                if matches!(goal, Goal::Pick(_)) {
                    TickAction::Command {
                        name: "pick_item",
                        result: ctl.pick_item(&slot_id),
                    }
                } else {
                    TickAction::Command {
                        name: "put_away_item",
                        result: ctl.put_away_item(&slot_id),
                    }
                }
            }
            Goal::Ship => TickAction::Command {
                name: "complete_order",
                result: ctl.complete_order(),
            },
            Goal::Receive => TickAction::Command {
                name: "receive_item_from_dock",
                result: ctl.receive_item_from_dock().map(|_| ()),
            },
        }
    }
}
