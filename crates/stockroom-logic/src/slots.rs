//! Slot geometry and the stock ledger.
//!
//! [`SlotStore`] is the only place stock quantities change. Every mutator
//! either applies its whole effect or returns a [`StockError`] and leaves the
//! store untouched.
//!
//! Capacity ceilings are not enforced here; see [`crate::constants`].

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ITEM_CATALOG, STARTING_STOCK_MAX};
use crate::layout::{LayoutError, WarehouseLayout};

/// What a slot physically holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotContents {
    #[default]
    Empty,
    /// `quantity` is always at least 1.
    Holding { item_type: String, quantity: u32 },
}

impl SlotContents {
    pub fn item_type(&self) -> Option<&str> {
        match self {
            SlotContents::Empty => None,
            SlotContents::Holding { item_type, .. } => Some(item_type),
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            SlotContents::Empty => 0,
            SlotContents::Holding { quantity, .. } => *quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotContents::Empty)
    }
}

/// A fixed storage location on the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// `<Zone>-<Rack>-<Index>`, e.g. `A-01-1`.
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub zone: String,
    /// Reservation flag. Independent of stock; no round logic reads it.
    pub occupied: bool,
    pub contents: SlotContents,
}

impl Slot {
    pub fn new(id: impl Into<String>, x: i32, y: i32, zone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            zone: zone.into(),
            occupied: false,
            contents: SlotContents::Empty,
        }
    }

    pub fn item_type(&self) -> Option<&str> {
        self.contents.item_type()
    }

    pub fn quantity(&self) -> u32 {
        self.contents.quantity()
    }
}

/// Per-slot copy of contents, in store order. Reservation flags are not
/// part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    contents: Vec<SlotContents>,
}

impl StockSnapshot {
    pub fn contents(&self) -> &[SlotContents] {
        &self.contents
    }
}

/// Ledger operation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("unknown slot {0}")]
    UnknownSlot(String),
    #[error("slot {slot} holds {held}, cannot add {offered}")]
    MixedItemType {
        slot: String,
        held: String,
        offered: String,
    },
    #[error("slot {slot} holds {held}, cannot remove {requested}")]
    InsufficientStock {
        slot: String,
        held: u32,
        requested: u32,
    },
    #[error("stock change of zero units on slot {0}")]
    ZeroQuantity(String),
    #[error("slot {0} quantity would overflow")]
    QuantityOverflow(String),
    #[error("no stock snapshot has been taken")]
    NoSnapshot,
}

/// Owns every slot and its stock. Slot order is insertion order and never
/// changes after construction.
#[derive(Debug, Clone)]
pub struct SlotStore {
    slots: Vec<Slot>,
    by_id: HashMap<String, usize>,
    by_tile: HashMap<(i32, i32), usize>,
    snapshot: Option<StockSnapshot>,
}

impl Default for SlotStore {
    /// Empty slots on the default two-zone floor.
    fn default() -> Self {
        Self::assemble(layout_slots(&WarehouseLayout::default()))
    }
}

fn layout_slots(layout: &WarehouseLayout) -> Vec<Slot> {
    layout
        .racks
        .iter()
        .flat_map(|rack| {
            rack.positions()
                .map(|(id, x, y)| Slot::new(id, x, y, rack.zone.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}

impl SlotStore {
    /// Build a store of empty slots from a validated layout.
    pub fn from_layout(layout: &WarehouseLayout) -> Result<Self, Vec<LayoutError>> {
        let errors = layout.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self::assemble(layout_slots(layout)))
    }

    /// First slot wins on a duplicate id or tile; callers validate beforehand.
    fn assemble(slots: Vec<Slot>) -> Self {
        let mut by_id = HashMap::with_capacity(slots.len());
        let mut by_tile = HashMap::with_capacity(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            by_id.entry(slot.id.clone()).or_insert(index);
            by_tile.entry((slot.x, slot.y)).or_insert(index);
        }
        Self {
            slots,
            by_id,
            by_tile,
            snapshot: None,
        }
    }

    pub fn get_slot_at(&self, x: i32, y: i32) -> Option<&Slot> {
        self.by_tile.get(&(x, y)).map(|&i| &self.slots[i])
    }

    pub fn get_slot_by_id(&self, id: &str) -> Option<&Slot> {
        self.by_id.get(id).map(|&i| &self.slots[i])
    }

    /// All slots in insertion order.
    pub fn all_slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Units of stock across every slot.
    pub fn total_quantity(&self) -> u64 {
        self.slots.iter().map(|s| s.quantity() as u64).sum()
    }

    /// Units of one item type across every slot.
    pub fn quantity_of(&self, item_type: &str) -> u64 {
        self.slots
            .iter()
            .filter(|s| s.item_type() == Some(item_type))
            .map(|s| s.quantity() as u64)
            .sum()
    }

    fn index_of(&self, id: &str) -> Result<usize, StockError> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| StockError::UnknownSlot(id.to_string()))
    }

    /// Add `qty` units of `item_type` to slot `id`.
    ///
    /// Fails if the slot is unknown, `qty` is zero, or the slot already holds
    /// a different item type.
    pub fn add_stock(&mut self, id: &str, item_type: &str, qty: u32) -> Result<(), StockError> {
        let index = self.index_of(id)?;
        if qty == 0 {
            return Err(StockError::ZeroQuantity(id.to_string()));
        }
        let slot = &mut self.slots[index];
        let next = match &slot.contents {
            SlotContents::Empty => SlotContents::Holding {
                item_type: item_type.to_string(),
                quantity: qty,
            },
            SlotContents::Holding {
                item_type: held,
                quantity,
            } if held == item_type => SlotContents::Holding {
                item_type: held.clone(),
                quantity: quantity
                    .checked_add(qty)
                    .ok_or_else(|| StockError::QuantityOverflow(id.to_string()))?,
            },
            SlotContents::Holding { item_type: held, .. } => {
                return Err(StockError::MixedItemType {
                    slot: id.to_string(),
                    held: held.clone(),
                    offered: item_type.to_string(),
                })
            }
        };
        slot.contents = next;
        Ok(())
    }

    /// Remove `qty` units from slot `id`. The slot becomes empty when its
    /// quantity reaches zero.
    pub fn remove_stock(&mut self, id: &str, qty: u32) -> Result<(), StockError> {
        let index = self.index_of(id)?;
        if qty == 0 {
            return Err(StockError::ZeroQuantity(id.to_string()));
        }
        let slot = &mut self.slots[index];
        let next = match &slot.contents {
            SlotContents::Holding {
                item_type,
                quantity,
            } if *quantity > qty => SlotContents::Holding {
                item_type: item_type.clone(),
                quantity: quantity - qty,
            },
            SlotContents::Holding { quantity, .. } if *quantity == qty => SlotContents::Empty,
            contents => {
                return Err(StockError::InsufficientStock {
                    slot: id.to_string(),
                    held: contents.quantity(),
                    requested: qty,
                })
            }
        };
        slot.contents = next;
        Ok(())
    }

    /// Copy of every slot's contents, without touching the stored restore point.
    pub fn stock_snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            contents: self.slots.iter().map(|s| s.contents.clone()).collect(),
        }
    }

    /// Record the current contents as the restore point, replacing any
    /// earlier one.
    pub fn snapshot_stock(&mut self) {
        self.snapshot = Some(self.stock_snapshot());
    }

    /// Put every slot back to the recorded restore point. The restore point
    /// is kept, so a round can be replayed more than once.
    pub fn restore_stock(&mut self) -> Result<(), StockError> {
        let snapshot = self.snapshot.as_ref().ok_or(StockError::NoSnapshot)?;
        for (slot, contents) in self.slots.iter_mut().zip(&snapshot.contents) {
            slot.contents = contents.clone();
        }
        Ok(())
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn reserve_slot(&mut self, id: &str) -> Result<(), StockError> {
        let index = self.index_of(id)?;
        self.slots[index].occupied = true;
        Ok(())
    }

    pub fn clear_slot(&mut self, id: &str) -> Result<(), StockError> {
        let index = self.index_of(id)?;
        self.slots[index].occupied = false;
        Ok(())
    }

    /// Stock every empty slot with a random catalog item and a quantity in
    /// `0..=STARTING_STOCK_MAX`. A zero draw leaves the slot empty.
    pub fn seed_starting_stock(&mut self, rng: &mut impl Rng) {
        for slot in self.slots.iter_mut().filter(|s| s.contents.is_empty()) {
            let item_type = ITEM_CATALOG[rng.gen_range(0..ITEM_CATALOG.len())];
            let quantity = rng.gen_range(0..=STARTING_STOCK_MAX);
            if quantity > 0 {
                slot.contents = SlotContents::Holding {
                    item_type: item_type.to_string(),
                    quantity,
                };
            }
        }
        log::debug!(
            "Seeded {} slots with {} units",
            self.slots.len(),
            self.total_quantity()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RackSpec;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_with_zero_draws_leaves_floor_empty() {
        let mut store = SlotStore::default();
        store.seed_starting_stock(&mut StepRng::new(0, 0));
        assert_eq!(store.total_quantity(), 0);
        assert!(store.all_slots().iter().all(|s| s.contents.is_empty()));
    }

    #[test]
    fn test_lookup_by_id_and_tile() {
        let store = SlotStore::default();
        assert_eq!(store.len(), 12);
        let slot = store.get_slot_at(10, 7).unwrap();
        assert_eq!(slot.id, "B-01-3");
        assert_eq!(slot.zone, "B");
        assert_eq!(store.get_slot_by_id("A-01-6").map(|s| (s.x, s.y)), Some((5, 10)));
        assert!(store.get_slot_at(0, 0).is_none());
        assert!(store.get_slot_by_id("Z-99-1").is_none());
    }

    #[test]
    fn test_all_slots_keeps_insertion_order() {
        let store = SlotStore::default();
        let ids: Vec<&str> = store.all_slots().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(&ids[..3], &["A-01-1", "A-01-2", "A-01-3"]);
        assert_eq!(ids[6], "B-01-1");
    }

    #[test]
    fn test_add_stock_sets_type_on_empty_slot() {
        let mut store = SlotStore::default();
        store.add_stock("A-01-1", "Red Box", 2).unwrap();
        store.add_stock("A-01-1", "Red Box", 3).unwrap();
        let slot = store.get_slot_by_id("A-01-1").unwrap();
        assert_eq!(slot.item_type(), Some("Red Box"));
        assert_eq!(slot.quantity(), 5);
    }

    #[test]
    fn test_add_stock_rejects_mixed_types() {
        let mut store = SlotStore::default();
        store.add_stock("A-01-1", "Red Box", 2).unwrap();
        let err = store.add_stock("A-01-1", "Blue Box", 1).unwrap_err();
        assert!(matches!(err, StockError::MixedItemType { .. }));
        let slot = store.get_slot_by_id("A-01-1").unwrap();
        assert_eq!(slot.item_type(), Some("Red Box"));
        assert_eq!(slot.quantity(), 2);
    }

    #[test]
    fn test_add_stock_unknown_slot_and_zero() {
        let mut store = SlotStore::default();
        assert_eq!(
            store.add_stock("Q-01-1", "Red Box", 1),
            Err(StockError::UnknownSlot("Q-01-1".to_string()))
        );
        assert_eq!(
            store.add_stock("A-01-1", "Red Box", 0),
            Err(StockError::ZeroQuantity("A-01-1".to_string()))
        );
        assert!(store.get_slot_by_id("A-01-1").unwrap().contents.is_empty());
    }

    #[test]
    fn test_remove_stock_empties_slot() {
        let mut store = SlotStore::default();
        store.add_stock("B-01-2", "Green Box", 2).unwrap();
        store.remove_stock("B-01-2", 1).unwrap();
        assert_eq!(store.get_slot_by_id("B-01-2").unwrap().quantity(), 1);
        store.remove_stock("B-01-2", 1).unwrap();
        let slot = store.get_slot_by_id("B-01-2").unwrap();
        assert_eq!(slot.contents, SlotContents::Empty);
        assert_eq!(slot.item_type(), None);
    }

    #[test]
    fn test_remove_stock_insufficient() {
        let mut store = SlotStore::default();
        store.add_stock("B-01-2", "Green Box", 1).unwrap();
        let err = store.remove_stock("B-01-2", 2).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                slot: "B-01-2".to_string(),
                held: 1,
                requested: 2,
            }
        );
        assert_eq!(store.get_slot_by_id("B-01-2").unwrap().quantity(), 1);
        assert!(store.remove_stock("B-01-3", 1).is_err());
    }

    #[test]
    fn test_remove_then_add_restores_quantity() {
        let mut store = SlotStore::default();
        store.add_stock("A-01-4", "Yellow Box", 4).unwrap();
        store.remove_stock("A-01-4", 4).unwrap();
        store.add_stock("A-01-4", "Yellow Box", 4).unwrap();
        let slot = store.get_slot_by_id("A-01-4").unwrap();
        assert_eq!(slot.quantity(), 4);
        assert_eq!(slot.item_type(), Some("Yellow Box"));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut store = SlotStore::default();
        assert_eq!(store.restore_stock(), Err(StockError::NoSnapshot));

        store.add_stock("A-01-1", "Red Box", 3).unwrap();
        store.snapshot_stock();
        let before = store.stock_snapshot();

        store.remove_stock("A-01-1", 3).unwrap();
        store.add_stock("A-01-1", "Blue Box", 1).unwrap();
        store.add_stock("B-01-6", "Green Box", 9).unwrap();
        store.restore_stock().unwrap();
        assert_eq!(store.stock_snapshot(), before);

        // Restore point survives a restore.
        store.remove_stock("A-01-1", 1).unwrap();
        store.restore_stock().unwrap();
        assert_eq!(store.stock_snapshot(), before);
    }

    #[test]
    fn test_reservation_is_not_part_of_snapshot() {
        let mut store = SlotStore::default();
        store.snapshot_stock();
        store.reserve_slot("A-01-2").unwrap();
        store.restore_stock().unwrap();
        assert!(store.get_slot_by_id("A-01-2").unwrap().occupied);
        store.clear_slot("A-01-2").unwrap();
        assert!(!store.get_slot_by_id("A-01-2").unwrap().occupied);
        assert!(store.reserve_slot("nope").is_err());
    }

    #[test]
    fn test_seed_starting_stock_is_deterministic() {
        let mut a = SlotStore::default();
        let mut b = SlotStore::default();
        a.seed_starting_stock(&mut StdRng::seed_from_u64(11));
        b.seed_starting_stock(&mut StdRng::seed_from_u64(11));
        assert_eq!(a.stock_snapshot(), b.stock_snapshot());
        for slot in a.all_slots() {
            assert!(slot.quantity() <= STARTING_STOCK_MAX);
            if let Some(item) = slot.item_type() {
                assert!(ITEM_CATALOG.contains(&item));
            }
        }
    }

    #[test]
    fn test_seed_skips_stocked_slots() {
        let mut store = SlotStore::default();
        store.add_stock("A-01-1", "Red Box", 12).unwrap();
        store.seed_starting_stock(&mut StdRng::seed_from_u64(4));
        let kept = store.get_slot_by_id("A-01-1").unwrap();
        assert_eq!((kept.item_type(), kept.quantity()), (Some("Red Box"), 12));
        for slot in store.all_slots() {
            match &slot.contents {
                SlotContents::Holding { quantity, .. } => assert!(*quantity > 0),
                SlotContents::Empty => assert_eq!(slot.item_type(), None),
            }
        }
    }

    #[test]
    fn test_quantity_totals() {
        let mut store = SlotStore::default();
        store.add_stock("A-01-1", "Red Box", 3).unwrap();
        store.add_stock("A-01-2", "Red Box", 2).unwrap();
        store.add_stock("B-01-1", "Blue Box", 4).unwrap();
        assert_eq!(store.total_quantity(), 9);
        assert_eq!(store.quantity_of("Red Box"), 5);
        assert_eq!(store.quantity_of("Green Box"), 0);
    }

    #[test]
    fn test_from_layout_rejects_invalid() {
        let layout = WarehouseLayout {
            racks: vec![RackSpec {
                zone: "C".to_string(),
                rack: "01".to_string(),
                x: 1,
                y: 1,
                count: 0,
            }],
        };
        assert!(SlotStore::from_layout(&layout).is_err());
        let store = SlotStore::from_layout(&WarehouseLayout::default()).unwrap();
        assert_eq!(store.len(), 12);
    }
}
