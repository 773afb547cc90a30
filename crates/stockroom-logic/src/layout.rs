//! Warehouse floor layout.
//!
//! A layout is a list of racks. Each rack is a vertical run of slots in one
//! tile column, so a whole floor can be described (and loaded from JSON)
//! without listing every slot by hand.
//!
//! ```
//! use stockroom_logic::layout::WarehouseLayout;
//!
//! let layout = WarehouseLayout::default();
//! assert!(layout.validate().is_empty());
//! assert_eq!(layout.slot_count(), 12);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most slots a single rack may hold.
pub const MAX_RACK_SLOTS: u32 = 256;

/// One rack: `count` slots at column `x`, rows `y..y + count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSpec {
    pub zone: String,
    /// Rack number within the zone, already zero-padded (e.g. `"01"`).
    pub rack: String,
    pub x: i32,
    pub y: i32,
    pub count: u32,
}

impl RackSpec {
    /// Slot id for the 1-based position `index` on this rack.
    pub fn slot_id(&self, index: u32) -> String {
        format!("{}-{}-{}", self.zone, self.rack, index)
    }

    /// Row of the bottom slot, `None` for an empty rack or one that runs
    /// past the coordinate range.
    pub fn last_row(&self) -> Option<i32> {
        let span = i32::try_from(self.count.checked_sub(1)?).ok()?;
        self.y.checked_add(span)
    }

    /// `(id, x, y)` for every slot on the rack, top to bottom. Stops early
    /// at the end of the coordinate range; validate the layout first.
    pub fn positions(&self) -> impl Iterator<Item = (String, i32, i32)> + '_ {
        (0..self.count).map_while(move |i| {
            let y = self.y.checked_add(i32::try_from(i).ok()?)?;
            Some((self.slot_id(i + 1), self.x, y))
        })
    }
}

/// Complete floor description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseLayout {
    pub racks: Vec<RackSpec>,
}

impl Default for WarehouseLayout {
    /// Two zones of six slots: zone A at column 5, zone B at column 10,
    /// both spanning rows 5–10.
    fn default() -> Self {
        Self {
            racks: vec![
                RackSpec {
                    zone: "A".to_string(),
                    rack: "01".to_string(),
                    x: 5,
                    y: 5,
                    count: 6,
                },
                RackSpec {
                    zone: "B".to_string(),
                    rack: "01".to_string(),
                    x: 10,
                    y: 5,
                    count: 6,
                },
            ],
        }
    }
}

/// Layout validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no racks")]
    NoRacks,
    #[error("rack {zone}-{rack} has no slots")]
    EmptyRack { zone: String, rack: String },
    #[error("rack {zone}-{rack} has {count} slots, at most {max} allowed")]
    RackTooLong {
        zone: String,
        rack: String,
        count: u32,
        max: u32,
    },
    #[error("rack {zone}-{rack} runs past the coordinate range")]
    RackOutOfBounds { zone: String, rack: String },
    #[error("slot id {0} appears more than once")]
    DuplicateSlotId(String),
    #[error("two slots share tile ({x}, {y})")]
    DuplicateTile { x: i32, y: i32 },
}

impl WarehouseLayout {
    /// Parse a layout from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn slot_count(&self) -> usize {
        self.racks.iter().map(|r| r.count as usize).sum()
    }

    /// Validate the layout, returning all errors found.
    pub fn validate(&self) -> Vec<LayoutError> {
        let mut errors = Vec::new();
        if self.racks.is_empty() {
            errors.push(LayoutError::NoRacks);
        }

        let mut ids = HashSet::new();
        let mut tiles = HashSet::new();
        for rack in &self.racks {
            if rack.count == 0 {
                errors.push(LayoutError::EmptyRack {
                    zone: rack.zone.clone(),
                    rack: rack.rack.clone(),
                });
                continue;
            }
            if rack.count > MAX_RACK_SLOTS {
                errors.push(LayoutError::RackTooLong {
                    zone: rack.zone.clone(),
                    rack: rack.rack.clone(),
                    count: rack.count,
                    max: MAX_RACK_SLOTS,
                });
                continue;
            }
            if rack.last_row().is_none() {
                errors.push(LayoutError::RackOutOfBounds {
                    zone: rack.zone.clone(),
                    rack: rack.rack.clone(),
                });
                continue;
            }
            for (id, x, y) in rack.positions() {
                if !tiles.insert((x, y)) {
                    errors.push(LayoutError::DuplicateTile { x, y });
                }
                if !ids.insert(id.clone()) {
                    errors.push(LayoutError::DuplicateSlotId(id));
                }
            }
        }
        errors
    }
}
