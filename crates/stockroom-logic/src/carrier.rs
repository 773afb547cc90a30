//! Items the picker is currently holding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::CARRY_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("carrier is full ({capacity} items)")]
pub struct CarrierFull {
    pub capacity: usize,
}

/// Bounded multiset of item types. Order is kept for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryCarrier {
    items: Vec<String>,
    capacity: usize,
}

impl Default for InventoryCarrier {
    fn default() -> Self {
        Self::new(CARRY_CAPACITY)
    }
}

impl InventoryCarrier {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_space(&self) -> bool {
        self.items.len() < self.capacity
    }

    pub fn contains(&self, item_type: &str) -> bool {
        self.items.iter().any(|i| i == item_type)
    }

    pub fn push(&mut self, item_type: impl Into<String>) -> Result<(), CarrierFull> {
        if !self.has_space() {
            return Err(CarrierFull {
                capacity: self.capacity,
            });
        }
        self.items.push(item_type.into());
        Ok(())
    }

    /// Remove one unit of `item_type`, if held.
    pub fn take(&mut self, item_type: &str) -> Option<String> {
        let index = self.items.iter().position(|i| i == item_type)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_capacity() {
        let mut carrier = InventoryCarrier::default();
        for item in ["Red Box", "Red Box", "Blue Box"] {
            carrier.push(item).unwrap();
        }
        assert!(!carrier.has_space());
        assert_eq!(carrier.push("Green Box"), Err(CarrierFull { capacity: 3 }));
        assert_eq!(carrier.len(), 3);
    }

    #[test]
    fn test_take_removes_one_unit() {
        let mut carrier = InventoryCarrier::default();
        carrier.push("Red Box").unwrap();
        carrier.push("Red Box").unwrap();
        assert_eq!(carrier.take("Red Box").as_deref(), Some("Red Box"));
        assert!(carrier.contains("Red Box"));
        assert_eq!(carrier.take("Blue Box"), None);
        assert_eq!(carrier.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut carrier = InventoryCarrier::new(1);
        carrier.push("Yellow Box").unwrap();
        carrier.clear();
        assert!(carrier.is_empty());
        assert!(carrier.has_space());
    }
}
