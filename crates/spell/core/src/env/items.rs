//! Item templates needed by item-creating and durability effects.

use crate::types::ItemId;

/// Static item data.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemTemplate {
    pub id: ItemId,
    pub name: String,
    /// Items per inventory slot.
    pub max_stack: u32,
    /// Maximum number a unit may carry; 0 means unlimited.
    pub max_count: u32,
    pub max_durability: u32,
}

impl ItemTemplate {
    pub fn new(id: u32, name: impl Into<String>, max_stack: u32) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            max_stack: max_stack.max(1),
            max_count: 0,
            max_durability: 0,
        }
    }
}

/// Item template lookup.
pub trait ItemOracle: Send + Sync {
    fn item(&self, id: ItemId) -> Option<ItemTemplate>;
}
