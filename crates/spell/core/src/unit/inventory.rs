//! Minimal inventory: stacked bag items plus equipped items with durability.

use crate::env::ItemTemplate;
use crate::types::ItemId;

/// Outcome of an attempt to place items into an inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InventoryResult {
    Ok,
    ItemNotFound,
    InventoryFull,
    /// The per-unit carry limit of the item would be exceeded.
    CantCarryMore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

/// Equipment slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Ranged,
    Chest,
    Head,
    Legs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquippedItem {
    pub slot: EquipSlot,
    pub item: ItemId,
    pub durability: u32,
    pub max_durability: u32,
    pub enchant: Option<u32>,
    /// Temporary enchant id and remaining ms.
    pub temp_enchant: Option<(u32, u32)>,
}

impl EquippedItem {
    pub fn is_broken(&self) -> bool {
        self.max_durability > 0 && self.durability == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    pub capacity: usize,
    stacks: Vec<ItemStack>,
    pub equipped: Vec<EquippedItem>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            stacks: Vec::new(),
            equipped: Vec::new(),
        }
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn count(&self, item: ItemId) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }

    /// How many of `count` items fit, and the reason when not all of them do.
    pub fn can_store(&self, template: &ItemTemplate, count: u32) -> (InventoryResult, u32) {
        let mut wanted = count;
        let mut limited_by_count = false;
        if template.max_count > 0 {
            let room = template.max_count.saturating_sub(self.count(template.id));
            if room < wanted {
                wanted = room;
                limited_by_count = true;
            }
        }

        let per_slot = template.max_stack.max(1);
        let partial_room: u32 = self
            .stacks
            .iter()
            .filter(|s| s.item == template.id)
            .map(|s| per_slot.saturating_sub(s.count))
            .sum();
        let free_slots = self.capacity.saturating_sub(self.stacks.len()) as u32;
        let room = partial_room.saturating_add(free_slots.saturating_mul(per_slot));
        let storable = wanted.min(room);

        let result = if storable == count {
            InventoryResult::Ok
        } else if limited_by_count && storable == wanted {
            InventoryResult::CantCarryMore
        } else {
            InventoryResult::InventoryFull
        };
        (result, storable)
    }

    /// Stores up to `count` items, filling partial stacks first. Returns the stored count.
    pub fn store(&mut self, template: &ItemTemplate, count: u32) -> u32 {
        let (_, storable) = self.can_store(template, count);
        let per_slot = template.max_stack.max(1);
        let mut left = storable;
        for stack in self.stacks.iter_mut().filter(|s| s.item == template.id) {
            let add = per_slot.saturating_sub(stack.count).min(left);
            stack.count += add;
            left -= add;
        }
        while left > 0 && self.stacks.len() < self.capacity {
            let add = left.min(per_slot);
            self.stacks.push(ItemStack {
                item: template.id,
                count: add,
            });
            left -= add;
        }
        storable - left
    }

    /// Removes up to `count` items; returns how many were removed.
    pub fn remove(&mut self, item: ItemId, count: u32) -> u32 {
        let mut left = count;
        for stack in self.stacks.iter_mut().rev().filter(|s| s.item == item) {
            let take = stack.count.min(left);
            stack.count -= take;
            left -= take;
        }
        self.stacks.retain(|s| s.count > 0);
        count - left
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&EquippedItem> {
        self.equipped.iter().find(|e| e.slot == slot)
    }

    pub fn equipped_mut(&mut self, slot: EquipSlot) -> Option<&mut EquippedItem> {
        self.equipped.iter_mut().find(|e| e.slot == slot)
    }

    pub fn equip(&mut self, slot: EquipSlot, template: &ItemTemplate) {
        self.equipped.retain(|e| e.slot != slot);
        self.equipped.push(EquippedItem {
            slot,
            item: template.id,
            durability: template.max_durability,
            max_durability: template.max_durability,
            enchant: None,
            temp_enchant: None,
        });
    }
}
