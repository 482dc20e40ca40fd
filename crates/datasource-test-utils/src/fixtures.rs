//! Canned trees.

use datasource::prelude::*;

/// A small player tree:
///
/// ```text
/// Player
/// ├── Name = "Ayla"
/// ├── Stats
/// │   ├── Health = 100.0
/// │   └── Mana = 40
/// └── Inventory[] (3 items, each with a Label)
/// ```
pub struct PlayerFixture {
    pub player: Handle,
    pub name: Handle,
    pub stats: Handle,
    pub health: Handle,
    pub mana: Handle,
    pub inventory: Handle,
    pub items: Vec<Handle>,
}

impl PlayerFixture {
    pub const ITEM_COUNT: usize = 3;

    /// Build the tree under Root. Queued events are left pending.
    pub fn build(store: &mut Store) -> Self {
        let player = store.find_or_create(Handle::INVALID, "Player");
        let name = store.find_or_create(player, "Name");
        store.set(name, String::from("Ayla"));

        let stats = store.find_or_create(player, "Stats");
        let health = store.find_or_create(stats, "Health");
        store.set(health, 100.0f32);
        let mana = store.find_or_create(stats, "Mana");
        store.set(mana, 40i32);

        let inventory = store.find_or_create(player, "Inventory");
        store.make_array(inventory, true);
        let mut items = Vec::with_capacity(Self::ITEM_COUNT);
        for i in 0..Self::ITEM_COUNT {
            if let Some(item) = store.array_append(inventory) {
                let label = store.find_or_create(item, "Label");
                store.set(label, format!("item {i}"));
                items.push(item);
            }
        }

        Self {
            player,
            name,
            stats,
            health,
            mana,
            inventory,
            items,
        }
    }

    /// Every handle of the fixture except item labels.
    pub fn handles(&self) -> Vec<Handle> {
        let mut all = vec![
            self.player,
            self.name,
            self.stats,
            self.health,
            self.mana,
            self.inventory,
        ];
        all.extend(&self.items);
        all
    }
}
