//! The set of items placed on one canvas.

use crate::item::{CanvasItem, ItemId};
use std::collections::HashMap;

/// Items of a single canvas, keyed by item id.
///
/// Every item in the collection is owned by `canvas_id`; `insert` stamps the
/// owner so the invariant cannot be broken from outside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemCollection {
    canvas_id: String,
    items: HashMap<ItemId, CanvasItem>,
}

impl ItemCollection {
    /// Create an empty collection for a canvas.
    pub fn new(canvas_id: impl Into<String>) -> Self {
        Self {
            canvas_id: canvas_id.into(),
            items: HashMap::new(),
        }
    }

    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    /// Insert or replace an item, returning the previous one with that id.
    pub fn insert(&mut self, mut item: CanvasItem) -> Option<CanvasItem> {
        item.canvas_id.clone_from(&self.canvas_id);
        self.items.insert(item.id.clone(), item)
    }

    pub fn remove(&mut self, id: &str) -> Option<CanvasItem> {
        self.items.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&CanvasItem> {
        self.items.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut CanvasItem> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanvasItem> {
        self.items.values()
    }

    /// Items in a deterministic order (top to bottom, then left to right).
    ///
    /// Position is the only thing that matters for layout; the ordering just
    /// keeps re-renders stable.
    pub fn sorted(&self) -> Vec<&CanvasItem> {
        let mut items: Vec<&CanvasItem> = self.items.values().collect();
        items.sort_by(|a, b| {
            a.coordinates
                .y
                .total_cmp(&b.coordinates.y)
                .then(a.coordinates.x.total_cmp(&b.coordinates.x))
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    /// Serialize to the persisted `{ itemId: item }` object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Parse a persisted `{ itemId: item }` object for `canvas_id`.
    ///
    /// The map key is authoritative for the item id. Only entries recorded
    /// for `canvas_id` are kept.
    pub fn from_json(canvas_id: &str, json: &str) -> Result<Self, serde_json::Error> {
        let stored: HashMap<ItemId, CanvasItem> = serde_json::from_str(json)?;
        let mut collection = Self::new(canvas_id);
        let mut foreign = 0usize;

        for (id, mut item) in stored {
            if item.canvas_id != canvas_id {
                foreign += 1;
                continue;
            }
            item.id = id;
            collection.insert(item);
        }

        if foreign > 0 {
            log::warn!("Dropped {} stored item(s) not owned by canvas '{}'", foreign, canvas_id);
        }

        Ok(collection)
    }
}
