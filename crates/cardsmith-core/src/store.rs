//! The live item collection of the open canvas.
//!
//! Every mutating operation records a history snapshot and writes the
//! collection through to storage before returning, so storage always mirrors
//! memory.

use crate::collection::ItemCollection;
use crate::history::HistoryLog;
use crate::item::{CanvasItem, ItemBody, ItemId, ItemType};
use crate::storage::{KeyValueStore, StorageError, StorageResult, items_key};
use crate::upload::{UploadError, UploadOutcome, UploadTicket};
use kurbo::Point;
use std::collections::HashMap;
use std::sync::Arc;

/// Item store for one canvas.
pub struct ItemStore<S: KeyValueStore + ?Sized> {
    storage: Arc<S>,
    items: ItemCollection,
    /// Generation of the upload each item is waiting for. Items without an
    /// entry accept no upload.
    upload_generations: HashMap<ItemId, u64>,
    /// Last generation handed out. Never reused, not even across deletes.
    last_generation: u64,
}

impl<S: KeyValueStore + ?Sized> ItemStore<S> {
    /// Load the items of `canvas_id`.
    ///
    /// The history's current snapshot wins when it belongs to this canvas;
    /// otherwise the persisted entry is used. Malformed persisted data yields
    /// an empty canvas.
    pub fn load(storage: Arc<S>, canvas_id: &str, history: &HistoryLog) -> StorageResult<Self> {
        let items = match history.current() {
            Some(snapshot) if snapshot.canvas_id() == canvas_id => {
                log::debug!("Restoring canvas '{}' from history", canvas_id);
                (**snapshot).clone()
            }
            _ => Self::read_persisted(storage.as_ref(), canvas_id)?,
        };

        log::info!("Loaded {} item(s) for canvas '{}'", items.len(), canvas_id);

        Ok(Self {
            storage,
            items,
            upload_generations: HashMap::new(),
            last_generation: 0,
        })
    }

    fn read_persisted(storage: &S, canvas_id: &str) -> StorageResult<ItemCollection> {
        let Some(json) = storage.get(&items_key(canvas_id))? else {
            return Ok(ItemCollection::new(canvas_id));
        };

        match ItemCollection::from_json(canvas_id, &json) {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!("Ignoring malformed items for canvas '{}': {}", canvas_id, e);
                Ok(ItemCollection::new(canvas_id))
            }
        }
    }

    pub fn canvas_id(&self) -> &str {
        self.items.canvas_id()
    }

    pub fn items(&self) -> &ItemCollection {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&CanvasItem> {
        self.items.get(id)
    }

    /// Place an item at `coordinates`.
    ///
    /// When `existing_id` names an item on this canvas it is moved (and
    /// retyped) with its content preserved. Otherwise a new, empty item is
    /// created. Returns the id of the placed item.
    pub fn place_item(
        &mut self,
        history: &mut HistoryLog,
        item_type: ItemType,
        coordinates: Point,
        existing_id: Option<&str>,
    ) -> StorageResult<ItemId> {
        let id = match existing_id.and_then(|id| self.items.get_mut(id)) {
            Some(item) => {
                item.coordinates = coordinates;
                let body = std::mem::replace(&mut item.body, ItemBody::empty(item_type));
                item.body = body.retyped(item_type);
                log::debug!("Moved item {} to ({}, {})", item.id, coordinates.x, coordinates.y);
                item.id.clone()
            }
            None => {
                let item = CanvasItem::new(self.canvas_id(), item_type, coordinates);
                let id = item.id.clone();
                log::debug!("Created {} item {}", item_type.name(), id);
                self.items.insert(item);
                id
            }
        };

        self.commit(history)?;
        Ok(id)
    }

    /// Replace an item's content. Returns false if the item doesn't exist.
    ///
    /// Any upload still in flight for the item is superseded.
    pub fn update_content(
        &mut self,
        history: &mut HistoryLog,
        item_id: &str,
        content: impl Into<String>,
    ) -> StorageResult<bool> {
        let Some(item) = self.items.get_mut(item_id) else {
            return Ok(false);
        };
        item.body.set_content(content.into());
        self.upload_generations.remove(item_id);

        self.commit(history)?;
        Ok(true)
    }

    /// Remove an item. Returns false if the item doesn't exist.
    ///
    /// Deletion is recorded in history like any other edit, so it can be
    /// undone.
    pub fn delete_item(&mut self, history: &mut HistoryLog, item_id: &str) -> StorageResult<bool> {
        if self.items.remove(item_id).is_none() {
            return Ok(false);
        }
        self.upload_generations.remove(item_id);
        log::debug!("Deleted item {}", item_id);

        self.commit(history)?;
        Ok(true)
    }

    /// Replace the whole collection with a snapshot (undo/redo) and persist.
    pub fn restore(&mut self, snapshot: &ItemCollection) -> StorageResult<()> {
        self.items = snapshot.clone();
        // Content may have changed under any in-flight upload
        self.upload_generations.clear();
        self.persist()
    }

    /// Start an upload for an image item.
    ///
    /// Returns `None` if the item doesn't exist or isn't an image.
    pub fn begin_upload(&mut self, item_id: &str) -> Option<UploadTicket> {
        let item = self.items.get(item_id)?;
        if item.item_type() != ItemType::Image {
            log::warn!("Ignoring upload for non-image item {}", item_id);
            return None;
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        self.upload_generations.insert(item_id.to_string(), generation);
        Some(UploadTicket {
            item_id: item_id.to_string(),
            generation,
        })
    }

    /// Apply the result of an upload started with [`Self::begin_upload`].
    pub fn complete_upload(
        &mut self,
        history: &mut HistoryLog,
        ticket: &UploadTicket,
        result: Result<String, UploadError>,
    ) -> StorageResult<UploadOutcome> {
        let url = match result {
            Ok(url) => url,
            Err(e) => {
                log::error!("Error uploading image for item {}: {}", ticket.item_id, e);
                return Ok(UploadOutcome::Failed(e));
            }
        };

        if !self.is_current(ticket) {
            log::info!(
                "Discarding stale upload for item {} (generation {})",
                ticket.item_id,
                ticket.generation
            );
            return Ok(UploadOutcome::Stale);
        }

        self.update_content(history, &ticket.item_id, url.clone())?;
        Ok(UploadOutcome::Applied { url })
    }

    fn is_current(&self, ticket: &UploadTicket) -> bool {
        self.items.contains(&ticket.item_id)
            && self.upload_generations.get(&ticket.item_id) == Some(&ticket.generation)
    }

    fn commit(&mut self, history: &mut HistoryLog) -> StorageResult<()> {
        history.push(self.items.clone());
        self.persist()
    }

    fn persist(&self) -> StorageResult<()> {
        let json = self
            .items
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(&items_key(self.canvas_id()), &json)
    }
}
