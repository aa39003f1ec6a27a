//! The list of canvases a user has created.

use crate::storage::{
    CANVAS_LIST_KEY, KeyValueStore, StorageResult, background_key, items_key, read_json_or_default,
    write_json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name given to freshly created canvases.
pub const DEFAULT_CANVAS_NAME: &str = "Untitled";

/// Registry entry for one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDescriptor {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Milliseconds since the Unix epoch of the last item edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<i64>,
}

impl CanvasDescriptor {
    fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            last_edited: None,
        }
    }
}

/// Ordered list of canvases, persisted as a whole under `canvasList`.
pub struct CanvasRegistry<S: KeyValueStore + ?Sized> {
    storage: Arc<S>,
    canvases: Vec<CanvasDescriptor>,
    default_name: String,
}

impl<S: KeyValueStore + ?Sized> CanvasRegistry<S> {
    /// Load the registry from storage. A malformed list loads as empty.
    pub fn load(storage: Arc<S>) -> StorageResult<Self> {
        let canvases: Vec<CanvasDescriptor> =
            read_json_or_default(storage.as_ref(), CANVAS_LIST_KEY)?;
        log::info!("Loaded {} canvas(es)", canvases.len());

        Ok(Self {
            storage,
            canvases,
            default_name: DEFAULT_CANVAS_NAME.to_string(),
        })
    }

    /// Use a different name for new canvases.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// All canvases in creation order.
    pub fn list(&self) -> &[CanvasDescriptor] {
        &self.canvases
    }

    pub fn get(&self, id: &str) -> Option<&CanvasDescriptor> {
        self.canvases.iter().find(|c| c.id == id)
    }

    /// Append a new, empty canvas and persist the list.
    pub fn create_canvas(&mut self) -> StorageResult<CanvasDescriptor> {
        let canvas = CanvasDescriptor::new(self.default_name.clone());
        self.canvases.push(canvas.clone());
        self.persist()?;

        log::info!("Created canvas {}", canvas.id);
        Ok(canvas)
    }

    /// Rename a canvas. Returns false if the id is unknown.
    pub fn rename_canvas(&mut self, id: &str, name: impl Into<String>) -> StorageResult<bool> {
        let Some(canvas) = self.canvases.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        canvas.name = name.into();
        self.persist()?;
        Ok(true)
    }

    /// Record that a canvas was just edited. Returns false if the id is unknown.
    pub fn touch(&mut self, id: &str) -> StorageResult<bool> {
        let Some(canvas) = self.canvases.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        canvas.last_edited = Some(Utc::now().timestamp_millis());
        self.persist()?;
        Ok(true)
    }

    /// Remove a canvas together with its items and background.
    ///
    /// Returns false if the id is unknown.
    pub fn delete_canvas(&mut self, id: &str) -> StorageResult<bool> {
        let before = self.canvases.len();
        self.canvases.retain(|c| c.id != id);
        if self.canvases.len() == before {
            return Ok(false);
        }

        self.persist()?;
        self.storage.remove(&items_key(id))?;
        self.storage.remove(&background_key(id))?;

        log::info!("Deleted canvas {}", id);
        Ok(true)
    }

    fn persist(&self) -> StorageResult<()> {
        write_json(self.storage.as_ref(), CANVAS_LIST_KEY, &self.canvases)
    }
}
