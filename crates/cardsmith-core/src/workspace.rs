//! Application state for one browser session.
//!
//! Owns the canvas registry and at most one open [`CanvasSurface`]. Histories
//! of canvases that were closed during the session are kept, so navigating
//! away and back still allows undo; nothing about history is persisted.

use crate::config::EditorConfig;
use crate::history::HistoryLog;
use crate::registry::{CanvasDescriptor, CanvasRegistry};
use crate::storage::{KeyValueStore, StorageResult};
use crate::surface::CanvasSurface;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Workspace<S: KeyValueStore + ?Sized> {
    storage: Arc<S>,
    config: EditorConfig,
    registry: CanvasRegistry<S>,
    active: Option<CanvasSurface<S>>,
    parked_histories: HashMap<String, HistoryLog>,
}

impl<S: KeyValueStore + ?Sized> Workspace<S> {
    /// Start a session: loads the canvas registry once.
    pub fn new(storage: Arc<S>, config: EditorConfig) -> StorageResult<Self> {
        let registry = CanvasRegistry::load(storage.clone())?
            .with_default_name(config.default_canvas_name.clone());

        Ok(Self {
            storage,
            config,
            registry,
            active: None,
            parked_histories: HashMap::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvases(&self) -> &[CanvasDescriptor] {
        self.registry.list()
    }

    pub fn registry(&self) -> &CanvasRegistry<S> {
        &self.registry
    }

    /// Create a canvas and switch to it.
    pub fn create_canvas(&mut self) -> StorageResult<CanvasDescriptor> {
        let canvas = self.registry.create_canvas()?;
        self.open_canvas(&canvas.id)?;
        Ok(canvas)
    }

    /// Switch to a canvas, closing the current one.
    ///
    /// Canvases missing from the registry can still be opened (e.g. a stale
    /// link); they just have no name.
    pub fn open_canvas(&mut self, canvas_id: &str) -> StorageResult<&mut CanvasSurface<S>> {
        let surface = match self.active.take() {
            Some(surface) if surface.canvas_id() == canvas_id => surface,
            current => {
                if let Some(previous) = current {
                    self.park(previous);
                }
                let surface = match self.parked_histories.remove(canvas_id) {
                    Some(history) => {
                        CanvasSurface::open_with_history(self.storage.clone(), canvas_id, history)?
                    }
                    None => CanvasSurface::open(self.storage.clone(), canvas_id, &self.config)?,
                };
                log::info!("Opened canvas '{}'", canvas_id);
                surface
            }
        };

        Ok(self.active.insert(surface))
    }

    /// Close the open canvas, if any.
    pub fn close_canvas(&mut self) {
        if let Some(surface) = self.active.take() {
            self.park(surface);
        }
    }

    fn park(&mut self, surface: CanvasSurface<S>) {
        let canvas_id = surface.canvas_id().to_string();
        self.parked_histories.insert(canvas_id, surface.into_history());
    }

    pub fn active(&self) -> Option<&CanvasSurface<S>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut CanvasSurface<S>> {
        self.active.as_mut()
    }

    /// Name of the open canvas.
    pub fn active_name(&self) -> Option<&str> {
        let id = self.active.as_ref()?.canvas_id();
        self.registry.get(id).map(|c| c.name.as_str())
    }

    pub fn rename_canvas(
        &mut self,
        canvas_id: &str,
        name: impl Into<String>,
    ) -> StorageResult<bool> {
        self.registry.rename_canvas(canvas_id, name)
    }

    /// Delete a canvas, closing it first if it is open.
    pub fn delete_canvas(&mut self, canvas_id: &str) -> StorageResult<bool> {
        if self.active.as_ref().is_some_and(|s| s.canvas_id() == canvas_id) {
            self.active = None;
        }
        self.parked_histories.remove(canvas_id);
        self.registry.delete_canvas(canvas_id)
    }

    /// Run an edit on the open canvas.
    ///
    /// `edit` reports whether it changed anything; only then is the canvas
    /// stamped as edited. `Ok(None)` when no canvas is open.
    pub fn edit_active<F>(&mut self, edit: F) -> StorageResult<Option<bool>>
    where
        F: FnOnce(&mut CanvasSurface<S>) -> StorageResult<bool>,
    {
        let Some(surface) = self.active.as_mut() else {
            return Ok(None);
        };
        let changed = edit(surface)?;
        if changed {
            self.mark_edited()?;
        }
        Ok(Some(changed))
    }

    /// Stamp the open canvas as just edited.
    pub fn mark_edited(&mut self) -> StorageResult<()> {
        if let Some(surface) = &self.active {
            self.registry.touch(surface.canvas_id())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::DropEvent;
    use crate::item::ItemType;
    use crate::storage::{MemoryStorage, items_key};
    use kurbo::Point;

    fn workspace() -> (Arc<MemoryStorage>, Workspace<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let workspace = Workspace::new(storage.clone(), EditorConfig::default()).unwrap();
        (storage, workspace)
    }

    #[test]
    fn test_create_opens_empty_canvas() {
        let (_, mut ws) = workspace();

        let canvas = ws.create_canvas().unwrap();

        let surface = ws.active().unwrap();
        assert_eq!(surface.canvas_id(), canvas.id);
        assert!(surface.visible().is_empty());
        assert_eq!(ws.active_name(), Some("Untitled"));
        assert_eq!(ws.canvases().len(), 1);
    }

    #[test]
    fn test_new_canvas_starts_clean() {
        let (_, mut ws) = workspace();
        ws.create_canvas().unwrap();
        ws.active_mut()
            .unwrap()
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        ws.create_canvas().unwrap();
        let surface = ws.active().unwrap();
        assert!(surface.visible().is_empty());
        assert!(!surface.can_undo());
    }

    #[test]
    fn test_reopen_keeps_session_history() {
        let (_, mut ws) = workspace();
        let first = ws.create_canvas().unwrap();
        ws.active_mut()
            .unwrap()
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        ws.create_canvas().unwrap();
        let surface = ws.open_canvas(&first.id).unwrap();

        assert_eq!(surface.render_list().len(), 1);
        assert!(surface.undo().unwrap());
        assert!(surface.render_list().is_empty());
    }

    #[test]
    fn test_new_session_loads_from_storage() {
        let (storage, mut ws) = workspace();
        let canvas = ws.create_canvas().unwrap();
        ws.active_mut()
            .unwrap()
            .handle_drop(&DropEvent::palette(ItemType::Image, Point::new(5.0, 5.0)))
            .unwrap();

        let mut next = Workspace::new(storage, EditorConfig::default()).unwrap();
        assert_eq!(next.canvases().len(), 1);

        let surface = next.open_canvas(&canvas.id).unwrap();
        assert_eq!(surface.render_list().len(), 1);
        assert!(!surface.can_undo());
    }

    #[test]
    fn test_rename_and_mark_edited() {
        let (_, mut ws) = workspace();
        let canvas = ws.create_canvas().unwrap();

        assert!(ws.rename_canvas(&canvas.id, "Acme").unwrap());
        ws.mark_edited().unwrap();

        let descriptor = ws.registry().get(&canvas.id).unwrap();
        assert_eq!(descriptor.name, "Acme");
        assert!(descriptor.last_edited.is_some());
        assert_eq!(ws.active_name(), Some("Acme"));
    }

    #[test]
    fn test_edit_active_stamps_only_changes() {
        let (_, mut ws) = workspace();
        let canvas = ws.create_canvas().unwrap();
        let last_edited = |ws: &Workspace<MemoryStorage>| {
            ws.registry().get(&canvas.id).and_then(|c| c.last_edited)
        };

        assert_eq!(ws.edit_active(|s| s.undo()).unwrap(), Some(false));
        assert_eq!(ws.edit_active(|s| s.delete_item("ghost")).unwrap(), Some(false));
        assert_eq!(ws.edit_active(|s| s.edit_content("ghost", "boo")).unwrap(), Some(false));
        assert!(last_edited(&ws).is_none());

        let changed = ws
            .edit_active(|s| {
                s.handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))?;
                Ok(true)
            })
            .unwrap();
        assert_eq!(changed, Some(true));
        assert!(last_edited(&ws).is_some());
    }

    #[test]
    fn test_edit_without_open_canvas() {
        let (_, mut ws) = workspace();
        assert_eq!(ws.edit_active(|s| s.undo()).unwrap(), None);
    }

    #[test]
    fn test_delete_open_canvas() {
        let (storage, mut ws) = workspace();
        let canvas = ws.create_canvas().unwrap();
        ws.active_mut()
            .unwrap()
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        assert!(ws.delete_canvas(&canvas.id).unwrap());

        assert!(ws.active().is_none());
        assert!(ws.canvases().is_empty());
        assert!(storage.get(&items_key(&canvas.id)).unwrap().is_none());
    }

    #[test]
    fn test_open_same_canvas_is_noop() {
        let (_, mut ws) = workspace();
        let canvas = ws.create_canvas().unwrap();
        ws.active_mut()
            .unwrap()
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        let surface = ws.open_canvas(&canvas.id).unwrap();
        assert!(surface.can_undo());
    }

    #[test]
    fn test_custom_default_name() {
        let storage = Arc::new(MemoryStorage::new());
        let config = EditorConfig {
            default_canvas_name: "My card".to_string(),
            ..EditorConfig::default()
        };
        let mut ws = Workspace::new(storage, config).unwrap();

        assert_eq!(ws.create_canvas().unwrap().name, "My card");
    }
}
