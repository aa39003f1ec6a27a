//! The open canvas: routes user events into the item store and history.

use crate::background::BackgroundColor;
use crate::collection::ItemCollection;
use crate::config::EditorConfig;
use crate::dnd::DropEvent;
use crate::export::{Affordances, ExportError, PngExport, SnapshotRenderer, export_png};
use crate::history::HistoryLog;
use crate::item::{CanvasItem, ItemId, ItemView};
use crate::storage::{KeyValueStore, StorageResult};
use crate::store::ItemStore;
use crate::upload::{ImageFile, ImageHost, UploadError, UploadOutcome, UploadTicket, upload_with};
use std::sync::Arc;

/// Editing session for one canvas.
pub struct CanvasSurface<S: KeyValueStore + ?Sized> {
    storage: Arc<S>,
    store: ItemStore<S>,
    history: HistoryLog,
    background: BackgroundColor,
}

impl<S: KeyValueStore + ?Sized> CanvasSurface<S> {
    /// Open a canvas with a fresh history.
    pub fn open(storage: Arc<S>, canvas_id: &str, config: &EditorConfig) -> StorageResult<Self> {
        let history = match config.history_limit {
            Some(limit) => HistoryLog::with_limit(limit),
            None => HistoryLog::new(),
        };
        Self::open_with_history(storage, canvas_id, history)
    }

    /// Open a canvas, resuming `history` if it belongs to the same canvas.
    ///
    /// The loaded state becomes the first history entry, so the first edit
    /// after opening can be undone.
    pub fn open_with_history(
        storage: Arc<S>,
        canvas_id: &str,
        mut history: HistoryLog,
    ) -> StorageResult<Self> {
        if history.canvas_id().is_some_and(|id| id != canvas_id) {
            history.clear();
        }

        let store = ItemStore::load(storage.clone(), canvas_id, &history)?;
        if history.is_empty() {
            history.push(store.items().clone());
        }
        let background = BackgroundColor::load(storage.as_ref(), canvas_id)?;

        Ok(Self {
            storage,
            store,
            history,
            background,
        })
    }

    pub fn canvas_id(&self) -> &str {
        self.store.canvas_id()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn store(&self) -> &ItemStore<S> {
        &self.store
    }

    /// End the session, handing back the history for later reuse.
    pub fn into_history(self) -> HistoryLog {
        self.history
    }

    /// The collection to render: the history's current snapshot, or the
    /// store's own items while history is empty.
    pub fn visible(&self) -> &ItemCollection {
        match self.history.current() {
            Some(snapshot) => snapshot.as_ref(),
            None => self.store.items(),
        }
    }

    /// Items to render in a stable order.
    pub fn render_list(&self) -> Vec<&CanvasItem> {
        self.visible().sorted()
    }

    /// [`Self::render_list`] as views ready to hand to the page.
    pub fn render_views(&self) -> Vec<ItemView<'_>> {
        self.render_list().into_iter().map(CanvasItem::view).collect()
    }

    /// Handle an item released over the canvas.
    pub fn handle_drop(&mut self, event: &DropEvent) -> StorageResult<ItemId> {
        self.store.place_item(
            &mut self.history,
            event.item_type(),
            event.position(),
            event.existing_id(),
        )
    }

    /// Handle a content edit (text blur, image chosen).
    pub fn edit_content(
        &mut self,
        item_id: &str,
        content: impl Into<String>,
    ) -> StorageResult<bool> {
        self.store.update_content(&mut self.history, item_id, content)
    }

    /// Handle the delete button of an item.
    pub fn delete_item(&mut self, item_id: &str) -> StorageResult<bool> {
        self.store.delete_item(&mut self.history, item_id)
    }

    /// Step back one edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> StorageResult<bool> {
        if !self.history.undo() {
            return Ok(false);
        }
        self.sync_from_history()?;
        Ok(true)
    }

    /// Re-apply an undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> StorageResult<bool> {
        if !self.history.redo() {
            return Ok(false);
        }
        self.sync_from_history()?;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn sync_from_history(&mut self) -> StorageResult<()> {
        if let Some(snapshot) = self.history.current() {
            self.store.restore(snapshot)?;
        }
        Ok(())
    }

    pub fn background(&self) -> BackgroundColor {
        self.background
    }

    /// Change and persist the background color.
    pub fn set_background(&mut self, color: BackgroundColor) -> StorageResult<()> {
        color.save(self.storage.as_ref(), self.canvas_id())?;
        self.background = color;
        Ok(())
    }

    /// Start an image upload for an item. See [`ItemStore::begin_upload`].
    pub fn begin_upload(&mut self, item_id: &str) -> Option<UploadTicket> {
        self.store.begin_upload(item_id)
    }

    /// Apply a finished upload. See [`ItemStore::complete_upload`].
    pub fn finish_upload(
        &mut self,
        ticket: &UploadTicket,
        result: Result<String, UploadError>,
    ) -> StorageResult<UploadOutcome> {
        self.store.complete_upload(&mut self.history, ticket, result)
    }

    /// Upload `file` through `host` and point the item at the result.
    ///
    /// Holds the surface for the whole upload; callers that need to keep
    /// editing meanwhile use [`Self::begin_upload`] and
    /// [`Self::finish_upload`] around [`upload_with`] instead.
    pub async fn upload_image<H>(
        &mut self,
        host: &H,
        item_id: &str,
        file: ImageFile,
    ) -> StorageResult<UploadOutcome>
    where
        H: ImageHost + ?Sized,
    {
        let Some(ticket) = self.begin_upload(item_id) else {
            return Ok(UploadOutcome::Stale);
        };
        let (ticket, result) = upload_with(host, ticket, file).await;
        self.finish_upload(&ticket, result)
    }

    /// Export the card as PNG.
    pub async fn export_png<A, R>(
        &self,
        affordances: &mut A,
        renderer: &R,
    ) -> Result<PngExport, ExportError>
    where
        A: Affordances + ?Sized,
        R: SnapshotRenderer + ?Sized,
    {
        log::debug!("Exporting canvas '{}'", self.canvas_id());
        export_png(affordances, renderer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use crate::storage::{MemoryStorage, items_key};
    use crate::upload::{BoxFuture, DataUrlHost, UploadError, block_on};
    use kurbo::Point;

    fn surface(storage: &Arc<MemoryStorage>) -> CanvasSurface<MemoryStorage> {
        CanvasSurface::open(storage.clone(), "card", &EditorConfig::default()).unwrap()
    }

    fn stored_len(storage: &MemoryStorage) -> usize {
        let json = storage.get(&items_key("card")).unwrap().unwrap();
        ItemCollection::from_json("card", &json).unwrap().len()
    }

    #[test]
    fn test_open_seeds_history() {
        let storage = Arc::new(MemoryStorage::new());
        let surface = surface(&storage);

        assert_eq!(surface.history().len(), 1);
        assert!(surface.visible().is_empty());
        assert!(!surface.can_undo());
    }

    #[test]
    fn test_first_drop_is_undoable() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);

        surface
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::new(10.0, 10.0)))
            .unwrap();
        assert_eq!(surface.render_list().len(), 1);

        assert!(surface.undo().unwrap());
        assert!(surface.render_list().is_empty());
        assert_eq!(stored_len(&storage), 0);

        assert!(surface.redo().unwrap());
        assert_eq!(surface.render_list().len(), 1);
        assert_eq!(stored_len(&storage), 1);
    }

    #[test]
    fn test_drop_existing_moves() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);

        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::new(0.0, 0.0)))
            .unwrap();
        surface.edit_content(&id, "Acme").unwrap();
        surface
            .handle_drop(&DropEvent::placed(id.clone(), ItemType::Text, Point::new(90.0, 40.0)))
            .unwrap();

        let items = surface.render_list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].coordinates, Point::new(90.0, 40.0));
        assert_eq!(items[0].content(), "Acme");
    }

    #[test]
    fn test_dropped_emoji_renders_default_glyph() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Emoji, Point::new(8.0, 8.0)))
            .unwrap();

        let views = surface.render_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, id);
        assert_eq!(views[0].display, crate::item::DEFAULT_EMOJI);

        surface.edit_content(&id, "🎉").unwrap();
        assert_eq!(surface.render_views()[0].display, "🎉");
    }

    #[test]
    fn test_delete_undo_restores() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Emoji, Point::ZERO))
            .unwrap();

        assert!(surface.delete_item(&id).unwrap());
        assert!(surface.visible().get(&id).is_none());
        assert_eq!(stored_len(&storage), 0);

        surface.undo().unwrap();
        assert!(surface.visible().get(&id).is_some());
        assert_eq!(stored_len(&storage), 1);
    }

    #[test]
    fn test_undo_redo_noop_at_bounds() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);

        assert!(!surface.undo().unwrap());
        assert!(!surface.redo().unwrap());
    }

    #[test]
    fn test_edit_after_undo_drops_redo() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();
        surface.edit_content(&id, "first").unwrap();
        surface.edit_content(&id, "second").unwrap();

        surface.undo().unwrap();
        surface.undo().unwrap();
        surface.edit_content(&id, "third").unwrap();

        assert!(!surface.can_redo());
        assert_eq!(surface.visible().get(&id).unwrap().content(), "third");
    }

    #[test]
    fn test_resume_history_same_canvas() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        surface
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        let history = surface.into_history();
        let mut resumed =
            CanvasSurface::open_with_history(storage.clone(), "card", history).unwrap();

        assert_eq!(resumed.render_list().len(), 1);
        assert!(resumed.undo().unwrap());
        assert!(resumed.render_list().is_empty());
    }

    #[test]
    fn test_history_from_other_canvas_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        surface
            .handle_drop(&DropEvent::palette(ItemType::Text, Point::ZERO))
            .unwrap();

        let history = surface.into_history();
        let other = CanvasSurface::open_with_history(storage.clone(), "other", history).unwrap();

        assert!(other.render_list().is_empty());
        assert_eq!(other.history().len(), 1);
        assert!(!other.can_undo());
    }

    #[test]
    fn test_background_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        assert_eq!(surface.background(), BackgroundColor::White);

        surface.set_background(BackgroundColor::Yellow).unwrap();

        let config = EditorConfig::default();
        let reopened = CanvasSurface::open(storage.clone(), "card", &config).unwrap();
        assert_eq!(reopened.background(), BackgroundColor::Yellow);
    }

    #[test]
    fn test_upload_image_inline() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Image, Point::ZERO))
            .unwrap();

        let file = ImageFile::new("logo.png", "image/png", vec![1, 2, 3]);
        let outcome = block_on(surface.upload_image(&DataUrlHost, &id, file)).unwrap();

        assert!(matches!(outcome, UploadOutcome::Applied { .. }));
        assert!(surface.visible().get(&id).unwrap().has_image());
    }

    struct FailingHost;

    impl ImageHost for FailingHost {
        fn upload(&self, _file: ImageFile) -> BoxFuture<'_, Result<String, UploadError>> {
            Box::pin(async { Err(UploadError::Network("connection reset".to_string())) })
        }
    }

    #[test]
    fn test_upload_failure_keeps_content() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Image, Point::ZERO))
            .unwrap();
        let history_len = surface.history().len();

        let file = ImageFile::new("logo.png", "image/png", vec![1, 2, 3]);
        let outcome = block_on(surface.upload_image(&FailingHost, &id, file)).unwrap();

        assert!(matches!(outcome, UploadOutcome::Failed(_)));
        assert_eq!(surface.visible().get(&id).unwrap().content(), "");
        assert_eq!(surface.history().len(), history_len);
    }

    #[test]
    fn test_upload_interleaved_with_undo_is_stale() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Image, Point::ZERO))
            .unwrap();
        surface.edit_content(&id, "data:image/png;base64,AA==").unwrap();

        let ticket = surface.begin_upload(&id).unwrap();
        surface.undo().unwrap();
        let outcome = surface
            .finish_upload(&ticket, Ok("https://img/late.png".to_string()))
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Stale);
        assert_eq!(surface.visible().get(&id).unwrap().content(), "");
    }

    #[test]
    fn test_upload_from_before_delete_loses_to_newer_upload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut surface = surface(&storage);
        let id = surface
            .handle_drop(&DropEvent::palette(ItemType::Image, Point::ZERO))
            .unwrap();

        let old = surface.begin_upload(&id).unwrap();
        surface.delete_item(&id).unwrap();
        surface.undo().unwrap();
        let new = surface.begin_upload(&id).unwrap();

        let old_outcome = surface
            .finish_upload(&old, Ok("https://img/old.png".to_string()))
            .unwrap();
        let new_outcome = surface
            .finish_upload(&new, Ok("https://img/new.png".to_string()))
            .unwrap();

        assert_eq!(old_outcome, UploadOutcome::Stale);
        assert!(matches!(new_outcome, UploadOutcome::Applied { .. }));
        assert_eq!(surface.visible().get(&id).unwrap().content(), "https://img/new.png");
        assert_eq!(stored_len(&storage), 1);
    }
}
