//! Cardsmith Core Library
//!
//! Platform-agnostic state for the Cardsmith business card editor: placed
//! items, per-canvas undo history, the canvas registry and persistence.

pub mod background;
pub mod collection;
pub mod config;
pub mod dnd;
pub mod export;
pub mod history;
pub mod item;
pub mod registry;
pub mod storage;
pub mod store;
pub mod surface;
pub mod upload;
pub mod workspace;

pub use background::BackgroundColor;
pub use collection::ItemCollection;
pub use config::EditorConfig;
pub use dnd::{DragSource, DropEvent, DropPayload};
pub use export::{Affordances, EXPORT_FILE_NAME, ExportError, PngExport, SnapshotRenderer};
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryLog, Snapshot};
pub use item::{CanvasItem, ItemBody, ItemId, ItemType, ItemView};
pub use registry::{CanvasDescriptor, CanvasRegistry};
pub use storage::{KeyValueStore, MemoryStorage, StorageError, StorageResult};
pub use store::ItemStore;
pub use surface::CanvasSurface;
pub use upload::{
    BoxFuture, CloudinaryConfig, DataUrlHost, ImageFile, ImageHost, UploadError, UploadOutcome,
    UploadTicket,
};
pub use workspace::Workspace;
