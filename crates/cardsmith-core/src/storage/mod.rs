//! Storage abstraction for persistence.
//!
//! Everything the editor persists lives in a flat string key/value store,
//! mirroring the browser's `localStorage`. Values are JSON except for the
//! background color, which is stored as a bare color name.

mod memory;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Key holding the ordered list of canvas descriptors.
pub const CANVAS_LIST_KEY: &str = "canvasList";

const ITEMS_KEY_PREFIX: &str = "items_";
const BACKGROUND_KEY_PREFIX: &str = "background_color_";

/// Storage key for the items of a canvas.
pub fn items_key(canvas_id: &str) -> String {
    format!("{ITEMS_KEY_PREFIX}{canvas_id}")
}

/// Storage key for the background color of a canvas.
pub fn background_key(canvas_id: &str) -> String {
    format!("{BACKGROUND_KEY_PREFIX}{canvas_id}")
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for key/value storage backends.
///
/// Writes are synchronous so that every mutating editor operation can leave
/// storage mirroring memory before it returns.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Trait for key/value storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Serialize `value` as JSON and store it under `key`.
pub fn write_json<S, T>(storage: &S, key: &str, value: &T) -> StorageResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json =
        serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.set(key, &json)
}

/// Read and parse the JSON value stored under `key`.
///
/// A missing key or a value that fails to parse yields `T::default()`; the
/// latter is logged. Backend failures are propagated.
pub fn read_json_or_default<S, T>(storage: &S, key: &str) -> StorageResult<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get(key)? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::warn!("Ignoring malformed value under '{}': {}", key, e);
            Ok(T::default())
        }
    }
}
