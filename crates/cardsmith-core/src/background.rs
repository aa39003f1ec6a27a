//! Per-canvas background color.

use crate::storage::{KeyValueStore, StorageResult, background_key};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Background colors offered for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColor {
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BackgroundColor {
    /// CSS color name, also the persisted form.
    pub fn name(&self) -> &'static str {
        match self {
            BackgroundColor::White => "white",
            BackgroundColor::Red => "red",
            BackgroundColor::Orange => "orange",
            BackgroundColor::Yellow => "yellow",
            BackgroundColor::Green => "green",
            BackgroundColor::Blue => "blue",
            BackgroundColor::Purple => "purple",
        }
    }

    /// The palette in display order.
    pub fn all() -> &'static [BackgroundColor] {
        &[
            BackgroundColor::White,
            BackgroundColor::Red,
            BackgroundColor::Orange,
            BackgroundColor::Yellow,
            BackgroundColor::Green,
            BackgroundColor::Blue,
            BackgroundColor::Purple,
        ]
    }

    /// Load the background of a canvas. Unknown values fall back to white.
    pub fn load<S: KeyValueStore + ?Sized>(storage: &S, canvas_id: &str) -> StorageResult<Self> {
        let Some(raw) = storage.get(&background_key(canvas_id))? else {
            return Ok(Self::default());
        };

        Ok(raw.parse().unwrap_or_else(|_| {
            log::warn!("Unknown background color '{}' for canvas '{}'", raw, canvas_id);
            Self::default()
        }))
    }

    /// Persist as the background of a canvas.
    pub fn save<S>(&self, storage: &S, canvas_id: &str) -> StorageResult<()>
    where
        S: KeyValueStore + ?Sized,
    {
        // Stored bare, not JSON-quoted
        storage.set(&background_key(canvas_id), self.name())
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for color names outside the palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown background color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for BackgroundColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_default_is_white() {
        let storage = MemoryStorage::new();
        assert_eq!(BackgroundColor::load(&storage, "card").unwrap(), BackgroundColor::White);
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        BackgroundColor::Purple.save(&storage, "card").unwrap();

        assert_eq!(storage.get("background_color_card").unwrap().as_deref(), Some("purple"));
        assert_eq!(BackgroundColor::load(&storage, "card").unwrap(), BackgroundColor::Purple);
        assert_eq!(BackgroundColor::load(&storage, "other").unwrap(), BackgroundColor::White);
    }

    #[test]
    fn test_unknown_falls_back() {
        let storage = MemoryStorage::new();
        storage.set("background_color_card", "#ff00ff").unwrap();

        assert_eq!(BackgroundColor::load(&storage, "card").unwrap(), BackgroundColor::White);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Blue".parse::<BackgroundColor>(), Ok(BackgroundColor::Blue));
        assert_eq!(" green ".parse::<BackgroundColor>(), Ok(BackgroundColor::Green));
        assert!("teal".parse::<BackgroundColor>().is_err());
        assert_eq!(BackgroundColor::all().len(), 7);
    }
}
