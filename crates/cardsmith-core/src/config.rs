//! Editor configuration.

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::registry::DEFAULT_CANVAS_NAME;
use crate::upload::CloudinaryConfig;
use serde::{Deserialize, Serialize};

/// Settings for an editor session. Every field has a default, so an empty
/// JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum undo snapshots per canvas; `None` keeps all of them.
    pub history_limit: Option<usize>,
    /// Name given to new canvases.
    pub default_canvas_name: String,
    /// Image hosting. Without it images are stored inline as data URLs.
    pub upload: Option<CloudinaryConfig>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            default_canvas_name: DEFAULT_CANVAS_NAME.to_string(),
            upload: None,
        }
    }
}

impl EditorConfig {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
