//! Canvas items: the text, image and emoji elements placed on a card.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a placed item.
///
/// Kept as a plain string so that ids written by older builds load unchanged.
pub type ItemId = String;

/// Glyph shown for emoji items that carry no content yet.
pub const DEFAULT_EMOJI: &str = "😂";

/// Generate a fresh item identifier.
pub fn new_item_id() -> ItemId {
    Uuid::new_v4().to_string()
}

/// Kind of a canvas item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Editable text block (default).
    #[default]
    Text,
    /// Raster image, referenced by URL or data URL.
    Image,
    /// A single emoji glyph.
    Emoji,
}

impl ItemType {
    /// Name used on the wire and in drag payloads.
    pub fn name(&self) -> &'static str {
        match self {
            ItemType::Text => "text",
            ItemType::Image => "image",
            ItemType::Emoji => "emoji",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(ItemType::Text),
            "image" => Some(ItemType::Image),
            "emoji" => Some(ItemType::Emoji),
            _ => None,
        }
    }

    /// Get all item types.
    pub fn all() -> &'static [ItemType] {
        &[ItemType::Text, ItemType::Image, ItemType::Emoji]
    }
}

/// Per-kind payload of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemBody {
    Text {
        text: String,
    },
    Image {
        /// Hosted URL or `data:` URL. Empty until an image is chosen.
        source: String,
    },
    Emoji {
        glyph: String,
    },
}

impl ItemBody {
    /// Build a body of the given kind around existing content.
    pub fn with_content(kind: ItemType, content: String) -> Self {
        match kind {
            ItemType::Text => ItemBody::Text { text: content },
            ItemType::Image => ItemBody::Image { source: content },
            ItemType::Emoji => ItemBody::Emoji { glyph: content },
        }
    }

    /// An empty body of the given kind.
    pub fn empty(kind: ItemType) -> Self {
        Self::with_content(kind, String::new())
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            ItemBody::Text { .. } => ItemType::Text,
            ItemBody::Image { .. } => ItemType::Image,
            ItemBody::Emoji { .. } => ItemType::Emoji,
        }
    }

    /// Raw content string, whatever the kind.
    pub fn content(&self) -> &str {
        match self {
            ItemBody::Text { text } => text,
            ItemBody::Image { source } => source,
            ItemBody::Emoji { glyph } => glyph,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            ItemBody::Text { text } => text,
            ItemBody::Image { source } => source,
            ItemBody::Emoji { glyph } => glyph,
        }
    }

    /// Replace the content, keeping the kind.
    pub fn set_content(&mut self, content: String) {
        match self {
            ItemBody::Text { text } => *text = content,
            ItemBody::Image { source } => *source = content,
            ItemBody::Emoji { glyph } => *glyph = content,
        }
    }

    /// Change the kind, carrying the content over unchanged.
    pub fn retyped(self, kind: ItemType) -> Self {
        if self.item_type() == kind {
            return self;
        }
        Self::with_content(kind, self.into_content())
    }
}

/// An element placed on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredItem", into = "StoredItem")]
pub struct CanvasItem {
    /// Stable for the lifetime of the item.
    pub id: ItemId,
    /// Owning canvas. Empty for entries written before ownership was recorded.
    pub canvas_id: String,
    /// Top-left position on the canvas.
    pub coordinates: Point,
    pub body: ItemBody,
}

impl CanvasItem {
    /// Create an empty item of `kind` at `coordinates` with a fresh id.
    pub fn new(canvas_id: impl Into<String>, kind: ItemType, coordinates: Point) -> Self {
        Self {
            id: new_item_id(),
            canvas_id: canvas_id.into(),
            coordinates,
            body: ItemBody::empty(kind),
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.body.item_type()
    }

    pub fn content(&self) -> &str {
        self.body.content()
    }

    /// Glyph to render for emoji items.
    pub fn emoji_glyph(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Emoji { glyph } if glyph.is_empty() => Some(DEFAULT_EMOJI),
            ItemBody::Emoji { glyph } => Some(glyph.as_str()),
            _ => None,
        }
    }

    /// Whether an image item has a source to display.
    pub fn has_image(&self) -> bool {
        matches!(&self.body, ItemBody::Image { source } if !source.is_empty())
    }

    /// Borrowed view for rendering.
    pub fn view(&self) -> ItemView<'_> {
        ItemView {
            id: &self.id,
            item_type: self.item_type(),
            coordinates: self.coordinates,
            content: self.content(),
            display: self.emoji_glyph().unwrap_or_else(|| self.content()),
            has_image: self.has_image(),
        }
    }
}

/// What the page needs to draw one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub coordinates: Point,
    /// Raw content, for editors.
    pub content: &'a str,
    /// Text to show; emoji items without content get [`DEFAULT_EMOJI`].
    pub display: &'a str,
    pub has_image: bool,
}

/// Flat persisted shape of an item: `{id, type, coordinates, content, routeId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    item_type: ItemType,
    #[serde(default)]
    coordinates: Point,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    route_id: Option<String>,
}

impl From<StoredItem> for CanvasItem {
    fn from(stored: StoredItem) -> Self {
        Self {
            id: stored.id,
            canvas_id: stored.route_id.unwrap_or_default(),
            coordinates: stored.coordinates,
            body: ItemBody::with_content(stored.item_type, stored.content.unwrap_or_default()),
        }
    }
}

impl From<CanvasItem> for StoredItem {
    fn from(item: CanvasItem) -> Self {
        Self {
            id: item.id,
            item_type: item.body.item_type(),
            coordinates: item.coordinates,
            content: Some(item.body.into_content()),
            route_id: (!item.canvas_id.is_empty()).then_some(item.canvas_id),
        }
    }
}
