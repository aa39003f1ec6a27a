//! Drop events delivered by the drag-and-drop layer.

use crate::item::{ItemId, ItemType};
use kurbo::Point;
use serde::Deserialize;

/// What was dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A new element dragged from the palette.
    Palette(ItemType),
    /// An element already on the canvas.
    Placed { id: ItemId, item_type: ItemType },
}

/// An item released over the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    pub source: DragSource,
    /// Client offset of the drop; `None` when the backend couldn't report one.
    pub target: Option<Point>,
}

impl DropEvent {
    /// Drop a new palette element.
    pub fn palette(item_type: ItemType, target: Point) -> Self {
        Self {
            source: DragSource::Palette(item_type),
            target: Some(target),
        }
    }

    /// Drop an element that is already on the canvas.
    pub fn placed(id: impl Into<ItemId>, item_type: ItemType, target: Point) -> Self {
        Self {
            source: DragSource::Placed {
                id: id.into(),
                item_type,
            },
            target: Some(target),
        }
    }

    /// Where the item lands; the origin if no offset was reported.
    pub fn position(&self) -> Point {
        self.target.unwrap_or(Point::ZERO)
    }

    pub fn item_type(&self) -> ItemType {
        match &self.source {
            DragSource::Palette(kind) => *kind,
            DragSource::Placed { item_type, .. } => *item_type,
        }
    }

    /// Id of the dragged canvas item, if it was one.
    pub fn existing_id(&self) -> Option<&str> {
        match &self.source {
            DragSource::Palette(_) => None,
            DragSource::Placed { id, .. } => Some(id.as_str()),
        }
    }
}

/// Loosely typed drop payload as produced by the browser layer:
/// `{ id?, type?, x?, y? }`.
#[derive(Debug, Default, Deserialize)]
pub struct DropPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl From<DropPayload> for DropEvent {
    fn from(payload: DropPayload) -> Self {
        let item_type = payload.item_type.unwrap_or_default();
        let target = match (payload.x, payload.y) {
            (None, None) => None,
            (x, y) => Some(Point::new(x.unwrap_or(0.0), y.unwrap_or(0.0))),
        };

        // Palette entries use their type name as drag id
        let source = match payload.id {
            Some(id) if ItemType::from_name(&id).is_none() => DragSource::Placed { id, item_type },
            _ => DragSource::Palette(item_type),
        };

        Self { source, target }
    }
}
