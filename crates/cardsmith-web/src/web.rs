//! WebAssembly entry point and the JavaScript-facing editor handle.

use crate::cloudinary::CloudinaryHost;
use crate::dom::{CANVAS_ELEMENT_ID, DomAffordances, Html2CanvasRenderer, download};
use crate::route::Route;
use cardsmith_core::export::export_png;
use cardsmith_core::storage::{LocalStorage, StorageResult};
use cardsmith_core::upload::{DataUrlHost, ImageFile, ImageHost, UploadOutcome, upload_with};
use cardsmith_core::{
    BackgroundColor, CanvasSurface, DropEvent, DropPayload, EditorConfig, Workspace,
};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};
use web_sys::{Document, File};

/// Initialize logging and panic reporting.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to initialize logger: {e}").into());
    }

    log::info!("Starting Cardsmith (WASM)");
}

type SharedWorkspace = Rc<RefCell<Workspace<LocalStorage>>>;

/// Editor state shared with the page.
#[wasm_bindgen]
pub struct CardEditor {
    workspace: SharedWorkspace,
    host: Rc<dyn ImageHost>,
}

#[wasm_bindgen]
impl CardEditor {
    /// Create the editor. `config` is an optional `EditorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CardEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let host: Rc<dyn ImageHost> = match &config.upload {
            Some(cloudinary) => Rc::new(CloudinaryHost::new(cloudinary.clone())),
            None => {
                log::info!("No image host configured, keeping images inline");
                Rc::new(DataUrlHost)
            }
        };

        let storage = Arc::new(LocalStorage::new().map_err(js_error)?);
        let workspace = Workspace::new(storage, config).map_err(js_error)?;

        Ok(Self {
            workspace: Rc::new(RefCell::new(workspace)),
            host,
        })
    }

    /// All canvases as `{id, name, createdAt, lastEdited?}` objects.
    pub fn canvases(&self) -> Result<JsValue, JsValue> {
        to_js(self.workspace.borrow().canvases())
    }

    /// Create a canvas, open it and return its page path.
    #[wasm_bindgen(js_name = createCanvas)]
    pub fn create_canvas(&self) -> Result<String, JsValue> {
        let canvas = self.workspace.borrow_mut().create_canvas().map_err(js_error)?;
        Ok(Route::Canvas(canvas.id).path())
    }

    /// Open whatever canvas `path` points at. Returns its id, or `undefined`
    /// for non-canvas pages.
    #[wasm_bindgen(js_name = openPath)]
    pub fn open_path(&self, path: &str) -> Result<Option<String>, JsValue> {
        match Route::from_path(path) {
            Route::Canvas(id) => {
                self.open_canvas(&id)?;
                Ok(Some(id))
            }
            Route::Home => {
                self.close_canvas();
                Ok(None)
            }
        }
    }

    #[wasm_bindgen(js_name = openCanvas)]
    pub fn open_canvas(&self, canvas_id: &str) -> Result<(), JsValue> {
        self.workspace.borrow_mut().open_canvas(canvas_id).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = closeCanvas)]
    pub fn close_canvas(&self) {
        self.workspace.borrow_mut().close_canvas();
    }

    #[wasm_bindgen(js_name = renameCanvas)]
    pub fn rename_canvas(&self, canvas_id: &str, name: &str) -> Result<bool, JsValue> {
        self.workspace.borrow_mut().rename_canvas(canvas_id, name).map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteCanvas)]
    pub fn delete_canvas(&self, canvas_id: &str) -> Result<bool, JsValue> {
        self.workspace.borrow_mut().delete_canvas(canvas_id).map_err(js_error)
    }

    /// Name of the open canvas.
    #[wasm_bindgen(js_name = canvasName)]
    pub fn canvas_name(&self) -> Option<String> {
        self.workspace.borrow().active_name().map(str::to_string)
    }

    /// Items of the open canvas in render order.
    pub fn items(&self) -> Result<JsValue, JsValue> {
        let workspace = self.workspace.borrow();
        let surface = workspace.active().ok_or_else(no_canvas)?;
        to_js(&surface.render_views())
    }

    /// Handle a drop reported by the drag layer as `{id?, type?, x?, y?}`.
    #[wasm_bindgen(js_name = handleDrop)]
    pub fn handle_drop(&self, payload: JsValue) -> Result<String, JsValue> {
        let payload: DropPayload = serde_wasm_bindgen::from_value(payload)?;
        let event = DropEvent::from(payload);

        let mut placed = None;
        self.edit(|surface| {
            placed = Some(surface.handle_drop(&event)?);
            Ok(true)
        })?;
        placed.ok_or_else(no_canvas)
    }

    #[wasm_bindgen(js_name = editContent)]
    pub fn edit_content(&self, item_id: &str, content: String) -> Result<bool, JsValue> {
        self.edit(|surface| surface.edit_content(item_id, content))
    }

    #[wasm_bindgen(js_name = deleteItem)]
    pub fn delete_item(&self, item_id: &str) -> Result<bool, JsValue> {
        self.edit(|surface| surface.delete_item(item_id))
    }

    pub fn undo(&self) -> Result<bool, JsValue> {
        self.edit(|surface| surface.undo())
    }

    pub fn redo(&self) -> Result<bool, JsValue> {
        self.edit(|surface| surface.redo())
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.workspace.borrow().active().is_some_and(|s| s.can_undo())
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.workspace.borrow().active().is_some_and(|s| s.can_redo())
    }

    /// Background color name of the open canvas.
    pub fn background(&self) -> Option<String> {
        self.workspace
            .borrow()
            .active()
            .map(|s| s.background().name().to_string())
    }

    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&self, color: &str) -> Result<(), JsValue> {
        let color: BackgroundColor = color.parse().map_err(js_error)?;
        let mut workspace = self.workspace.borrow_mut();
        let surface = workspace.active_mut().ok_or_else(no_canvas)?;
        surface.set_background(color).map_err(js_error)
    }

    /// Upload `file` for an image item. Resolves to the hosted URL, or
    /// `undefined` if a newer edit superseded the upload.
    #[wasm_bindgen(js_name = uploadImage)]
    pub fn upload_image(&self, item_id: String, file: File) -> js_sys::Promise {
        let workspace = self.workspace.clone();
        let host = self.host.clone();

        future_to_promise(async move {
            let (canvas_id, ticket) = {
                let mut workspace = workspace.borrow_mut();
                let surface = workspace.active_mut().ok_or_else(no_canvas)?;
                match surface.begin_upload(&item_id) {
                    Some(ticket) => (surface.canvas_id().to_string(), ticket),
                    None => return Ok(JsValue::UNDEFINED),
                }
            };

            let bytes = JsFuture::from(file.array_buffer()).await?;
            let bytes = js_sys::Uint8Array::new(&bytes).to_vec();
            let image = ImageFile::new(file.name(), file.type_(), bytes);
            let (ticket, result) = upload_with(host.as_ref(), ticket, image).await;

            let mut workspace = workspace.borrow_mut();
            let active = workspace.active_mut().filter(|s| s.canvas_id() == canvas_id);
            let Some(surface) = active else {
                log::info!("Canvas '{}' closed before upload finished", canvas_id);
                return Ok(JsValue::UNDEFINED);
            };
            let outcome = surface.finish_upload(&ticket, result).map_err(js_error)?;

            match outcome {
                UploadOutcome::Applied { url } => {
                    workspace.mark_edited().map_err(js_error)?;
                    Ok(JsValue::from_str(&url))
                }
                UploadOutcome::Stale => Ok(JsValue::UNDEFINED),
                UploadOutcome::Failed(e) => Err(js_error(e)),
            }
        })
    }

    /// Render the card to PNG and offer it as `canvas.png`.
    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self) -> js_sys::Promise {
        future_to_promise(async move {
            let document = document()?;
            let renderer = Html2CanvasRenderer::for_element_id(&document, CANVAS_ELEMENT_ID)
                .map_err(js_error)?;
            let mut affordances = DomAffordances::new(document.clone());

            let export = export_png(&mut affordances, &renderer).await.map_err(js_error)?;
            download(&document, &export)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

impl CardEditor {
    /// Run an edit on the open canvas. Returns whether it changed anything.
    fn edit(
        &self,
        f: impl FnOnce(&mut CanvasSurface<LocalStorage>) -> StorageResult<bool>,
    ) -> Result<bool, JsValue> {
        self.workspace
            .borrow_mut()
            .edit_active(f)
            .map_err(js_error)?
            .ok_or_else(no_canvas)
    }
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document"))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(value.serialize(&serializer)?)
}

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn no_canvas() -> JsValue {
    JsValue::from_str("No canvas open")
}
