//! DOM side of PNG export.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cardsmith_core::export::{Affordances, ExportError, PngExport, SnapshotRenderer};
use cardsmith_core::upload::BoxFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlAnchorElement, HtmlCanvasElement, HtmlElement};

/// Class carried by drag handles, delete buttons and file pickers.
const HIDE_CLASS_SELECTOR: &str = ".hide-item";

/// Id of the card element.
pub const CANVAS_ELEMENT_ID: &str = "canvas";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = html2canvas)]
    fn html2canvas(element: &HtmlElement, options: &JsValue) -> js_sys::Promise;
}

/// Editor controls marked with the `hide-item` class.
pub struct DomAffordances {
    document: Document,
}

impl DomAffordances {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl Affordances for DomAffordances {
    fn set_visible(&mut self, visible: bool) {
        let Ok(nodes) = self.document.query_selector_all(HIDE_CLASS_SELECTOR) else {
            return;
        };
        let visibility = if visible { "visible" } else { "hidden" };

        for i in 0..nodes.length() {
            let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
                continue;
            };
            if let Err(e) = element.style().set_property("visibility", visibility) {
                log::warn!("Failed to set visibility: {:?}", e);
            }
        }
    }
}

/// Renders an element through the page's `html2canvas` global.
pub struct Html2CanvasRenderer {
    element: HtmlElement,
}

impl Html2CanvasRenderer {
    /// Renderer for the element with the given id.
    pub fn for_element_id(document: &Document, id: &str) -> Result<Self, ExportError> {
        let element = document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| ExportError::Render(format!("No element #{id}")))?;
        Ok(Self { element })
    }

    async fn render(&self) -> Result<Vec<u8>, ExportError> {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"useCORS".into(), &JsValue::TRUE).map_err(render_error)?;

        let canvas: HtmlCanvasElement = JsFuture::from(html2canvas(&self.element, &options))
            .await
            .map_err(render_error)?
            .dyn_into()
            .map_err(render_error)?;

        let data_url = canvas.to_data_url_with_type("image/png").map_err(render_error)?;
        decode_data_url(&data_url)
    }
}

impl SnapshotRenderer for Html2CanvasRenderer {
    fn render_png(&self) -> BoxFuture<'_, Result<Vec<u8>, ExportError>> {
        Box::pin(self.render())
    }
}

fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ExportError> {
    let (_, payload) = data_url
        .split_once(";base64,")
        .ok_or_else(|| ExportError::Render("Canvas returned no base64 payload".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| ExportError::Render(e.to_string()))
}

fn render_error(e: JsValue) -> ExportError {
    ExportError::Render(format!("{:?}", e))
}

/// Offer the export as a download through a temporary anchor.
pub fn download(document: &Document, export: &PngExport) -> Result<(), JsValue> {
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&export.to_data_url());
    anchor.set_download(export.file_name);
    anchor.click();
    Ok(())
}
