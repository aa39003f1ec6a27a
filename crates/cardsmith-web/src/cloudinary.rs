//! Cloudinary unsigned uploads over `fetch`.

use cardsmith_core::upload::{
    BoxFuture, CloudinaryConfig, ImageFile, ImageHost, UploadError, parse_cloudinary_response,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, RequestInit, Response};

/// Posts images to a Cloudinary upload preset.
pub struct CloudinaryHost {
    config: CloudinaryConfig,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self { config }
    }

    async fn post(&self, file: ImageFile) -> Result<String, UploadError> {
        let form = form_data(&file, &self.config.upload_preset).map_err(network_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);

        let window = web_sys::window()
            .ok_or_else(|| UploadError::Network("No window object".to_string()))?;
        let request = window.fetch_with_str_and_init(&self.config.endpoint(), &init);
        let response: Response = JsFuture::from(request)
            .await
            .map_err(network_error)?
            .dyn_into()
            .map_err(network_error)?;

        let body = JsFuture::from(response.text().map_err(network_error)?)
            .await
            .map_err(network_error)?
            .as_string()
            .unwrap_or_default();

        parse_cloudinary_response(response.status(), &body)
    }
}

impl ImageHost for CloudinaryHost {
    fn upload(&self, file: ImageFile) -> BoxFuture<'_, Result<String, UploadError>> {
        Box::pin(async move {
            log::info!("Uploading '{}' to Cloudinary", file.name);
            let result = self.post(file).await;
            if let Err(e) = &result {
                log::error!("Error uploading image to Cloudinary: {}", e);
            }
            result
        })
    }
}

/// Multipart body with `file` and `upload_preset` fields.
fn form_data(file: &ImageFile, upload_preset: &str) -> Result<FormData, JsValue> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(file.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let form = FormData::new()?;
    form.append_with_blob_and_filename("file", &blob, &file.name)?;
    form.append_with_str("upload_preset", upload_preset)?;
    Ok(form)
}

fn network_error(e: JsValue) -> UploadError {
    UploadError::Network(format!("{:?}", e))
}
