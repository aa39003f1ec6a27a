//! Image upload: the hosting collaborator and per-item upload tickets.
//!
//! Uploads are the only asynchronous operation in the editor. A ticket is
//! issued when an upload starts; starting another upload or editing the item
//! invalidates it, so a slow response can never overwrite newer content.

use crate::item::ItemId;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Upload errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("Not an image: {0}")]
    UnsupportedType(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    /// MIME type as reported by the browser, e.g. `image/png`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reject anything that isn't an `image/*` file.
    pub fn ensure_image(&self) -> Result<(), UploadError> {
        if self.mime_type.starts_with("image/") {
            Ok(())
        } else {
            Err(UploadError::UnsupportedType(self.mime_type.clone()))
        }
    }

    /// Encode as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Something that can host an image and hand back its URL.
pub trait ImageHost {
    fn upload(&self, file: ImageFile) -> BoxFuture<'_, Result<String, UploadError>>;
}

/// Keeps images inline as `data:` URLs. Used when no hosting service is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlHost;

impl ImageHost for DataUrlHost {
    fn upload(&self, file: ImageFile) -> BoxFuture<'_, Result<String, UploadError>> {
        Box::pin(async move {
            file.ensure_image()?;
            Ok(file.to_data_url())
        })
    }
}

/// Handle for one in-flight upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub item_id: ItemId,
    pub generation: u64,
}

/// What happened when an upload completed.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The item's content now points at the uploaded image.
    Applied { url: String },
    /// A newer upload or edit superseded this one, or the item is gone.
    Stale,
    /// The host failed; content left unchanged.
    Failed(UploadError),
}

/// Run `file` through `host` for `ticket`.
///
/// Pair with [`crate::store::ItemStore::complete_upload`] once the result is in.
pub async fn upload_with<H>(
    host: &H,
    ticket: UploadTicket,
    file: ImageFile,
) -> (UploadTicket, Result<String, UploadError>)
where
    H: ImageHost + ?Sized,
{
    let result = match file.ensure_image() {
        Ok(()) => host.upload(file).await,
        Err(e) => Err(e),
    };
    (ticket, result)
}

/// Cloudinary unsigned-upload settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

impl CloudinaryConfig {
    /// Upload endpoint for this cloud.
    pub fn endpoint(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cloud_name)
    }
}

#[derive(Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    error: Option<CloudinaryErrorBody>,
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

/// Extract the hosted URL from a Cloudinary upload response body.
pub fn parse_cloudinary_response(status: u16, body: &str) -> Result<String, UploadError> {
    let response: CloudinaryResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(UploadError::Server {
            status,
            message: error.message,
        });
    }

    match response.secure_url {
        Some(url) if (200..300).contains(&status) => Ok(url),
        Some(_) => Err(UploadError::Server {
            status,
            message: "unexpected status".to_string(),
        }),
        None => Err(UploadError::InvalidResponse("missing secure_url".to_string())),
    }
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> ImageFile {
        ImageFile::new("logo.png", "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_data_url() {
        assert_eq!(png().to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_data_url_host() {
        let url = block_on(DataUrlHost.upload(png())).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_rejects_non_image() {
        let file = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());
        let ticket = UploadTicket { item_id: "a".to_string(), generation: 1 };

        let (returned, result) = block_on(upload_with(&DataUrlHost, ticket.clone(), file));

        assert_eq!(returned, ticket);
        assert_eq!(result, Err(UploadError::UnsupportedType("text/plain".to_string())));
    }

    #[test]
    fn test_cloudinary_endpoint() {
        let config = CloudinaryConfig {
            cloud_name: "demo".to_string(),
            upload_preset: "cards".to_string(),
        };
        assert_eq!(config.endpoint(), "https://api.cloudinary.com/v1_1/demo/image/upload");
    }

    #[test]
    fn test_cloudinary_success() {
        let body = r#"{"public_id":"x","secure_url":"https://res.cloudinary.com/demo/x.png"}"#;
        assert_eq!(
            parse_cloudinary_response(200, body),
            Ok("https://res.cloudinary.com/demo/x.png".to_string())
        );
    }

    #[test]
    fn test_cloudinary_error_body() {
        let body = r#"{"error":{"message":"Upload preset not found"}}"#;
        assert_eq!(
            parse_cloudinary_response(400, body),
            Err(UploadError::Server {
                status: 400,
                message: "Upload preset not found".to_string()
            })
        );
    }

    #[test]
    fn test_cloudinary_garbage() {
        assert!(matches!(
            parse_cloudinary_response(502, "<html>bad gateway</html>"),
            Err(UploadError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_cloudinary_response(200, "{}"),
            Err(UploadError::InvalidResponse(_))
        ));
    }
}
