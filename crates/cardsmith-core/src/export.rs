//! PNG export of the card.
//!
//! Rendering is done by an external DOM-to-image capability. The editor's
//! only job is to hide transient controls (drag handles, delete buttons,
//! file pickers) while the snapshot is taken.

use crate::upload::BoxFuture;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// File name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "canvas.png";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Export errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Renderer did not produce a PNG")]
    NotPng,
}

/// Controls that must not appear in the exported image.
pub trait Affordances {
    fn set_visible(&mut self, visible: bool);
}

/// Produces a PNG of the card surface.
pub trait SnapshotRenderer {
    fn render_png(&self) -> BoxFuture<'_, Result<Vec<u8>, ExportError>>;
}

/// A rendered card ready for download.
#[derive(Debug, Clone, PartialEq)]
pub struct PngExport {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

impl PngExport {
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Shows the affordances again when dropped, even if rendering failed.
struct HiddenAffordances<'a, A: Affordances + ?Sized>(&'a mut A);

impl<'a, A: Affordances + ?Sized> HiddenAffordances<'a, A> {
    fn hide(affordances: &'a mut A) -> Self {
        affordances.set_visible(false);
        Self(affordances)
    }
}

impl<A: Affordances + ?Sized> Drop for HiddenAffordances<'_, A> {
    fn drop(&mut self) {
        self.0.set_visible(true);
    }
}

/// Render the card with affordances hidden for the duration of the render.
pub async fn export_png<A, R>(affordances: &mut A, renderer: &R) -> Result<PngExport, ExportError>
where
    A: Affordances + ?Sized,
    R: SnapshotRenderer + ?Sized,
{
    let bytes = {
        let _hidden = HiddenAffordances::hide(affordances);
        renderer.render_png().await?
    };

    if !bytes.starts_with(&PNG_SIGNATURE) {
        log::error!("Export produced {} bytes that are not a PNG", bytes.len());
        return Err(ExportError::NotPng);
    }

    log::info!("Exported {} ({} bytes)", EXPORT_FILE_NAME, bytes.len());
    Ok(PngExport {
        file_name: EXPORT_FILE_NAME,
        bytes,
    })
}
