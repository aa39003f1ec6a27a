//! Cardsmith Web
//!
//! Browser shell for the editor: wires the core to `localStorage`, the
//! Cloudinary image host and an html2canvas-based PNG export.

mod route;

pub use route::{Route, canvas_path};

#[cfg(target_arch = "wasm32")]
mod cloudinary;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{CardEditor, run_wasm};
