//! QR rendering capability
//!
//! Rasterising is delegated to a host-provided [`QrRenderer`]; this module owns
//! the style configuration and the loading of the optional mask and logo
//! images that are handed to it.

mod style;

pub use style::{ImageSource, ModuleShape, QrStyle, QrStyleConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Rendering failure reported by a [`QrRenderer`]
#[derive(Debug, Error)]
#[error("QR rendering failed: {0}")]
pub struct RenderError(pub String);

/// Turns an export URL into an image, e.g. a styled PNG QR code
#[async_trait]
pub trait QrRenderer: Send + Sync {
    async fn render(&self, url: &str, style: &QrStyle) -> Result<Vec<u8>, RenderError>;
}
