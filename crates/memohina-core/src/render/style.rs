//! QR style configuration and image loading

use crate::error::{HinaError, HinaResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Shape used to draw QR modules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleShape {
    #[default]
    Square,
    Gapped,
    Circle,
    Rounded,
}

impl ModuleShape {
    /// Parse a shape name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "square" => Some(Self::Square),
            "gapped" => Some(Self::Gapped),
            "circle" => Some(Self::Circle),
            "rounded" => Some(Self::Rounded),
            _ => None,
        }
    }

    /// Parse a shape name, falling back to square for unknown names
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }
}

/// Where an optional style image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
}

impl ImageSource {
    /// Classify a configured location; empty strings mean "no image"
    pub fn parse(location: &str) -> Option<Self> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }
        let lower = location.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(Self::Url(location.to_string()))
        } else {
            Some(Self::Path(PathBuf::from(location)))
        }
    }

    async fn fetch(&self, timeout: Duration) -> HinaResult<Vec<u8>> {
        match self {
            Self::Url(url) => {
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| HinaError::remote(e.to_string(), false))?;
                let response = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| HinaError::remote(e.to_string(), true))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| HinaError::remote(e.to_string(), true))?;
                Ok(bytes.to_vec())
            }
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(HinaError::io_with_path(
                        "not a file",
                        path.display().to_string(),
                    ));
                }
                Ok(tokio::fs::read(path).await?)
            }
        }
    }
}

/// `[qrcode]` configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QrStyleConfig {
    pub box_size: u32,
    pub border: u32,
    /// One of square, gapped, circle, rounded
    pub module_shape: String,
    /// Local path or http(s) URL of an image used to colour the modules
    pub image_mask: String,
    /// Local path or http(s) URL of a logo placed in the centre
    pub center_logo: String,
}

impl Default for QrStyleConfig {
    fn default() -> Self {
        Self {
            box_size: 5,
            border: 2,
            module_shape: "square".to_string(),
            image_mask: String::new(),
            center_logo: String::new(),
        }
    }
}

impl QrStyleConfig {
    /// Load the configured images and build a render-ready style.
    ///
    /// An image that cannot be loaded is logged and left out; the QR code is
    /// still rendered without it.
    pub async fn resolve(&self, timeout: Duration) -> QrStyle {
        let image_mask = load_optional("image mask", &self.image_mask, timeout).await;
        let center_logo = load_optional("center logo", &self.center_logo, timeout).await;
        QrStyle {
            box_size: self.box_size,
            border: self.border,
            module_shape: ModuleShape::from_name(&self.module_shape),
            image_mask,
            center_logo,
        }
    }
}

async fn load_optional(label: &str, location: &str, timeout: Duration) -> Option<Vec<u8>> {
    let source = ImageSource::parse(location)?;
    match source.fetch(timeout).await {
        Ok(bytes) => {
            info!(image = label, bytes = bytes.len(), "loaded QR style image");
            Some(bytes)
        }
        Err(e) => {
            warn!(image = label, location, "failed to load QR style image: {}", e);
            None
        }
    }
}

/// Render-ready QR style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrStyle {
    pub box_size: u32,
    pub border: u32,
    pub module_shape: ModuleShape,
    pub image_mask: Option<Vec<u8>>,
    pub center_logo: Option<Vec<u8>>,
}

impl QrStyle {
    /// A centre logo covers modules, so renderers should raise error correction
    pub fn needs_high_error_correction(&self) -> bool {
        self.center_logo.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_module_shape_fallback() {
        assert_eq!(ModuleShape::from_name("Circle"), ModuleShape::Circle);
        assert_eq!(ModuleShape::from_name("hexagon"), ModuleShape::Square);
    }

    #[test]
    fn test_image_source_parse() {
        assert_eq!(ImageSource::parse("  "), None);
        assert_eq!(
            ImageSource::parse("HTTPS://cdn.example/logo.png"),
            Some(ImageSource::Url("HTTPS://cdn.example/logo.png".to_string()))
        );
        assert_eq!(
            ImageSource::parse("assets/logo.png"),
            Some(ImageSource::Path(PathBuf::from("assets/logo.png")))
        );
    }

    #[tokio::test]
    async fn test_resolve_loads_local_logo_and_skips_missing_mask() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, [0x89, b'P', b'N', b'G']).unwrap();

        let config = QrStyleConfig {
            module_shape: "rounded".to_string(),
            image_mask: dir.path().join("missing.png").display().to_string(),
            center_logo: logo.display().to_string(),
            ..Default::default()
        };

        let style = config.resolve(Duration::from_secs(1)).await;
        assert_eq!(style.module_shape, ModuleShape::Rounded);
        assert_eq!(style.center_logo.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
        assert!(style.image_mask.is_none());
        assert!(style.needs_high_error_correction());
    }
}
