use std::fs;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, warn};
use ureq::Agent;

use crate::config::AssetSettings;

/// Decoded static assets. Any of them may be missing; drawing code falls
/// back to a placeholder or simply leaves the slot empty.
#[derive(Clone, Default)]
pub struct Assets {
    pub logo: Option<DynamicImage>,
    pub signature: Option<DynamicImage>,
    pub font: Option<Arc<Vec<u8>>>,
}

impl Assets {
    /// No assets at all: Helvetica text, placeholder logo, no signature.
    pub fn none() -> Self {
        Self::default()
    }

    /// Fetch every configured asset, one after the other. Failures are
    /// logged and leave the slot empty.
    pub fn load(settings: &AssetSettings) -> Self {
        Self {
            logo: settings.logo.as_deref().and_then(|l| load_image(l, "logo")),
            signature: settings
                .signature
                .as_deref()
                .and_then(|l| load_image(l, "signature")),
            font: settings.font.as_deref().and_then(load_font),
        }
    }
}

impl std::fmt::Debug for Assets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assets")
            .field("logo", &self.logo.is_some())
            .field("signature", &self.signature.is_some())
            .field("font", &self.font.is_some())
            .finish()
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read an asset from disk or over HTTP. A single attempt, no retry.
pub fn fetch_bytes(location: &str) -> Option<Vec<u8>> {
    if !is_url(location) {
        return match fs::read(location) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(location, "failed to read asset: {e}");
                None
            }
        };
    }

    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(10)))
        .build()
        .into();

    let mut response = match agent.get(location).call() {
        Ok(response) => response,
        Err(e) => {
            warn!(location, "failed to fetch asset: {e}");
            return None;
        }
    };
    match response.body_mut().read_to_vec() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(location, "failed to read asset body: {e}");
            None
        }
    }
}

pub fn load_image(location: &str, label: &str) -> Option<DynamicImage> {
    let bytes = fetch_bytes(location)?;
    match image::load_from_memory(&bytes) {
        Ok(img) => {
            debug!(label, width = img.width(), height = img.height(), "image asset loaded");
            Some(img)
        }
        Err(e) => {
            warn!(label, location, "failed to decode image asset: {e}");
            None
        }
    }
}

pub fn load_font(location: &str) -> Option<Arc<Vec<u8>>> {
    let bytes = fetch_bytes(location)?;
    if let Err(e) = ttf_parser::Face::parse(&bytes, 0) {
        warn!(location, "font asset is not a usable TrueType font: {e}");
        return None;
    }
    debug!(location, "font asset loaded");
    Some(Arc::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_missing_assets_are_skipped() {
        let settings = AssetSettings {
            logo: Some("/nonexistent/logo.png".to_string()),
            signature: Some("/nonexistent/signature.png".to_string()),
            font: Some("/nonexistent/font.ttf".to_string()),
        };
        let assets = Assets::load(&settings);
        assert!(assets.logo.is_none());
        assert!(assets.signature.is_none());
        assert!(assets.font.is_none());
    }

    #[test]
    fn test_garbage_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, b"not an image").unwrap();
        let location = path.display().to_string();
        assert!(load_image(&location, "logo").is_none());
        assert!(load_font(&location).is_none());
    }

    #[test]
    fn test_png_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(4, 3)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        fs::write(&path, bytes).unwrap();
        let img = load_image(&path.display().to_string(), "logo").unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }
}
