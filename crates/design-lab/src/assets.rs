//! Image asset lookup for photo and signature fields

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::PathBuf;

/// Turns an image reference taken from a record into encoded image bytes
pub trait AssetSource: Send + Sync {
    fn load(&self, reference: &str) -> std::result::Result<Vec<u8>, String>;
}

/// Decodes `data:` URLs and bare base64 payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineAssets;

impl AssetSource for InlineAssets {
    fn load(&self, reference: &str) -> std::result::Result<Vec<u8>, String> {
        decode_inline(reference)
    }
}

/// Reads image files relative to a root directory, falling back to
/// inline decoding for `data:` references
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self, reference: &str) -> std::result::Result<Vec<u8>, String> {
        if reference.starts_with("data:") {
            return decode_inline(reference);
        }
        let path = self.root.join(reference);
        std::fs::read(&path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
    }
}

fn decode_inline(reference: &str) -> std::result::Result<Vec<u8>, String> {
    let payload = match reference.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "malformed data URL".to_string())?;
            if !header.ends_with(";base64") {
                return Err(format!("unsupported data URL encoding '{}'", header));
            }
            data
        }
        None => reference,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 image: {}", e))
}

/// Wrap encoded PNG bytes in a data URL
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}
