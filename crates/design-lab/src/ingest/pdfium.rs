//! Pdfium-backed page rasterizer

use super::{PageRasterizer, RasterError, RasterizedPage, encode_png};
use crate::types::NativeDimensions;
use pdfium_render::prelude::*;
use std::path::PathBuf;

/// Environment variable naming a directory that holds the pdfium library
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Rasterizes pages with pdfium.
///
/// The library is bound per call, inside the blocking task, so no
/// pdfium handle ever crosses threads.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the library in `dir` instead of searching for it
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    /// Try the configured directory, then `PDFIUM_LIB_PATH`, then the
    /// vendored copy, then the system library
    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let candidates = self
            .library_dir
            .clone()
            .into_iter()
            .chain(std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from))
            .chain(std::env::current_dir().ok().map(|mut p| {
                p.push("vendor/pdfium/lib");
                p
            }));

        for dir in candidates {
            if !dir.exists() {
                continue;
            }
            if let Ok(binding) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                return Ok(Pdfium::new(binding));
            }
            log::debug!("No usable pdfium library in {}", dir.display());
        }

        Pdfium::bind_to_system_library().map(Pdfium::new)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        bytes: &[u8],
        max_pages: usize,
        scale: f32,
    ) -> std::result::Result<Vec<RasterizedPage>, RasterError> {
        let pdfium = self
            .bind()
            .map_err(|e| RasterError::Unavailable(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| RasterError::Parse(e.to_string()))?;

        let pages = document.pages();
        let count = (pages.len() as usize).min(max_pages);
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut rasterized = Vec::with_capacity(count);
        for index in 0..count {
            let page = pages
                .get(index as u16)
                .map_err(|e| RasterError::Parse(e.to_string()))?;

            // 1× read of the same page object
            let dimensions = NativeDimensions::new(page.width().value, page.height().value);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| RasterError::Parse(e.to_string()))?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            let preview = encode_png(width, height, bitmap.as_rgba_bytes().to_vec())?;

            rasterized.push(RasterizedPage {
                preview,
                dimensions,
            });
        }

        Ok(rasterized)
    }
}
