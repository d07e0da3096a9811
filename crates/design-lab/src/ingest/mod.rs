//! Document ingestion
//!
//! Turns an uploaded multi-page document into one raster preview per side
//! plus each page's native dimensions:
//! 1. Reject oversized uploads before any parsing
//! 2. Rasterize the leading pages (front, then back) at preview scale
//! 3. Commit previews, dimensions and the original bytes in one step

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

use crate::assets::png_data_url;
use crate::options::EngineOptions;
use crate::template::{SourceDocument, Template};
use crate::types::*;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    /// The rendering backend could not be started
    #[error("rasterizer unavailable: {0}")]
    Unavailable(String),
    /// The document itself could not be opened or rendered
    #[error("{0}")]
    Parse(String),
}

/// Encoded preview image for on-screen editing
#[derive(Clone, PartialEq, Eq)]
pub struct RasterPreview {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl std::fmt::Debug for RasterPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterPreview")
            .field("png", &format_args!("{} bytes", self.png.len()))
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

/// One page as returned by a rasterizer
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedPage {
    pub preview: RasterPreview,
    /// Read from the same page at 1× scale
    pub dimensions: NativeDimensions,
}

/// Renders leading document pages to previews.
///
/// Implementations must read the native size from the same page object
/// they rasterize, at 1× scale; oversampling only affects the preview.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(
        &self,
        bytes: &[u8],
        max_pages: usize,
        scale: f32,
    ) -> std::result::Result<Vec<RasterizedPage>, RasterError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedPage {
    pub side: SideKind,
    pub preview: RasterPreview,
    pub dimensions: NativeDimensions,
}

/// Everything ingestion produces, not yet applied to a template
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedDocument {
    pub source: SourceDocument,
    pub pages: Vec<IngestedPage>,
}

impl IngestedDocument {
    pub fn page(&self, side: SideKind) -> Option<&IngestedPage> {
        self.pages.iter().find(|page| page.side == side)
    }
}

/// Reject uploads above the configured ceiling
pub fn check_size(len: usize, options: &EngineOptions) -> Result<()> {
    if len > options.max_source_bytes {
        return Err(DesignError::FileTooLarge {
            size: len,
            limit: options.max_source_bytes,
        });
    }
    Ok(())
}

/// Ingest a document on the current thread
pub fn ingest_blocking<R: PageRasterizer + ?Sized>(
    bytes: Vec<u8>,
    rasterizer: &R,
    options: &EngineOptions,
) -> Result<IngestedDocument> {
    check_size(bytes.len(), options)?;

    let rasterized = rasterizer
        .rasterize(&bytes, options.max_sides, options.preview_scale)
        .map_err(|e| match e {
            RasterError::Unavailable(msg) => DesignError::Config(msg),
            RasterError::Parse(msg) => DesignError::DocumentParseFailure(msg),
        })?;

    if rasterized.is_empty() {
        return Err(DesignError::DocumentParseFailure(
            "document has no pages".to_string(),
        ));
    }

    let pages = rasterized
        .into_iter()
        .take(options.max_sides)
        .enumerate()
        .filter_map(|(index, page)| {
            SideKind::from_page_index(index).map(|side| IngestedPage {
                side,
                preview: page.preview,
                dimensions: page.dimensions,
            })
        })
        .collect::<Vec<_>>();

    log::info!(
        "Ingested {} byte document: {} side(s)",
        bytes.len(),
        pages.len()
    );

    Ok(IngestedDocument {
        source: SourceDocument(bytes),
        pages,
    })
}

/// Ingest a document on the blocking pool.
///
/// The size ceiling is checked before the task is spawned.
pub async fn ingest(
    bytes: Vec<u8>,
    rasterizer: Arc<dyn PageRasterizer>,
    options: &EngineOptions,
) -> Result<IngestedDocument> {
    check_size(bytes.len(), options)?;
    let options = options.clone();

    tokio::task::spawn_blocking(move || ingest_blocking(bytes, rasterizer.as_ref(), &options))
        .await?
}

impl Template {
    /// Commit an ingested document.
    ///
    /// Every side is reset: a new source invalidates the position of every
    /// existing field, and a side the new document lacks becomes empty.
    pub fn apply_ingestion(&mut self, document: IngestedDocument) {
        for side in SideKind::ALL {
            match document.page(side) {
                Some(page) => self.side_mut(side).reset(
                    Some(png_data_url(&page.preview.png)),
                    Some(page.dimensions),
                ),
                None => self.side_mut(side).reset(None, None),
            }
        }
        self.source = Some(document.source);
    }
}

/// Encode raw RGBA pixels as PNG
pub fn encode_png(
    width: u32,
    height: u32,
    rgba: Vec<u8>,
) -> std::result::Result<RasterPreview, RasterError> {
    let image = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        RasterError::Parse(format!("bitmap size mismatch for {}x{}", width, height))
    })?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| RasterError::Parse(format!("PNG encoding failed: {}", e)))?;

    Ok(RasterPreview {
        png: png.into_inner(),
        width_px: width,
        height_px: height,
    })
}
