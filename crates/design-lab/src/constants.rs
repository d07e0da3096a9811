//! Shared constants for template design and injection
//!
//! This module centralizes magic numbers used by the editor, the
//! ingestor and the renderer.

// =============================================================================
// Workspace
// =============================================================================

/// Width of the design canvas in workspace pixels
pub const WORKSPACE_WIDTH: f32 = 800.0;

/// Smallest width or height a field can be resized to (workspace pixels)
pub const MIN_FIELD_SIZE: f32 = 20.0;

/// Where freshly added fields land (workspace pixels)
pub const DEFAULT_FIELD_POSITION: (f32, f32) = (50.0, 50.0);

/// Offset applied to duplicated fields so the copy is visible
pub const DUPLICATE_OFFSET: f32 = 10.0;

// =============================================================================
// Default Field Sizes (workspace pixels, width × height)
// =============================================================================

pub const TEXT_FIELD_SIZE: (f32, f32) = (150.0, 20.0);
pub const PHOTO_FIELD_SIZE: (f32, f32) = (100.0, 120.0);
pub const SIGNATURE_FIELD_SIZE: (f32, f32) = (120.0, 40.0);
pub const BARCODE_FIELD_SIZE: (f32, f32) = (160.0, 40.0);
pub const QR_FIELD_SIZE: (f32, f32) = (80.0, 80.0);

// =============================================================================
// Default Style
// =============================================================================

/// Default font size (workspace pixels)
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Default text colour
pub const DEFAULT_COLOR: &str = "#000000";

// =============================================================================
// Ingestion
// =============================================================================

/// Upload ceiling for source documents (5 MiB)
pub const MAX_SOURCE_BYTES: usize = 5 * 1024 * 1024;

/// Oversampling applied to raster previews; presentation only
pub const PREVIEW_SCALE: f32 = 2.5;

/// Front and back
pub const MAX_SIDES: usize = 2;

/// Default page dimensions in points (US Letter) when a page has no MediaBox
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (612.0, 792.0);

// =============================================================================
// Bindings
// =============================================================================

pub const PLACEHOLDER_OPEN: &str = "{{";
pub const PLACEHOLDER_CLOSE: &str = "}}";

// =============================================================================
// Text Metrics
// =============================================================================

/// Approximate character width ratio for Helvetica
pub const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Approximate character width ratio for Helvetica-Bold
pub const HELVETICA_BOLD_CHAR_WIDTH_RATIO: f32 = 0.55;

/// Helvetica cap height as a fraction of the font size
pub const HELVETICA_CAP_HEIGHT_RATIO: f32 = 0.718;
