pub mod assets;
pub mod binding;
pub mod constants;
pub mod editor;
pub mod geometry;
pub mod ingest;
pub mod inject;
mod options;
pub mod service;
mod template;
mod types;

pub use assets::{AssetSource, DirectoryAssets, InlineAssets};
pub use binding::{Record, ResolvedValue, UnresolvedBinding, resolve};
pub use editor::{Editor, EditorAction, PaletteEntry, reduce};
pub use geometry::{NativeRect, Point, SideTransform, WorkspaceRect};
pub use ingest::{IngestedDocument, PageRasterizer, ingest, ingest_blocking};
#[cfg(feature = "pdfium")]
pub use ingest::PdfiumRasterizer;
pub use inject::{FieldPlacement, RenderedArtifact, placements, render, render_batch, render_blocking};
pub use options::*;
pub use service::{AuditSink, RecordProvider, TemplateRepository, save_template};
pub use template::*;
pub use types::*;
