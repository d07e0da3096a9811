//! Injection rendering
//!
//! Re-opens the retained source document, resolves every overlay field
//! against a record and draws it onto the page for its side:
//! 1. Check preconditions (source present, dimensions for every populated side)
//! 2. Place each field in native space
//! 3. Resolve and draw, collecting one overlay per page
//! 4. Splice overlays onto their pages and re-encode

mod draw;
mod page;

pub use page::{OverlayResources, PageFrame, attach_overlay, page_dimensions, page_frame};

use crate::assets::AssetSource;
use crate::binding::{self, Record, UnresolvedBinding};
use crate::geometry::{NativeRect, SideTransform, WorkspaceRect};
use crate::options::{EngineOptions, Placeholders};
use crate::template::{FieldType, OverlayField, Template};
use crate::types::*;
use draw::{FieldDrawing, FontCache};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A finished document, independent of the template's retained source
#[derive(Clone)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Bindings that fell back instead of resolving
    pub unresolved: Vec<UnresolvedBinding>,
}

impl std::fmt::Debug for RenderedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedArtifact")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("page_count", &self.page_count)
            .field("unresolved", &self.unresolved)
            .finish()
    }
}

/// Where one field lands in the output document
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlacement {
    pub id: FieldId,
    pub side: SideKind,
    pub field_type: FieldType,
    /// Zero-based output page
    pub page_index: usize,
    pub workspace: WorkspaceRect,
    /// Relative to the origin of the page's visible box
    pub native: NativeRect,
    pub transform: SideTransform,
}

/// Output page for a side; a single-page document takes back fields on page 0
fn page_index_for(side: SideKind, page_count: usize) -> usize {
    let index = side.page_index();
    if index < page_count { index } else { 0 }
}

/// Fail before drawing anything if a populated side was never ingested
fn check_dimensions(template: &Template) -> Result<()> {
    for side in SideKind::ALL {
        if !template.side(side).overlay_fields.is_empty() {
            template.transform(side)?;
        }
    }
    Ok(())
}

fn open_source(template: &Template) -> Result<Document> {
    let source = template
        .source
        .as_ref()
        .ok_or(DesignError::MissingSourceDocument)?;
    Document::load_mem(source.bytes()).map_err(|e| DesignError::DocumentParseFailure(e.to_string()))
}

/// Page ids in document order
fn page_ids(doc: &Document) -> Result<Vec<ObjectId>> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(DesignError::DocumentParseFailure(
            "document has no pages".to_string(),
        ));
    }
    Ok(pages)
}

fn place(
    template: &Template,
    doc: &Document,
    pages: &[ObjectId],
    field: &OverlayField,
) -> Result<FieldPlacement> {
    let page_index = page_index_for(field.side, pages.len());
    let frame = page_frame(doc, pages[page_index])?;
    let transform = template.transform(field.side)?.with_page_height(frame.height);

    Ok(FieldPlacement {
        id: field.id,
        side: field.side,
        field_type: field.field_type(),
        page_index,
        workspace: field.rect,
        native: transform.to_native(&field.rect),
        transform,
    })
}

/// Native placement of every field, in drawing order.
///
/// Uses the retained source's real page sizes when present, otherwise
/// each side's recorded dimensions.
pub fn placements(template: &Template) -> Result<Vec<FieldPlacement>> {
    check_dimensions(template)?;

    if template.source.is_some() {
        let doc = open_source(template)?;
        let pages = page_ids(&doc)?;
        return template
            .fields()
            .map(|field| place(template, &doc, &pages, field))
            .collect();
    }

    template
        .fields()
        .map(|field| {
            let transform = template.transform(field.side)?;
            Ok(FieldPlacement {
                id: field.id,
                side: field.side,
                field_type: field.field_type(),
                page_index: field.side.page_index(),
                workspace: field.rect,
                native: transform.to_native(&field.rect),
                transform,
            })
        })
        .collect()
}

/// Accumulated overlay for one page
#[derive(Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    resources: OverlayResources,
}

impl PageCanvas {
    fn push(&mut self, drawing: FieldDrawing) {
        self.operations.extend(drawing.ops);
        if let Some((name, id)) = drawing.font {
            if !self.resources.fonts.iter().any(|(n, _)| n == name) {
                self.resources.fonts.push((name.to_string(), id));
            }
        }
        if let Some(xobject) = drawing.xobject {
            self.resources.xobjects.push(xobject);
        }
    }

    /// Encode the overlay, shifted onto the MediaBox origin when it is not (0, 0)
    fn encode(self, frame: PageFrame) -> Result<(Vec<u8>, OverlayResources)> {
        let mut operations = Vec::with_capacity(self.operations.len() + 3);
        operations.push(Operation::new("q", vec![]));
        if frame.has_offset() {
            operations.push(Operation::new(
                "cm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Real(frame.x),
                    Object::Real(frame.y),
                ],
            ));
        }
        operations.extend(self.operations);
        operations.push(Operation::new("Q", vec![]));

        let bytes = Content { operations }.encode()?;
        Ok((bytes, self.resources))
    }
}

/// Render one record onto the template's source document on the current thread
pub fn render_blocking(
    template: &Template,
    record: &Record,
    assets: &dyn AssetSource,
    placeholders: Placeholders<'_>,
) -> Result<RenderedArtifact> {
    check_dimensions(template)?;
    let mut doc = open_source(template)?;
    let pages = page_ids(&doc)?;

    let mut fonts = FontCache::default();
    let mut canvases: BTreeMap<usize, PageCanvas> = BTreeMap::new();
    let mut unresolved = Vec::new();

    // Stored order: later fields draw over earlier ones
    for field in template.fields() {
        let placement = place(template, &doc, &pages, field)?;
        let resolution = binding::resolve(field, record, placeholders);
        unresolved.extend(resolution.unresolved);

        let drawing = draw::draw_value(
            &mut doc,
            &mut fonts,
            field,
            &placement.native,
            &placement.transform,
            &resolution.value,
            assets,
        )
        .map_err(|reason| DesignError::render(field.id, reason))?;

        canvases
            .entry(placement.page_index)
            .or_default()
            .push(drawing);
    }

    for (index, canvas) in canvases {
        let page_id = pages[index];
        let frame = page_frame(&doc, page_id)?;
        let (overlay, resources) = canvas.encode(frame)?;
        attach_overlay(&mut doc, page_id, overlay, &resources)?;
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    log::info!(
        "Rendered template '{}': {} field(s) over {} page(s), {} unresolved",
        template.name,
        template.fields().count(),
        pages.len(),
        unresolved.len()
    );

    Ok(RenderedArtifact {
        bytes,
        page_count: pages.len(),
        unresolved,
    })
}

/// Render one record on the blocking pool
pub async fn render(
    template: Template,
    record: Record,
    assets: Arc<dyn AssetSource>,
    options: &EngineOptions,
) -> Result<RenderedArtifact> {
    let options = options.clone();
    tokio::task::spawn_blocking(move || {
        render_blocking(&template, &record, assets.as_ref(), options.placeholders())
    })
    .await?
}

/// Render one artifact per record, stopping at the first failure
pub fn render_batch(
    template: &Template,
    records: &[Record],
    assets: &dyn AssetSource,
    placeholders: Placeholders<'_>,
) -> Result<Vec<RenderedArtifact>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            render_blocking(template, record, assets, placeholders).inspect_err(|e| {
                log::warn!("Batch stopped at record {}: {}", index + 1, e);
            })
        })
        .collect()
}
