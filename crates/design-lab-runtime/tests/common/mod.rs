#![allow(dead_code)]

use design_lab::ingest::{PageRasterizer, RasterError, RasterizedPage, encode_png};
use design_lab::inject::page_dimensions;
use design_lab::*;
use design_lab_runtime::{Collaborators, JsonFileRepository, MemoryAuditSink};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::Arc;

/// Build a PDF with one page per MediaBox size
pub fn create_test_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(width, height) in sizes {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(sizes.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub const CARD: (i64, i64) = (1013, 638);

/// Reads page sizes with lopdf and emits 1×1 previews
pub struct StubRasterizer;

impl PageRasterizer for StubRasterizer {
    fn rasterize(
        &self,
        bytes: &[u8],
        max_pages: usize,
        _scale: f32,
    ) -> std::result::Result<Vec<RasterizedPage>, RasterError> {
        let doc = Document::load_mem(bytes).map_err(|e| RasterError::Parse(e.to_string()))?;
        doc.get_pages()
            .into_values()
            .take(max_pages)
            .map(|page_id| {
                let (width, height) = page_dimensions(&doc, page_id)
                    .map_err(|e| RasterError::Parse(e.to_string()))?;
                Ok(RasterizedPage {
                    preview: encode_png(1, 1, vec![255; 4])?,
                    dimensions: NativeDimensions::new(width, height),
                })
            })
            .collect()
    }
}

pub fn blank_template(id: &str) -> Template {
    Template::new(
        id,
        "tenant-1",
        "Student ID",
        ArtifactKind::IdentityCard,
        Orientation::Landscape,
    )
}

pub fn ingested_template(id: &str, sizes: &[(i64, i64)]) -> Template {
    let mut template = blank_template(id);
    let document =
        ingest_blocking(create_test_pdf(sizes), &StubRasterizer, &EngineOptions::default())
            .unwrap();
    template.apply_ingestion(document);
    template
}

pub fn name_field(id: u32) -> OverlayField {
    OverlayField {
        id: FieldId(id),
        side: SideKind::Front,
        binding: Binding::Text(TextBinding {
            binding_key: "{{name}}".to_string(),
        }),
        rect: WorkspaceRect::new(50.0, 300.0, 200.0, 20.0),
        style: FieldStyle::default(),
    }
}

pub fn photo_field(id: u32) -> OverlayField {
    OverlayField {
        id: FieldId(id),
        side: SideKind::Front,
        binding: Binding::Image(ImageBinding {
            asset: ImageAsset::Photo,
            binding_key: "photo".to_string(),
        }),
        rect: WorkspaceRect::new(600.0, 80.0, 100.0, 120.0),
        style: FieldStyle::default(),
    }
}

/// Worker collaborators backed by files under `dir`
pub fn collaborators(
    dir: &Path,
    records: &str,
) -> Collaborators<JsonFileRepository, design_lab_runtime::FileRecordProvider, MemoryAuditSink> {
    let records_path = dir.join("records.csv");
    std::fs::write(&records_path, records).unwrap();

    Collaborators {
        rasterizer: Arc::new(StubRasterizer),
        assets: Arc::new(InlineAssets),
        repository: JsonFileRepository::new(dir.join("templates")),
        records: design_lab_runtime::FileRecordProvider::new(records_path),
        audit: MemoryAuditSink::new(16),
        options: EngineOptions::default(),
    }
}

/// Concatenated content streams of the first page
pub fn first_page_content(bytes: &[u8]) -> Vec<u8> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    doc.get_page_content(page_id).unwrap()
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
