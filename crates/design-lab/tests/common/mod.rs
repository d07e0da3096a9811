#![allow(dead_code)]

use design_lab::ingest::{PageRasterizer, RasterError, RasterizedPage, encode_png};
use design_lab::inject::page_dimensions;
use design_lab::*;
use lopdf::{Dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};

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

/// Standard ID-card page size in points
pub const CARD: (i64, i64) = (1013, 638);

/// Reads sizes with lopdf and emits tiny blank previews
#[derive(Default)]
pub struct StubRasterizer {
    pub calls: AtomicUsize,
}

impl StubRasterizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRasterizer for StubRasterizer {
    fn rasterize(
        &self,
        bytes: &[u8],
        max_pages: usize,
        scale: f32,
    ) -> std::result::Result<Vec<RasterizedPage>, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let doc = Document::load_mem(bytes).map_err(|e| RasterError::Parse(e.to_string()))?;
        doc.get_pages()
            .into_values()
            .take(max_pages)
            .map(|page_id| {
                let (width, height) = page_dimensions(&doc, page_id)
                    .map_err(|e| RasterError::Parse(e.to_string()))?;
                // Previews are scaled down tenfold to keep tests fast
                let px_w = ((width * scale) / 10.0).ceil() as u32;
                let px_h = ((height * scale) / 10.0).ceil() as u32;
                let preview = encode_png(px_w, px_h, vec![255; (px_w * px_h * 4) as usize])?;
                Ok(RasterizedPage {
                    preview,
                    dimensions: NativeDimensions::new(width, height),
                })
            })
            .collect()
    }
}

/// A template with an ingested document of the given page sizes
pub fn ingested_template(sizes: &[(i64, i64)]) -> Template {
    let mut template = Template::new(
        "tpl-1",
        "tenant-1",
        "Student ID",
        ArtifactKind::IdentityCard,
        Orientation::Landscape,
    );
    let document = ingest_blocking(
        create_test_pdf(sizes),
        &StubRasterizer::default(),
        &EngineOptions::default(),
    )
    .unwrap();
    template.apply_ingestion(document);
    template
}

pub fn text_field(id: u32, side: SideKind, key: &str, rect: WorkspaceRect) -> OverlayField {
    OverlayField {
        id: FieldId(id),
        side,
        binding: Binding::Text(TextBinding {
            binding_key: key.to_string(),
        }),
        rect,
        style: FieldStyle::default(),
    }
}

pub fn code_field(id: u32, symbology: Symbology, fields: &[&str], rect: WorkspaceRect) -> OverlayField {
    OverlayField {
        id: FieldId(id),
        side: SideKind::Front,
        binding: Binding::Composite(CompositeBinding {
            symbology,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            mode: EncodingMode::Psv,
        }),
        rect,
        style: FieldStyle::default(),
    }
}

pub fn photo_field(id: u32, key: &str, rect: WorkspaceRect) -> OverlayField {
    OverlayField {
        id: FieldId(id),
        side: SideKind::Front,
        binding: Binding::Image(ImageBinding {
            asset: ImageAsset::Photo,
            binding_key: key.to_string(),
        }),
        rect,
        style: FieldStyle::default(),
    }
}

/// 2×2 PNG with one transparent pixel, as a data URL
pub fn sample_photo() -> String {
    let mut rgba = vec![200u8; 16];
    rgba[3] = 0;
    let preview = encode_png(2, 2, rgba).unwrap();
    assets::png_data_url(&preview.png)
}

/// Concatenated content streams of a page in a rendered document
pub fn page_content(bytes: &[u8], page_index: usize) -> Vec<u8> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages().into_values().nth(page_index).unwrap();
    doc.get_page_content(page_id).unwrap()
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Decoded operations of a page in a rendered document
pub fn page_operations(bytes: &[u8], page_index: usize) -> Vec<lopdf::content::Operation> {
    lopdf::content::Content::decode(&page_content(bytes, page_index))
        .unwrap()
        .operations
}

/// Numeric operands of every `operator` on a page
pub fn operands_of(bytes: &[u8], page_index: usize, operator: &str) -> Vec<Vec<f32>> {
    page_operations(bytes, page_index)
        .into_iter()
        .filter(|op| op.operator == operator)
        .map(|op| {
            op.operands
                .iter()
                .filter_map(|o| o.as_float().ok())
                .collect()
        })
        .collect()
}
