//! Page-level plumbing for injection
//!
//! Reads page geometry (following inherited attributes) and splices an
//! overlay content stream plus its resources onto an existing page
//! without disturbing the page's own drawing state.

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Guards against cyclic `Parent` chains
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A page's visible box in native units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Lower-left x
    pub x: f32,
    /// Lower-left y
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageFrame {
    pub fn has_offset(&self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }

    /// Overlap of two boxes, if they share any area
    fn intersect(&self, other: &PageFrame) -> Option<PageFrame> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let top = (self.y + self.height).min(other.y + other.height);
        (right > x && top > y).then(|| PageFrame {
            x,
            y,
            width: right - x,
            height: top - y,
        })
    }
}

// =============================================================================
// Page Geometry
// =============================================================================

/// Get a page's visible box: the CropBox clipped to the MediaBox.
///
/// Viewers and rasterizers size the page by this box, so overlay
/// coordinates are measured from it. Falls back to US Letter when the
/// page has no usable MediaBox.
pub fn page_frame(doc: &Document, page_id: ObjectId) -> Result<PageFrame> {
    let media_box = page_box(doc, page_id, b"MediaBox")?.unwrap_or(PageFrame {
        x: 0.0,
        y: 0.0,
        width: DEFAULT_PAGE_DIMENSIONS.0,
        height: DEFAULT_PAGE_DIMENSIONS.1,
    });

    // A CropBox that misses the MediaBox entirely is ignored
    let frame = page_box(doc, page_id, b"CropBox")?
        .and_then(|crop_box| crop_box.intersect(&media_box))
        .unwrap_or(media_box);
    Ok(frame)
}

/// Read a rectangle attribute such as MediaBox or CropBox
fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<PageFrame>> {
    let rect = inherited_attribute(doc, page_id, key)?
        .and_then(|obj| resolve(doc, &obj).as_array().ok().cloned());

    Ok(rect.and_then(|r| {
        if r.len() < 4 {
            return None;
        }
        let llx = extract_number(resolve(doc, &r[0]))?;
        let lly = extract_number(resolve(doc, &r[1]))?;
        let urx = extract_number(resolve(doc, &r[2]))?;
        let ury = extract_number(resolve(doc, &r[3]))?;
        Some(PageFrame {
            x: llx.min(urx),
            y: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        })
    }))
}

/// Get page dimensions (width, height) in points
pub fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let frame = page_frame(doc, page_id)?;
    Ok((frame.width, frame.height))
}

/// Look up a page attribute, walking up the page tree for inheritable keys
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut dict = doc.get_dictionary(page_id)?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value.clone()));
        }
        match dict.get(b"Parent").and_then(|p| p.as_reference()) {
            Ok(parent_id) => dict = doc.get_dictionary(parent_id)?,
            Err(_) => break,
        }
    }

    Ok(None)
}

/// Follow a single reference, if any
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

// =============================================================================
// Overlay Attachment
// =============================================================================

/// Resources an overlay needs on its page
#[derive(Debug, Default)]
pub struct OverlayResources {
    pub fonts: Vec<(String, ObjectId)>,
    pub xobjects: Vec<(String, ObjectId)>,
}

/// Splice an overlay content stream onto a page.
///
/// The page's existing contents are wrapped in `q … Q` so whatever
/// graphics state they leave behind cannot leak into the overlay.
pub fn attach_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
    resources: &OverlayResources,
) -> Result<()> {
    let mut page_resources = match inherited_attribute(doc, page_id, b"Resources")? {
        Some(obj) => resolve(doc, &obj)
            .as_dict()
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        None => Dictionary::new(),
    };

    merge_named(doc, &mut page_resources, b"Font", &resources.fonts);
    merge_named(doc, &mut page_resources, b"XObject", &resources.xobjects);

    let existing = existing_contents(doc, page_id)?;

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut restore_and_overlay = b"Q\n".to_vec();
    restore_and_overlay.extend_from_slice(&overlay);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), restore_and_overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(page_resources));
    page_dict.set("Contents", Object::Array(contents));

    Ok(())
}

/// Add `entries` into the sub-dictionary `category` of `resources`,
/// inlining it first if it was a reference
fn merge_named(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    entries: &[(String, ObjectId)],
) {
    if entries.is_empty() {
        return;
    }

    let mut named = resources
        .get(category)
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);

    for (name, id) in entries {
        named.set(name.as_bytes(), Object::Reference(*id));
    }

    resources.set(category, Object::Dictionary(named));
}

/// The page's current content stream references, flattened
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()), // No content = blank page
    };

    Ok(match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(arr) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Object::Array(arr) => arr.clone(),
        _ => Vec::new(),
    })
}
