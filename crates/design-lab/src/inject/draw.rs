//! Content stream generation for resolved field values
//!
//! Every function here works in native units on an already transformed
//! rectangle; no workspace arithmetic happens in this module.

use crate::assets::AssetSource;
use crate::binding::ResolvedValue;
use crate::constants::{
    HELVETICA_BOLD_CHAR_WIDTH_RATIO, HELVETICA_CAP_HEIGHT_RATIO, HELVETICA_CHAR_WIDTH_RATIO,
};
use crate::geometry::{NativeRect, SideTransform};
use crate::template::{FieldStyle, FontWeight, OverlayField, Symbology, TextAlign};
use barcoders::sym::code128::Code128;
use lopdf::content::Operation;
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use qrcode::{Color, QrCode};

/// Code 128 character set B prefix understood by `barcoders`
const CODE128_SET_B: char = 'Ɓ';

pub(crate) const FONT_REGULAR: &str = "DLHelv";
pub(crate) const FONT_BOLD: &str = "DLHelvB";

/// Font objects shared by every page of one render
#[derive(Debug, Default)]
pub(crate) struct FontCache {
    regular: Option<ObjectId>,
    bold: Option<ObjectId>,
}

impl FontCache {
    /// Resource name and object id for a weight, creating the font on first use
    pub(crate) fn get(&mut self, doc: &mut Document, weight: FontWeight) -> (&'static str, ObjectId) {
        let (slot, name, base_font) = match weight {
            FontWeight::Normal => (&mut self.regular, FONT_REGULAR, "Helvetica"),
            FontWeight::Bold => (&mut self.bold, FONT_BOLD, "Helvetica-Bold"),
        };
        let id = *slot.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base_font,
                "Encoding" => "WinAnsiEncoding",
            })
        });
        (name, id)
    }
}

/// Drawing output for one field
#[derive(Debug, Default)]
pub(crate) struct FieldDrawing {
    pub ops: Vec<Operation>,
    pub font: Option<(&'static str, ObjectId)>,
    pub xobject: Option<(String, ObjectId)>,
}

/// Produce the operations that draw `value` into `rect`
pub(crate) fn draw_value(
    doc: &mut Document,
    fonts: &mut FontCache,
    field: &OverlayField,
    rect: &NativeRect,
    transform: &SideTransform,
    value: &ResolvedValue,
    assets: &dyn AssetSource,
) -> std::result::Result<FieldDrawing, String> {
    match value {
        ResolvedValue::Text(text) => {
            let font = fonts.get(doc, field.style.font_weight);
            Ok(FieldDrawing {
                ops: text_ops(text, rect, &field.style, transform, font.0),
                font: Some(font),
                xobject: None,
            })
        }
        ResolvedValue::Code { payload, .. } if payload.is_empty() => Ok(FieldDrawing::default()),
        ResolvedValue::Code {
            symbology: Symbology::Barcode,
            payload,
        } => Ok(FieldDrawing {
            ops: barcode_ops(payload, rect, &field.style)?,
            ..Default::default()
        }),
        ResolvedValue::Code {
            symbology: Symbology::Qr,
            payload,
        } => Ok(FieldDrawing {
            ops: qr_ops(payload, rect, &field.style)?,
            ..Default::default()
        }),
        // A missing image leaves the slot empty
        ResolvedValue::Image(None) => Ok(FieldDrawing::default()),
        ResolvedValue::Image(Some(reference)) => {
            let bytes = assets.load(reference)?;
            let image_id = embed_image(doc, &bytes)?;
            let name = format!("DLImg{}", field.id.0);
            Ok(FieldDrawing {
                ops: image_ops(&name, rect),
                font: None,
                xobject: Some((name, image_id)),
            })
        }
    }
}

// =============================================================================
// Text
// =============================================================================

fn text_ops(
    text: &str,
    rect: &NativeRect,
    style: &FieldStyle,
    transform: &SideTransform,
    font_name: &str,
) -> Vec<Operation> {
    let size = transform.scale_length(style.font_size);
    let (r, g, b) = parse_hex_color(&style.color);

    let width_ratio = match style.font_weight {
        FontWeight::Normal => HELVETICA_CHAR_WIDTH_RATIO,
        FontWeight::Bold => HELVETICA_BOLD_CHAR_WIDTH_RATIO,
    };
    let text_width = text.chars().count() as f32 * size * width_ratio;

    let x = match style.text_align {
        None | Some(TextAlign::Left) => rect.x,
        Some(TextAlign::Center) => rect.center_x() - text_width / 2.0,
        Some(TextAlign::Right) => rect.x + rect.width - text_width,
    };
    // Cap height centred in the box
    let baseline = rect.center_y() - size * HELVETICA_CAP_HEIGHT_RATIO / 2.0;

    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), Object::Real(size)],
        ),
        Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Encode text for a WinAnsi simple font; unmappable characters become `?`
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => win_ansi_upper_control(c).unwrap_or(b'?'),
        })
        .collect()
}

/// WinAnsi's 0x80-0x9F block, which Latin-1 leaves to control codes
fn win_ansi_upper_control(c: char) -> Option<u8> {
    let code = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Parse hex color string (e.g., "#FF0000", "F00") to RGB floats (0-1 range)
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim().trim_start_matches('#');
    let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f32 / 255.0;
    match hex.len() {
        6 | 8 if hex.is_ascii() => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
        3 if hex.is_ascii() => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            (expand(0), expand(1), expand(2))
        }
        _ => (0.0, 0.0, 0.0), // Default to black
    }
}

// =============================================================================
// Codes
// =============================================================================

fn barcode_ops(
    payload: &str,
    rect: &NativeRect,
    style: &FieldStyle,
) -> std::result::Result<Vec<Operation>, String> {
    // Set B covers printable ASCII; anything else would be read as a
    // character-set switch or rejected outright
    if let Some(c) = payload.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(format!(
            "'{}' in '{}' cannot be encoded in Code 128 set B",
            c, payload
        ));
    }

    let code = Code128::new(format!("{}{}", CODE128_SET_B, payload))
        .map_err(|e| format!("cannot encode '{}' as Code 128: {}", payload, e))?;
    let modules = code.encode();
    if modules.is_empty() {
        return Err(format!("Code 128 produced no modules for '{}'", payload));
    }

    let module_width = rect.width / modules.len() as f32;
    let mut ops = fill_prologue(style);

    // One rectangle per run of dark modules
    let mut index = 0;
    while index < modules.len() {
        if modules[index] == 0 {
            index += 1;
            continue;
        }
        let start = index;
        while index < modules.len() && modules[index] != 0 {
            index += 1;
        }
        ops.push(rect_op(
            rect.x + start as f32 * module_width,
            rect.y,
            (index - start) as f32 * module_width,
            rect.height,
        ));
    }

    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
    Ok(ops)
}

fn qr_ops(
    payload: &str,
    rect: &NativeRect,
    style: &FieldStyle,
) -> std::result::Result<Vec<Operation>, String> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| format!("cannot encode QR payload: {}", e))?;
    let modules = code.width();
    let colors = code.to_colors();

    // Square symbol centred in the box
    let side = rect.width.min(rect.height);
    let module = side / modules as f32;
    let origin_x = rect.x + (rect.width - side) / 2.0;
    let origin_y = rect.y + (rect.height - side) / 2.0;

    let mut ops = fill_prologue(style);
    for row in 0..modules {
        for col in 0..modules {
            if colors[row * modules + col] == Color::Dark {
                // Row 0 is the top of the symbol
                ops.push(rect_op(
                    origin_x + col as f32 * module,
                    origin_y + (modules - 1 - row) as f32 * module,
                    module,
                    module,
                ));
            }
        }
    }

    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
    Ok(ops)
}

fn fill_prologue(style: &FieldStyle) -> Vec<Operation> {
    let (r, g, b) = parse_hex_color(&style.color);
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
    ]
}

fn rect_op(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new(
        "re",
        vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(width),
            Object::Real(height),
        ],
    )
}

// =============================================================================
// Images
// =============================================================================

/// Decode an image and add it as an Image XObject, with a soft mask
/// when it carries transparency
fn embed_image(doc: &mut Document, bytes: &[u8]) -> std::result::Result<ObjectId, String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("invalid image: {}", e))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in img.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if alpha.iter().any(|&a| a != u8::MAX) {
        let smask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        image_dict.set("SMask", Object::Reference(smask_id));
    }

    Ok(doc.add_object(Stream::new(image_dict, rgb)))
}

/// Stretch the unit image square over the field rectangle
fn image_ops(name: &str, rect: &NativeRect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(rect.width),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(rect.height),
                Object::Real(rect.x),
                Object::Real(rect.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
