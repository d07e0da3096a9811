use crate::constants::DEFAULT_FIELD_POSITION;
use crate::geometry::WorkspaceRect;
use crate::options::Placeholders;
use crate::template::*;
use crate::types::{FieldId, SideKind};
use serde::{Deserialize, Serialize};

/// Something the operator can drop onto the canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum PaletteEntry {
    /// Text bound to a record field
    Text { key: String },
    /// Literal text printed as-is
    StaticText { text: String },
    Photo { key: String },
    Signature { key: String },
    Barcode {
        fields: Vec<String>,
        #[serde(default)]
        mode: EncodingMode,
    },
    Qr {
        fields: Vec<String>,
        #[serde(default)]
        mode: EncodingMode,
    },
}

impl PaletteEntry {
    pub fn field_type(&self) -> FieldType {
        match self {
            PaletteEntry::Text { .. } | PaletteEntry::StaticText { .. } => FieldType::Text,
            PaletteEntry::Photo { .. } => FieldType::Photo,
            PaletteEntry::Signature { .. } => FieldType::Signature,
            PaletteEntry::Barcode { .. } => FieldType::Barcode,
            PaletteEntry::Qr { .. } => FieldType::Qr,
        }
    }

    pub fn binding(&self, placeholders: Placeholders<'_>) -> Binding {
        match self {
            PaletteEntry::Text { key } => Binding::Text(TextBinding {
                binding_key: placeholders.wrap(key),
            }),
            PaletteEntry::StaticText { text } => Binding::Text(TextBinding {
                binding_key: text.clone(),
            }),
            PaletteEntry::Photo { key } => Binding::Image(ImageBinding {
                asset: ImageAsset::Photo,
                binding_key: key.clone(),
            }),
            PaletteEntry::Signature { key } => Binding::Image(ImageBinding {
                asset: ImageAsset::Signature,
                binding_key: key.clone(),
            }),
            PaletteEntry::Barcode { fields, mode } => Binding::Composite(CompositeBinding {
                symbology: Symbology::Barcode,
                fields: fields.clone(),
                mode: *mode,
            }),
            PaletteEntry::Qr { fields, mode } => Binding::Composite(CompositeBinding {
                symbology: Symbology::Qr,
                fields: fields.clone(),
                mode: *mode,
            }),
        }
    }

    /// A new field at the default position with the type's default size
    pub fn build(&self, id: FieldId, side: SideKind, placeholders: Placeholders<'_>) -> OverlayField {
        let (width, height) = self.field_type().default_size();
        OverlayField {
            id,
            side,
            binding: self.binding(placeholders),
            rect: WorkspaceRect::new(
                DEFAULT_FIELD_POSITION.0,
                DEFAULT_FIELD_POSITION.1,
                width,
                height,
            ),
            style: FieldStyle::default(),
        }
    }
}
