//! Persisted template model
//!
//! A template is two sides (front/back), each with an optional raster
//! preview, the page's native dimensions and an ordered list of overlay
//! fields. The original source document is kept verbatim alongside so
//! injection can work on the real document instead of the preview.

use crate::constants::*;
use crate::geometry::{SideTransform, WorkspaceRect};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A document template and everything placed on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub kind: ArtifactKind,
    #[serde(default)]
    pub orientation: Orientation,
    /// Canvas width the fields were laid out against
    #[serde(default = "default_workspace_width")]
    pub workspace_width: f32,
    #[serde(default)]
    pub front: Side,
    #[serde(default)]
    pub back: Side,
    /// Original uploaded document, retained for injection
    #[serde(
        rename = "pdf_base64",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<SourceDocument>,
}

fn default_workspace_width() -> f32 {
    WORKSPACE_WIDTH
}

/// One printable face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Side {
    /// Raster preview for on-screen editing only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
    /// Page size in native units, fixed at ingestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<NativeDimensions>,
    #[serde(default)]
    pub overlay_fields: Vec<OverlayField>,
}

impl Side {
    /// Fields may only be placed once both preview and dimensions exist
    pub fn is_ready(&self) -> bool {
        self.background_url.is_some() && self.dimensions.is_some()
    }

    /// Replace the background; existing fields lose their meaning and are dropped
    pub fn reset(&mut self, background_url: Option<String>, dimensions: Option<NativeDimensions>) {
        self.background_url = background_url;
        self.dimensions = dimensions;
        self.overlay_fields.clear();
    }
}

/// The original source document bytes, persisted as base64
#[derive(Clone, PartialEq, Eq)]
pub struct SourceDocument(pub Vec<u8>);

impl SourceDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceDocument({} bytes)", self.0.len())
    }
}

/// A positioned, styled, data-bound placeholder on a side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayField {
    pub id: FieldId,
    pub side: SideKind,
    pub binding: Binding,
    /// Geometry in workspace pixels
    #[serde(flatten)]
    pub rect: WorkspaceRect,
    #[serde(default)]
    pub style: FieldStyle,
}

impl OverlayField {
    pub fn field_type(&self) -> FieldType {
        self.binding.field_type()
    }
}

/// Palette categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Photo,
    Signature,
    Barcode,
    Qr,
}

impl FieldType {
    /// Default size in workspace pixels; assets get more room than text
    pub fn default_size(self) -> (f32, f32) {
        match self {
            FieldType::Text => TEXT_FIELD_SIZE,
            FieldType::Photo => PHOTO_FIELD_SIZE,
            FieldType::Signature => SIGNATURE_FIELD_SIZE,
            FieldType::Barcode => BARCODE_FIELD_SIZE,
            FieldType::Qr => QR_FIELD_SIZE,
        }
    }
}

/// Where a field's value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Binding {
    Text(TextBinding),
    Image(ImageBinding),
    Composite(CompositeBinding),
}

impl Binding {
    pub fn field_type(&self) -> FieldType {
        match self {
            Binding::Text(_) => FieldType::Text,
            Binding::Image(image) => match image.asset {
                ImageAsset::Photo => FieldType::Photo,
                ImageAsset::Signature => FieldType::Signature,
            },
            Binding::Composite(composite) => match composite.symbology {
                Symbology::Barcode => FieldType::Barcode,
                Symbology::Qr => FieldType::Qr,
            },
        }
    }
}

/// Either a placeholder token (`{{name}}`) or a literal string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBinding {
    pub binding_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAsset {
    Photo,
    Signature,
}

/// Record field holding an image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBinding {
    pub asset: ImageAsset,
    pub binding_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    Barcode,
    Qr,
}

/// How bound values are joined into a code payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Values joined by `|`
    #[default]
    Psv,
    /// `{"field":"value",...}` in configured order
    Json,
}

/// Several record fields encoded into one barcode or QR payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeBinding {
    pub symbology: Symbology,
    pub fields: Vec<String>,
    #[serde(default)]
    pub mode: EncodingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Visual style; lengths are in workspace pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyle {
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            color: DEFAULT_COLOR.to_string(),
            text_align: None,
        }
    }
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        kind: ArtifactKind,
        orientation: Orientation,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            kind,
            orientation,
            workspace_width: WORKSPACE_WIDTH,
            front: Side::default(),
            back: Side::default(),
            source: None,
        }
    }

    pub fn side(&self, kind: SideKind) -> &Side {
        match kind {
            SideKind::Front => &self.front,
            SideKind::Back => &self.back,
        }
    }

    pub fn side_mut(&mut self, kind: SideKind) -> &mut Side {
        match kind {
            SideKind::Front => &mut self.front,
            SideKind::Back => &mut self.back,
        }
    }

    /// All fields in drawing order: front fields, then back fields
    pub fn fields(&self) -> impl Iterator<Item = &OverlayField> {
        self.front
            .overlay_fields
            .iter()
            .chain(self.back.overlay_fields.iter())
    }

    pub fn field(&self, id: FieldId) -> Option<&OverlayField> {
        self.fields().find(|field| field.id == id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut OverlayField> {
        self.front
            .overlay_fields
            .iter_mut()
            .chain(self.back.overlay_fields.iter_mut())
            .find(|field| field.id == id)
    }

    /// Remove a field from whichever side holds it
    pub fn remove_field(&mut self, id: FieldId) -> Option<OverlayField> {
        for side in SideKind::ALL {
            let fields = &mut self.side_mut(side).overlay_fields;
            if let Some(index) = fields.iter().position(|field| field.id == id) {
                return Some(fields.remove(index));
            }
        }
        None
    }

    /// A fresh id, one past the highest in use.
    ///
    /// Once `u32::MAX` is taken the lowest free id is reused instead.
    pub fn next_field_id(&self) -> FieldId {
        let highest = self.fields().map(|field| field.id.0).max().unwrap_or(0);
        if let Some(next) = highest.checked_add(1) {
            return FieldId(next);
        }

        let used: HashSet<u32> = self.fields().map(|field| field.id.0).collect();
        FieldId((1..u32::MAX).find(|id| !used.contains(id)).unwrap_or(0))
    }

    /// Workspace-to-native transform for a side.
    ///
    /// Fails instead of guessing a ratio when the side was never ingested.
    pub fn transform(&self, side: SideKind) -> Result<SideTransform> {
        let dimensions = self
            .side(side)
            .dimensions
            .ok_or(DesignError::MissingDimensions(side))?;
        Ok(SideTransform::new(dimensions, self.workspace_width))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a template from a JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Save a template to a JSON file.
    ///
    /// The JSON goes to a `.tmp` sibling first and is renamed over the
    /// target, so an interrupted save leaves the previous file intact.
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = std::path::PathBuf::from(staging);

        tokio::fs::write(&staging, self.to_json()?).await?;
        if let Err(e) = tokio::fs::rename(&staging, path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }
}

mod serde_impls {
    use super::SourceDocument;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde::{Deserialize, Serialize};

    impl Serialize for SourceDocument {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_str(&BASE64.encode(&self.0))
        }
    }

    impl<'de> Deserialize<'de> for SourceDocument {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let encoded = String::deserialize(deserializer)?;
            BASE64
                .decode(encoded.trim())
                .map(SourceDocument)
                .map_err(|e| serde::de::Error::custom(format!("invalid base64 document: {e}")))
        }
    }
}
