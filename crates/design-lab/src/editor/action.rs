use super::PaletteEntry;
use crate::constants::MIN_FIELD_SIZE;
use crate::geometry::{Point, WorkspaceRect};
use crate::ingest::IngestedDocument;
use crate::template::{Binding, FieldStyle, FontWeight, OverlayField, TextAlign, Template};
use crate::types::{FieldId, SideKind};
use serde::{Deserialize, Serialize};

/// Everything the editor reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    LoadTemplate(Template),
    /// Commit a finished ingestion
    ApplyIngestion(IngestedDocument),
    AddField(PaletteEntry),
    SelectField(FieldId),
    ClearSelection,
    /// `offset` is the pointer position minus the field's top-left corner
    BeginDrag { id: FieldId, offset: Point },
    BeginResize {
        id: FieldId,
        handle: ResizeHandle,
        pointer: Point,
    },
    PointerMove(Point),
    PointerUp,
    UpdateField { id: FieldId, patch: FieldPatch },
    DeleteField(FieldId),
    DuplicateField(FieldId),
    NudgeField { id: FieldId, dx: f32, dy: f32 },
    SwitchSide(SideKind),
}

/// Which edge or corner a resize is grabbed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    fn north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    fn east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    fn west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }

    /// Apply a pointer delta to the rectangle captured when the resize began.
    ///
    /// Sizes never drop below [`MIN_FIELD_SIZE`]; grabbing a north or west
    /// handle keeps the opposite edge where it was.
    pub fn apply(self, start: &WorkspaceRect, delta: Point) -> WorkspaceRect {
        let mut rect = *start;

        if self.east() {
            rect.width = (start.width + delta.x).round().max(MIN_FIELD_SIZE);
        } else if self.west() {
            rect.width = (start.width - delta.x).round().max(MIN_FIELD_SIZE);
            rect.x = start.right() - rect.width;
        }

        if self.south() {
            rect.height = (start.height + delta.y).round().max(MIN_FIELD_SIZE);
        } else if self.north() {
            rect.height = (start.height - delta.y).round().max(MIN_FIELD_SIZE);
            rect.y = start.bottom() - rect.height;
        }

        rect
    }
}

/// Partial update to a field; `None` leaves a property alone
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub color: Option<String>,
    /// `Some(None)` clears the alignment
    pub text_align: Option<Option<TextAlign>>,
    pub binding: Option<Binding>,
}

impl FieldPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn style(style: FieldStyle) -> Self {
        Self {
            font_size: Some(style.font_size),
            font_weight: Some(style.font_weight),
            color: Some(style.color),
            text_align: Some(style.text_align),
            ..Default::default()
        }
    }

    /// Merge into a field; only the size floor is enforced
    pub fn apply_to(self, field: &mut OverlayField) {
        if let Some(x) = self.x {
            field.rect.x = x;
        }
        if let Some(y) = self.y {
            field.rect.y = y;
        }
        if let Some(width) = self.width {
            field.rect.width = width.max(MIN_FIELD_SIZE);
        }
        if let Some(height) = self.height {
            field.rect.height = height.max(MIN_FIELD_SIZE);
        }
        if let Some(font_size) = self.font_size {
            field.style.font_size = font_size;
        }
        if let Some(font_weight) = self.font_weight {
            field.style.font_weight = font_weight;
        }
        if let Some(color) = self.color {
            field.style.color = color;
        }
        if let Some(text_align) = self.text_align {
            field.style.text_align = text_align;
        }
        if let Some(binding) = self.binding {
            field.binding = binding;
        }
    }
}
