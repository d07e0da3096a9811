//! Interactive editor as a pure reducer
//!
//! The editor owns the template being designed plus the current pointer
//! interaction. Every change goes through [`reduce`], so drag, resize and
//! property edits can be driven and checked without any drawing surface.
//! All geometry here is in workspace pixels.

mod action;
mod palette;

pub use action::{EditorAction, FieldPatch, ResizeHandle};
pub use palette::PaletteEntry;

use crate::constants::DUPLICATE_OFFSET;
use crate::geometry::{Point, WorkspaceRect};
use crate::options::EngineOptions;
use crate::template::{OverlayField, Side, Template};
use crate::types::{FieldId, SideKind};

/// Coarse editor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoTemplate,
    /// The active side has no background yet
    TemplateEmpty,
    TemplateReady,
}

/// Pointer interaction on the active side
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Selected(FieldId),
    Dragging {
        id: FieldId,
        offset: Point,
    },
    Resizing {
        id: FieldId,
        handle: ResizeHandle,
        start_pointer: Point,
        start_rect: WorkspaceRect,
    },
}

impl Interaction {
    /// The field this interaction is about, if any
    pub fn field(&self) -> Option<FieldId> {
        match *self {
            Interaction::Idle => None,
            Interaction::Selected(id)
            | Interaction::Dragging { id, .. }
            | Interaction::Resizing { id, .. } => Some(id),
        }
    }
}

/// Guard messages for the operator; an action that trips one is a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorNotice {
    NoTemplate,
    /// Upload a document for this side before placing fields
    NoBackground(SideKind),
    UnknownField(FieldId),
}

impl std::fmt::Display for EditorNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorNotice::NoTemplate => write!(f, "No template is open"),
            EditorNotice::NoBackground(side) => {
                write!(f, "Upload a document for the {} side first", side)
            }
            EditorNotice::UnknownField(id) => write!(f, "Field {} is not on this side", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Editor {
    pub template: Option<Template>,
    pub active_side: SideKind,
    pub interaction: Interaction,
    /// Set by the last action if it was refused
    pub notice: Option<EditorNotice>,
    pub options: EngineOptions,
}

impl Editor {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn with_template(template: Template) -> Self {
        reduce(Self::default(), EditorAction::LoadTemplate(template))
    }

    pub fn phase(&self) -> Phase {
        match &self.template {
            None => Phase::NoTemplate,
            Some(template) if template.side(self.active_side).is_ready() => Phase::TemplateReady,
            Some(_) => Phase::TemplateEmpty,
        }
    }

    pub fn selected(&self) -> Option<FieldId> {
        self.interaction.field()
    }

    pub fn active(&self) -> Option<&Side> {
        self.template
            .as_ref()
            .map(|template| template.side(self.active_side))
    }

    /// A field on the active side
    pub fn field(&self, id: FieldId) -> Option<&OverlayField> {
        self.active()?
            .overlay_fields
            .iter()
            .find(|field| field.id == id)
    }

    /// In-place form of [`reduce`]
    pub fn apply(&mut self, action: EditorAction) {
        *self = reduce(std::mem::take(self), action);
    }

    fn active_field_mut(&mut self, id: FieldId) -> Option<&mut OverlayField> {
        let side = self.active_side;
        self.template
            .as_mut()?
            .side_mut(side)
            .overlay_fields
            .iter_mut()
            .find(|field| field.id == id)
    }

    fn refuse(mut self, notice: EditorNotice) -> Self {
        log::debug!("Editor refused action: {}", notice);
        self.notice = Some(notice);
        self
    }
}

/// Apply one action and return the next state
pub fn reduce(mut editor: Editor, action: EditorAction) -> Editor {
    editor.notice = None;

    match action {
        EditorAction::LoadTemplate(template) => {
            editor.template = Some(template);
            editor.active_side = SideKind::Front;
            editor.interaction = Interaction::Idle;
            editor
        }

        EditorAction::ApplyIngestion(document) => match editor.template.as_mut() {
            Some(template) => {
                template.apply_ingestion(document);
                editor.interaction = Interaction::Idle;
                editor
            }
            None => editor.refuse(EditorNotice::NoTemplate),
        },

        EditorAction::AddField(entry) => {
            let side = editor.active_side;
            match editor.phase() {
                Phase::NoTemplate => return editor.refuse(EditorNotice::NoTemplate),
                Phase::TemplateEmpty => return editor.refuse(EditorNotice::NoBackground(side)),
                Phase::TemplateReady => {}
            }
            let placeholders = editor.options.placeholders();
            let Some(template) = editor.template.as_mut() else {
                return editor;
            };
            let id = template.next_field_id();
            let field = entry.build(id, side, placeholders);
            template.side_mut(side).overlay_fields.push(field);
            editor.interaction = Interaction::Selected(id);
            editor
        }

        EditorAction::SelectField(id) => {
            if editor.field(id).is_none() {
                return editor.refuse(EditorNotice::UnknownField(id));
            }
            editor.interaction = Interaction::Selected(id);
            editor
        }

        EditorAction::ClearSelection => {
            editor.interaction = Interaction::Idle;
            editor
        }

        EditorAction::BeginDrag { id, offset } => {
            if editor.field(id).is_none() {
                return editor.refuse(EditorNotice::UnknownField(id));
            }
            editor.interaction = Interaction::Dragging { id, offset };
            editor
        }

        EditorAction::BeginResize {
            id,
            handle,
            pointer,
        } => {
            let Some(start_rect) = editor.field(id).map(|field| field.rect) else {
                return editor.refuse(EditorNotice::UnknownField(id));
            };
            editor.interaction = Interaction::Resizing {
                id,
                handle,
                start_pointer: pointer,
                start_rect,
            };
            editor
        }

        EditorAction::PointerMove(pointer) => {
            match editor.interaction {
                Interaction::Dragging { id, offset } => {
                    // No clamping: fields may be parked off-canvas
                    if let Some(field) = editor.active_field_mut(id) {
                        field.rect.x = (pointer.x - offset.x).round();
                        field.rect.y = (pointer.y - offset.y).round();
                    }
                }
                Interaction::Resizing {
                    id,
                    handle,
                    start_pointer,
                    start_rect,
                } => {
                    let rect = handle.apply(&start_rect, pointer - start_pointer);
                    if let Some(field) = editor.active_field_mut(id) {
                        field.rect = rect;
                    }
                }
                Interaction::Idle | Interaction::Selected(_) => {}
            }
            editor
        }

        EditorAction::PointerUp => {
            if let Interaction::Dragging { id, .. } | Interaction::Resizing { id, .. } =
                editor.interaction
            {
                editor.interaction = Interaction::Selected(id);
            }
            editor
        }

        EditorAction::UpdateField { id, patch } => match editor.active_field_mut(id) {
            Some(field) => {
                patch.apply_to(field);
                editor
            }
            None => editor.refuse(EditorNotice::UnknownField(id)),
        },

        EditorAction::DeleteField(id) => {
            let side = editor.active_side;
            let Some(template) = editor.template.as_mut() else {
                return editor.refuse(EditorNotice::NoTemplate);
            };
            let fields = &mut template.side_mut(side).overlay_fields;
            match fields.iter().position(|field| field.id == id) {
                Some(index) => {
                    fields.remove(index);
                    if editor.interaction.field() == Some(id) {
                        editor.interaction = Interaction::Idle;
                    }
                    editor
                }
                None => editor.refuse(EditorNotice::UnknownField(id)),
            }
        }

        EditorAction::DuplicateField(id) => {
            let side = editor.active_side;
            let Some(template) = editor.template.as_mut() else {
                return editor.refuse(EditorNotice::NoTemplate);
            };
            let next_id = template.next_field_id();
            let fields = &mut template.side_mut(side).overlay_fields;
            let Some(mut copy) = fields.iter().find(|field| field.id == id).cloned() else {
                return editor.refuse(EditorNotice::UnknownField(id));
            };
            copy.id = next_id;
            copy.rect.x += DUPLICATE_OFFSET;
            copy.rect.y += DUPLICATE_OFFSET;
            fields.push(copy);
            editor.interaction = Interaction::Selected(next_id);
            editor
        }

        EditorAction::NudgeField { id, dx, dy } => match editor.active_field_mut(id) {
            Some(field) => {
                field.rect.x = (field.rect.x + dx).round();
                field.rect.y = (field.rect.y + dy).round();
                editor
            }
            None => editor.refuse(EditorNotice::UnknownField(id)),
        },

        EditorAction::SwitchSide(side) => {
            editor.active_side = side;
            editor.interaction = Interaction::Idle;
            editor
        }
    }
}
