use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignError {
    #[error("File is {size} bytes, above the {limit} byte ceiling")]
    FileTooLarge { size: usize, limit: usize },
    #[error("Could not parse document: {0}")]
    DocumentParseFailure(String),
    #[error("The {0} side has no recorded native dimensions")]
    MissingDimensions(SideKind),
    #[error("Template has no retained source document")]
    MissingSourceDocument,
    #[error("Field {field} failed to render: {reason}")]
    RenderFailure { field: FieldId, reason: String },
    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DesignError>;

/// Error categories surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FileTooLarge,
    DocumentParseFailure,
    MissingDimensions,
    UnresolvedBinding,
    RenderFailure,
    PersistenceFailure,
    Other,
}

impl DesignError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DesignError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            DesignError::DocumentParseFailure(_) | DesignError::MissingSourceDocument => {
                ErrorKind::DocumentParseFailure
            }
            DesignError::MissingDimensions(_) => ErrorKind::MissingDimensions,
            DesignError::RenderFailure { .. } => ErrorKind::RenderFailure,
            DesignError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            DesignError::Pdf(_)
            | DesignError::Io(_)
            | DesignError::Json(_)
            | DesignError::Config(_)
            | DesignError::TaskJoin(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn render(field: FieldId, reason: impl fmt::Display) -> Self {
        DesignError::RenderFailure {
            field,
            reason: reason.to_string(),
        }
    }
}

/// One of the two printable faces of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideKind {
    #[default]
    Front,
    Back,
}

impl SideKind {
    pub const ALL: [SideKind; 2] = [SideKind::Front, SideKind::Back];

    /// Zero-based page index in the source document
    pub fn page_index(self) -> usize {
        match self {
            SideKind::Front => 0,
            SideKind::Back => 1,
        }
    }

    pub fn from_page_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SideKind::Front),
            1 => Some(SideKind::Back),
            _ => None,
        }
    }
}

impl fmt::Display for SideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideKind::Front => write!(f, "front"),
            SideKind::Back => write!(f, "back"),
        }
    }
}

/// Locally unique field identifier within a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physical orientation of the printed artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// What the template produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    #[default]
    IdentityCard,
    Report,
    Certificate,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::IdentityCard => write!(f, "identity_card"),
            ArtifactKind::Report => write!(f, "report"),
            ArtifactKind::Certificate => write!(f, "certificate"),
        }
    }
}

/// Page size in the source document's own units (points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeDimensions {
    pub width_native: f32,
    pub height_native: f32,
}

impl NativeDimensions {
    pub fn new(width_native: f32, height_native: f32) -> Self {
        Self {
            width_native,
            height_native,
        }
    }
}
