//! Background task runtime for the template designer
//!
//! Ingestion, test injection and saving run on a worker task fed through
//! an unbounded command channel; results come back as [`DesignUpdate`]s.
//! [`Session`] ties the channels to an [`Editor`](design_lab::Editor) so
//! pointer handling never waits on a task.

pub mod audit;
mod handlers;
pub mod records;
pub mod repository;
mod session;
mod worker;

pub use audit::{AuditEntry, LogAuditSink, MemoryAuditSink};
pub use records::{FileRecordProvider, RecordError, load_records};
pub use repository::JsonFileRepository;
pub use session::{Session, TaskFailure};
pub use worker::{Collaborators, worker_task};

use design_lab::{ErrorKind, IngestedDocument, Record, RenderedArtifact, Template};

/// Commands sent from the session to the worker
#[derive(Debug)]
pub enum DesignCommand {
    /// Rasterize an uploaded document
    Ingest { bytes: Vec<u8> },
    /// Test injection; without a record the provider's sample is used.
    /// Queued renders are coalesced so only the newest runs.
    Render {
        template: Template,
        record: Option<Record>,
    },
    Save { template: Template },
}

/// Updates sent from the worker back to the session
#[derive(Debug, Clone)]
pub enum DesignUpdate {
    Ingested { document: IngestedDocument },
    Rendered { artifact: RenderedArtifact },
    Saved { template_id: String },
    Error { kind: ErrorKind, message: String },
}
