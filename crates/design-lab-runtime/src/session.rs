use crate::worker::{Collaborators, worker_task};
use crate::{DesignCommand, DesignUpdate};
use design_lab::ingest::check_size;
use design_lab::{
    AuditSink, DesignError, Editor, EditorAction, ErrorKind, Record, RecordProvider,
    RenderedArtifact, Result, TemplateRepository,
};
use tokio::sync::mpsc;

/// Last background task that failed, as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// One designer session: the editor plus its background worker.
///
/// Editor actions apply immediately. Uploads, test renders and saves are
/// queued to the worker and their results are folded in by
/// [`poll_updates`](Self::poll_updates) or [`next_update`](Self::next_update).
/// A failed task never touches the template, so edits made while it was
/// in flight are kept.
pub struct Session {
    editor: Editor,
    command_tx: mpsc::UnboundedSender<DesignCommand>,
    update_rx: mpsc::UnboundedReceiver<DesignUpdate>,
    status: String,
    last_failure: Option<TaskFailure>,
    last_artifact: Option<RenderedArtifact>,
}

impl Session {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn<R, P, A>(collaborators: Collaborators<R, P, A>) -> Self
    where
        R: TemplateRepository + 'static,
        P: RecordProvider + 'static,
        A: AuditSink + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let editor = Editor::new(collaborators.options.clone());
        tokio::spawn(worker_task(command_rx, update_tx, collaborators));

        Self::from_channels(editor, command_tx, update_rx)
    }

    /// Wrap channels to a worker started elsewhere
    pub fn from_channels(
        editor: Editor,
        command_tx: mpsc::UnboundedSender<DesignCommand>,
        update_rx: mpsc::UnboundedReceiver<DesignUpdate>,
    ) -> Self {
        Self {
            editor,
            command_tx,
            update_rx,
            status: String::new(),
            last_failure: None,
            last_artifact: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_failure(&self) -> Option<&TaskFailure> {
        self.last_failure.as_ref()
    }

    pub fn last_artifact(&self) -> Option<&RenderedArtifact> {
        self.last_artifact.as_ref()
    }

    pub fn take_artifact(&mut self) -> Option<RenderedArtifact> {
        self.last_artifact.take()
    }

    /// Apply an editor action synchronously
    pub fn dispatch(&mut self, action: EditorAction) {
        self.editor.apply(action);
        if let Some(notice) = self.editor.notice {
            self.status = notice.to_string();
        }
    }

    /// Queue an uploaded document for ingestion.
    ///
    /// Oversized files are refused here, before any task starts.
    pub fn upload(&mut self, bytes: Vec<u8>) -> Result<()> {
        check_size(bytes.len(), &self.editor.options)?;
        self.send(DesignCommand::Ingest { bytes });
        self.status = "Processing document...".to_string();
        Ok(())
    }

    /// Queue a test injection of the current template
    pub fn request_render(&mut self, record: Option<Record>) -> Result<()> {
        let template = match &self.editor.template {
            Some(template) if template.source.is_some() => template.clone(),
            _ => return Err(DesignError::MissingSourceDocument),
        };
        self.send(DesignCommand::Render { template, record });
        self.status = "Rendering test document...".to_string();
        Ok(())
    }

    /// Queue a save of a snapshot of the current template
    pub fn save(&mut self) -> Result<()> {
        let template = self
            .editor
            .template
            .clone()
            .ok_or_else(|| DesignError::PersistenceFailure("no template is open".to_string()))?;
        self.send(DesignCommand::Save { template });
        self.status = "Saving template...".to_string();
        Ok(())
    }

    /// Apply every update that has already arrived; returns how many
    pub fn poll_updates(&mut self) -> usize {
        let mut count = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            self.apply_update(update);
            count += 1;
        }
        count
    }

    /// Wait for the next update and apply it.
    ///
    /// Returns `false` once the worker has stopped.
    pub async fn next_update(&mut self) -> bool {
        match self.update_rx.recv().await {
            Some(update) => {
                self.apply_update(update);
                true
            }
            None => false,
        }
    }

    fn send(&self, cmd: DesignCommand) {
        if self.command_tx.send(cmd).is_err() {
            log::warn!("Design worker is gone; command dropped");
        }
    }

    fn apply_update(&mut self, update: DesignUpdate) {
        match update {
            DesignUpdate::Ingested { document } => {
                let sides = document.pages.len();
                self.editor.apply(EditorAction::ApplyIngestion(document));
                self.status = match self.editor.notice {
                    Some(notice) => notice.to_string(),
                    None => format!("Document ready ({} side(s))", sides),
                };
                self.last_failure = None;
            }
            DesignUpdate::Rendered { artifact } => {
                self.status = match artifact.unresolved.len() {
                    0 => format!("Rendered {} page(s)", artifact.page_count),
                    n => format!(
                        "Rendered {} page(s), {} binding(s) unresolved",
                        artifact.page_count, n
                    ),
                };
                self.last_artifact = Some(artifact);
                self.last_failure = None;
            }
            DesignUpdate::Saved { template_id } => {
                self.status = format!("Saved template '{}'", template_id);
                self.last_failure = None;
            }
            DesignUpdate::Error { kind, message } => {
                self.status = message.clone();
                self.last_failure = Some(TaskFailure { kind, message });
            }
        }
    }
}
