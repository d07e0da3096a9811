use crate::{DesignCommand, DesignUpdate, handlers};
use design_lab::{
    AssetSource, AuditSink, EngineOptions, PageRasterizer, Record, RecordProvider, Template,
    TemplateRepository,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything the worker talks to outside the engine
pub struct Collaborators<R, P, A> {
    pub rasterizer: Arc<dyn PageRasterizer>,
    pub assets: Arc<dyn AssetSource>,
    pub repository: R,
    pub records: P,
    pub audit: A,
    pub options: EngineOptions,
}

/// Async worker task that processes design commands and sends updates.
///
/// Runs until every command sender is dropped.
pub async fn worker_task<R, P, A>(
    mut command_rx: mpsc::UnboundedReceiver<DesignCommand>,
    update_tx: mpsc::UnboundedSender<DesignUpdate>,
    collaborators: Collaborators<R, P, A>,
) where
    R: TemplateRepository,
    P: RecordProvider,
    A: AuditSink,
{
    // Commands pulled off the channel while coalescing renders
    let mut backlog = VecDeque::new();

    loop {
        let cmd = match backlog.pop_front() {
            Some(cmd) => cmd,
            None => match command_rx.recv().await {
                Some(cmd) => cmd,
                None => break,
            },
        };

        match cmd {
            DesignCommand::Ingest { bytes } => {
                handlers::ingest::handle_ingest(
                    bytes,
                    collaborators.rasterizer.clone(),
                    &collaborators.options,
                    &update_tx,
                )
                .await;
            }
            DesignCommand::Render { template, record } => {
                let (template, record) =
                    newest_render(template, record, &mut command_rx, &mut backlog);
                handlers::render::handle_render(
                    template,
                    record,
                    &collaborators.records,
                    collaborators.assets.clone(),
                    &collaborators.options,
                    &update_tx,
                )
                .await;
            }
            DesignCommand::Save { template } => {
                handlers::save::handle_save(
                    template,
                    &collaborators.repository,
                    &collaborators.audit,
                    &update_tx,
                )
                .await;
            }
        }
    }

    log::debug!("Design worker stopped");
}

/// Drain queued commands, keeping only the most recent render request.
/// Anything else is set aside to run after the render, in arrival order.
fn newest_render(
    mut template: Template,
    mut record: Option<Record>,
    command_rx: &mut mpsc::UnboundedReceiver<DesignCommand>,
    backlog: &mut VecDeque<DesignCommand>,
) -> (Template, Option<Record>) {
    while let Ok(next_cmd) = command_rx.try_recv() {
        if let DesignCommand::Render {
            template: new_template,
            record: new_record,
        } = next_cmd
        {
            log::debug!("Discarding queued test render, using newer request");
            template = new_template;
            record = new_record;
        } else {
            backlog.push_back(next_cmd);
        }
    }
    (template, record)
}
