use super::send_error;
use crate::DesignUpdate;
use design_lab::{AuditSink, Template, TemplateRepository};
use tokio::sync::mpsc;

pub async fn handle_save<R: TemplateRepository, A: AuditSink>(
    template: Template,
    repository: &R,
    audit: &A,
    update_tx: &mpsc::UnboundedSender<DesignUpdate>,
) {
    match design_lab::save_template(repository, audit, &template).await {
        Ok(()) => {
            let _ = update_tx.send(DesignUpdate::Saved {
                template_id: template.id,
            });
        }
        Err(e) => send_error(update_tx, "Failed to save template", e),
    }
}
