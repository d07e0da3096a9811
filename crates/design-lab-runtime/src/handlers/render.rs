use super::send_error;
use crate::DesignUpdate;
use design_lab::{AssetSource, EngineOptions, Record, RecordProvider, Template};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn handle_render<P: RecordProvider>(
    template: Template,
    record: Option<Record>,
    records: &P,
    assets: Arc<dyn AssetSource>,
    options: &EngineOptions,
    update_tx: &mpsc::UnboundedSender<DesignUpdate>,
) {
    let record = match record {
        Some(record) => record,
        None => match records.fetch_sample_record(&template.tenant_id).await {
            Ok(record) => record,
            Err(e) => return send_error(update_tx, "Failed to fetch sample record", e),
        },
    };

    let template_id = template.id.clone();
    match design_lab::render(template, record, assets, options).await {
        Ok(artifact) => {
            if !artifact.unresolved.is_empty() {
                log::warn!(
                    "Test render of '{}' left {} binding(s) unresolved",
                    template_id,
                    artifact.unresolved.len()
                );
            }
            let _ = update_tx.send(DesignUpdate::Rendered { artifact });
        }
        Err(e) => send_error(update_tx, "Failed to render template", e),
    }
}
