use super::send_error;
use crate::DesignUpdate;
use design_lab::{EngineOptions, PageRasterizer};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn handle_ingest(
    bytes: Vec<u8>,
    rasterizer: Arc<dyn PageRasterizer>,
    options: &EngineOptions,
    update_tx: &mpsc::UnboundedSender<DesignUpdate>,
) {
    let size = bytes.len();
    match design_lab::ingest(bytes, rasterizer, options).await {
        Ok(document) => {
            log::info!(
                "Ingested {} byte document with {} side(s)",
                size,
                document.pages.len()
            );
            let _ = update_tx.send(DesignUpdate::Ingested { document });
        }
        Err(e) => send_error(update_tx, "Failed to ingest document", e),
    }
}
