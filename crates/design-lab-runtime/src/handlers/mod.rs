pub mod ingest;
pub mod render;
pub mod save;

use crate::DesignUpdate;
use design_lab::DesignError;
use tokio::sync::mpsc;

fn send_error(update_tx: &mpsc::UnboundedSender<DesignUpdate>, context: &str, error: DesignError) {
    log::error!("{}: {}", context, error);
    let _ = update_tx.send(DesignUpdate::Error {
        kind: error.kind(),
        message: format!("{context}: {error}"),
    });
}
