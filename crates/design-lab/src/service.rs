//! Collaborator interfaces
//!
//! Persistence, sample records and auditing live outside the engine; the
//! engine only talks to them through these traits.

use crate::binding::Record;
use crate::template::Template;
use crate::types::*;
use serde_json::{Value, json};
use std::future::Future;

/// Audit action recorded after a successful save
pub const TEMPLATE_SAVED: &str = "template.saved";

/// Template storage; saves are whole-template upserts keyed by id
pub trait TemplateRepository: Send + Sync {
    fn load_templates(
        &self,
        tenant_id: &str,
        kind: ArtifactKind,
    ) -> impl Future<Output = Result<Vec<Template>>> + Send;

    fn save_template(&self, template: &Template) -> impl Future<Output = Result<()>> + Send;
}

/// Supplies a representative record for test injection
pub trait RecordProvider: Send + Sync {
    fn fetch_sample_record(&self, tenant_id: &str) -> impl Future<Output = Result<Record>> + Send;
}

/// Fire-and-forget event log
pub trait AuditSink: Send + Sync {
    fn log_event(&self, action: &str, context: Value) -> std::result::Result<(), String>;
}

/// Persist a snapshot of the whole template, then audit it.
///
/// A repository failure comes back as `PersistenceFailure` and the caller's
/// template is left as it was. Audit failures are logged and swallowed.
pub async fn save_template<R, A>(repository: &R, audit: &A, template: &Template) -> Result<()>
where
    R: TemplateRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    repository
        .save_template(template)
        .await
        .map_err(|e| match e {
            DesignError::PersistenceFailure(_) => e,
            other => DesignError::PersistenceFailure(other.to_string()),
        })?;

    log::info!(
        "Saved template '{}' ({} field(s))",
        template.id,
        template.fields().count()
    );

    let context = json!({
        "templateId": template.id,
        "tenantId": template.tenant_id,
        "name": template.name,
        "kind": template.kind,
        "fieldCount": template.fields().count(),
    });
    if let Err(e) = audit.log_event(TEMPLATE_SAVED, context) {
        log::warn!("Audit sink rejected '{}': {}", TEMPLATE_SAVED, e);
    }

    Ok(())
}
