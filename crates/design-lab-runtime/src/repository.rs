//! Template storage as one JSON file per template
//!
//! Layout: `<root>/<tenant_id>/<template_id>.json`.

use design_lab::{ArtifactKind, DesignError, Result, Template, TemplateRepository};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a template is stored in
    pub fn path_for(&self, tenant_id: &str, template_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(path_component(tenant_id)?)
            .join(format!("{}.json", path_component(template_id)?)))
    }
}

/// Ids become path components, so they must stay inside the root
fn path_component(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0']);
    if valid {
        Ok(id)
    } else {
        Err(DesignError::PersistenceFailure(format!(
            "'{}' cannot be used as a storage key",
            id
        )))
    }
}

impl TemplateRepository for JsonFileRepository {
    async fn load_templates(&self, tenant_id: &str, kind: ArtifactKind) -> Result<Vec<Template>> {
        let dir = self.root.join(path_component(tenant_id)?);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut templates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let template = Template::load(&path).await?;
            if template.kind == kind {
                templates.push(template);
            }
        }

        // Directory order is platform dependent
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        log::debug!(
            "Loaded {} {} template(s) for tenant '{}'",
            templates.len(),
            kind,
            tenant_id
        );
        Ok(templates)
    }

    async fn save_template(&self, template: &Template) -> Result<()> {
        let path = self.path_for(&template.tenant_id, &template.id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        template.save(&path).await
    }
}
