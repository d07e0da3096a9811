mod common;

use common::*;
use design_lab::service::TEMPLATE_SAVED;
use design_lab::*;
use serde_json::{Value, json};
use std::sync::Mutex;
use tempfile::NamedTempFile;

#[test]
fn test_template_json_shape() {
    let mut template = ingested_template(&[CARD]);
    template.front.overlay_fields.push(text_field(
        1,
        SideKind::Front,
        "{{name}}",
        WorkspaceRect::new(50.0, 60.0, 150.0, 20.0),
    ));

    let value: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();

    assert_eq!(value["tenantId"], "tenant-1");
    assert_eq!(value["kind"], "identity_card");
    assert_eq!(value["workspaceWidth"], 800.0);
    assert!(value["pdf_base64"].is_string());
    assert_eq!(value["front"]["dimensions"]["widthNative"], 1013.0);

    let field = &value["front"]["overlayFields"][0];
    assert_eq!(field["side"], "front");
    assert_eq!(field["x"], 50.0);
    assert_eq!(field["binding"]["type"], "text");
    assert_eq!(field["binding"]["bindingKey"], "{{name}}");
    assert_eq!(field["style"]["fontWeight"], "normal");
}

#[test]
fn test_template_json_round_trip() {
    let mut template = ingested_template(&[CARD, CARD]);
    template.back.overlay_fields.push(code_field(
        4,
        Symbology::Qr,
        &["reg_no", "class_id"],
        WorkspaceRect::new(10.0, 10.0, 80.0, 80.0),
    ));

    let restored = Template::from_json(&template.to_json().unwrap()).unwrap();
    assert_eq!(restored, template);
}

#[test]
fn test_template_minimal_json_uses_defaults() {
    let template = Template::from_json(
        r#"{"id":"t1","tenantId":"s1","name":"Certificate","kind":"certificate"}"#,
    )
    .unwrap();

    assert_eq!(template.workspace_width, 800.0);
    assert_eq!(template.orientation, Orientation::Landscape);
    assert!(template.source.is_none());
    assert!(!template.front.is_ready());
}

#[test]
fn test_invalid_base64_source_is_rejected() {
    let err = Template::from_json(
        r#"{"id":"t1","tenantId":"s1","name":"x","kind":"report","pdf_base64":"***"}"#,
    )
    .unwrap_err();
    assert!(matches!(err, DesignError::Json(_)));
}

#[test]
fn test_next_field_id_and_removal() {
    let mut template = ingested_template(&[CARD, CARD]);
    assert_eq!(template.next_field_id(), FieldId(1));

    template.front.overlay_fields.push(text_field(
        3,
        SideKind::Front,
        "a",
        WorkspaceRect::default(),
    ));
    template.back.overlay_fields.push(text_field(
        7,
        SideKind::Back,
        "b",
        WorkspaceRect::default(),
    ));
    assert_eq!(template.next_field_id(), FieldId(8));

    let removed = template.remove_field(FieldId(7)).unwrap();
    assert_eq!(removed.side, SideKind::Back);
    assert!(template.field(FieldId(7)).is_none());
    assert!(template.remove_field(FieldId(7)).is_none());
}

#[test]
fn test_next_field_id_after_highest_possible_id() {
    let mut template = ingested_template(&[CARD]);
    template.front.overlay_fields = vec![
        text_field(1, SideKind::Front, "a", WorkspaceRect::default()),
        text_field(u32::MAX, SideKind::Front, "b", WorkspaceRect::default()),
        text_field(2, SideKind::Front, "c", WorkspaceRect::default()),
    ];

    let next = template.next_field_id();
    assert_eq!(next, FieldId(3));
    assert!(template.field(next).is_none());
}

#[test]
fn test_transform_requires_dimensions() {
    let template = ingested_template(&[CARD]);
    assert!(template.transform(SideKind::Front).is_ok());
    assert!(matches!(
        template.transform(SideKind::Back),
        Err(DesignError::MissingDimensions(SideKind::Back))
    ));
}

// =============================================================================
// Options
// =============================================================================

#[tokio::test]
async fn test_options_save_and_load() {
    let options = EngineOptions {
        preview_scale: 3.0,
        placeholder_open: "[[".to_string(),
        placeholder_close: "]]".to_string(),
        ..Default::default()
    };

    let file = NamedTempFile::new().unwrap();
    options.save(file.path()).await.unwrap();
    let loaded = EngineOptions::load(file.path()).await.unwrap();

    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_template_save_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.json");
    std::fs::write(&path, b"stale").unwrap();

    let template = ingested_template(&[CARD]);
    template.save(&path).await.unwrap();

    assert_eq!(Template::load(&path).await.unwrap(), template);
    assert!(!dir.path().join("card.json.tmp").exists());
}

#[tokio::test]
async fn test_options_partial_file_fills_defaults() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), r#"{"max_source_bytes": 1048576}"#).unwrap();

    let loaded = EngineOptions::load(file.path()).await.unwrap();
    assert_eq!(loaded.max_source_bytes, 1_048_576);
    assert_eq!(loaded.preview_scale, 2.5);
}

#[tokio::test]
async fn test_options_load_rejects_invalid_values() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), r#"{"max_sides": 3}"#).unwrap();

    let err = EngineOptions::load(file.path()).await.unwrap_err();
    assert!(matches!(err, DesignError::Config(_)));
}

#[test]
fn test_options_validate() {
    assert!(EngineOptions::default().validate().is_ok());

    let invalid = [
        EngineOptions {
            max_source_bytes: 0,
            ..Default::default()
        },
        EngineOptions {
            preview_scale: 0.0,
            ..Default::default()
        },
        EngineOptions {
            workspace_width: -1.0,
            ..Default::default()
        },
        EngineOptions {
            max_sides: 0,
            ..Default::default()
        },
        EngineOptions {
            placeholder_close: String::new(),
            ..Default::default()
        },
    ];
    for options in invalid {
        assert!(options.validate().is_err(), "{:?}", options);
    }
}

// =============================================================================
// Save Operation
// =============================================================================

#[derive(Default)]
struct MemoryRepository {
    saved: Mutex<Vec<Template>>,
    fail: bool,
}

impl TemplateRepository for MemoryRepository {
    async fn load_templates(&self, tenant_id: &str, kind: ArtifactKind) -> Result<Vec<Template>> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.kind == kind)
            .cloned()
            .collect())
    }

    async fn save_template(&self, template: &Template) -> Result<()> {
        if self.fail {
            return Err(DesignError::Io(std::io::Error::other("disk full")));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.retain(|t| t.id != template.id);
        saved.push(template.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl AuditSink for RecordingSink {
    fn log_event(&self, action: &str, context: Value) -> std::result::Result<(), String> {
        if self.fail {
            return Err("sink offline".to_string());
        }
        self.events
            .lock()
            .unwrap()
            .push((action.to_string(), context));
        Ok(())
    }
}

#[tokio::test]
async fn test_save_upserts_and_audits() {
    let repository = MemoryRepository::default();
    let audit = RecordingSink::default();
    let mut template = ingested_template(&[CARD]);

    save_template(&repository, &audit, &template).await.unwrap();
    template.name = "Renamed".to_string();
    save_template(&repository, &audit, &template).await.unwrap();

    let stored = repository
        .load_templates("tenant-1", ArtifactKind::IdentityCard)
        .await
        .unwrap();
    assert_eq!(stored, vec![template]);

    let events = audit.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].0, TEMPLATE_SAVED);
    assert_eq!(events[1].1["name"], json!("Renamed"));
}

#[tokio::test]
async fn test_repository_failure_is_persistence_failure() {
    let repository = MemoryRepository {
        fail: true,
        ..Default::default()
    };
    let audit = RecordingSink::default();
    let template = ingested_template(&[CARD]);
    let snapshot = template.clone();

    let err = save_template(&repository, &audit, &template)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert_eq!(template, snapshot);
    assert!(audit.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_audit_failure_does_not_block_save() {
    let repository = MemoryRepository::default();
    let audit = RecordingSink {
        fail: true,
        ..Default::default()
    };
    let template = ingested_template(&[CARD]);

    save_template(&repository, &audit, &template).await.unwrap();
    assert_eq!(repository.saved.lock().unwrap().len(), 1);
}
