mod common;

use common::*;
use design_lab::*;
use design_lab_runtime::records::{parse_csv, parse_json};
use design_lab_runtime::*;
use serde_json::json;
use tempfile::tempdir;

// =============================================================================
// Template Repository
// =============================================================================

#[tokio::test]
async fn test_repository_upserts_by_id() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path());
    let mut template = ingested_template("tpl-1", &[CARD]);

    repository.save_template(&template).await.unwrap();
    template.name = "Renamed".to_string();
    template.front.overlay_fields.push(name_field(1));
    repository.save_template(&template).await.unwrap();

    let stored = repository
        .load_templates("tenant-1", ArtifactKind::IdentityCard)
        .await
        .unwrap();
    assert_eq!(stored, vec![template]);
}

#[tokio::test]
async fn test_repository_save_replaces_file_without_leftovers() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path());
    let template = ingested_template("tpl-1", &[CARD]);

    repository.save_template(&template).await.unwrap();
    repository.save_template(&template).await.unwrap();

    let tenant_dir = dir.path().join("tenant-1");
    let names: Vec<String> = std::fs::read_dir(&tenant_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["tpl-1.json".to_string()]);

    // A staging file left by an interrupted save is not a template
    std::fs::write(tenant_dir.join("tpl-2.json.tmp"), b"{\"truncated").unwrap();
    let stored = repository
        .load_templates("tenant-1", ArtifactKind::IdentityCard)
        .await
        .unwrap();
    assert_eq!(stored, vec![template]);
}

#[tokio::test]
async fn test_repository_filters_by_kind_and_tenant() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path());

    let card_b = blank_template("b");
    let card_a = blank_template("a");
    let mut certificate = blank_template("c");
    certificate.kind = ArtifactKind::Certificate;
    let mut other_tenant = blank_template("d");
    other_tenant.tenant_id = "tenant-2".to_string();

    for template in [&card_b, &card_a, &certificate, &other_tenant] {
        repository.save_template(template).await.unwrap();
    }
    // Stray files are skipped
    std::fs::write(dir.path().join("tenant-1/notes.txt"), "x").unwrap();

    let cards = repository
        .load_templates("tenant-1", ArtifactKind::IdentityCard)
        .await
        .unwrap();
    let ids: Vec<_> = cards.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    let certificates = repository
        .load_templates("tenant-1", ArtifactKind::Certificate)
        .await
        .unwrap();
    assert_eq!(certificates, vec![certificate]);
}

#[tokio::test]
async fn test_repository_unknown_tenant_is_empty() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path());

    let templates = repository
        .load_templates("nobody", ArtifactKind::Report)
        .await
        .unwrap();
    assert!(templates.is_empty());
}

#[tokio::test]
async fn test_repository_rejects_escaping_ids() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path().join("store"));

    for id in ["../evil", "a/b", "..", ""] {
        let template = blank_template(id);
        let err = repository.save_template(&template).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure, "{id}");
    }
    assert!(!dir.path().join("evil.json").exists());
}

#[tokio::test]
async fn test_save_operation_with_file_repository() {
    let dir = tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path());
    let audit = MemoryAuditSink::new(8);
    let template = ingested_template("tpl-1", &[CARD]);

    save_template(&repository, &audit, &template).await.unwrap();

    let entries = audit.get_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, design_lab::service::TEMPLATE_SAVED);
    assert_eq!(entries[0].context["templateId"], json!("tpl-1"));
    assert_eq!(entries[0].context["kind"], json!("identity_card"));
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn test_csv_header_names_fields() {
    let records = parse_csv("name,reg_no,photo\nAmina Nakato,R001,\nBrian Okello,R002,b.png\n").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("name").as_deref(), Some("Amina Nakato"));
    // Blank cells are left out
    assert!(records[0].get("photo").is_none());
    assert_eq!(records[1].text("photo").as_deref(), Some("b.png"));
}

#[test]
fn test_json_array_and_single_object() {
    let many = parse_json(r#"[{"name": "A", "age": 12}, {"name": "B"}]"#).unwrap();
    assert_eq!(many.len(), 2);
    assert_eq!(many[0].get("age"), Some(&json!(12)));

    let one = parse_json(r#"{"name": "C"}"#).unwrap();
    assert_eq!(one, vec![Record::new().with("name", "C")]);

    assert!(parse_json("[1, 2]").is_err());
}

#[tokio::test]
async fn test_load_records_by_extension() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("students.CSV");
    std::fs::write(&csv_path, "name\nA\nB\n").unwrap();
    let json_path = dir.path().join("students.json");
    std::fs::write(&json_path, r#"[{"name": "A"}]"#).unwrap();

    assert_eq!(load_records(&csv_path).await.unwrap().len(), 2);
    assert_eq!(load_records(&json_path).await.unwrap().len(), 1);

    let err = load_records(dir.path().join("students.xlsx")).await.unwrap_err();
    assert!(matches!(err, RecordError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_file_provider_serves_first_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.csv");
    std::fs::write(&path, "name,class_id\nAmina Nakato,S.1\nBrian Okello,S.2\n").unwrap();

    let record = FileRecordProvider::new(&path)
        .fetch_sample_record("tenant-1")
        .await
        .unwrap();
    assert_eq!(record.text("class_id").as_deref(), Some("S.1"));

    std::fs::write(&path, "name,class_id\n").unwrap();
    assert!(
        FileRecordProvider::new(&path)
            .fetch_sample_record("tenant-1")
            .await
            .is_err()
    );
}

// =============================================================================
// Audit
// =============================================================================

#[test]
fn test_memory_audit_keeps_latest_entries() {
    let sink = MemoryAuditSink::new(2);
    for n in 0..3 {
        sink.log_event(&format!("event.{n}"), json!({ "n": n })).unwrap();
    }

    let entries = sink.get_entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "event.1");
    assert_eq!(sink.latest_action().as_deref(), Some("event.2"));
    assert!(entries[0].timestamp <= entries[1].timestamp);

    sink.clear();
    assert!(sink.get_entries().is_empty());
}

#[test]
fn test_log_audit_never_fails() {
    assert!(LogAuditSink.log_event("template.saved", json!({})).is_ok());
}
