use chrono::{DateTime, Local};
use design_lab::AuditSink;
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: DateTime<Local>,
    pub action: String,
    pub context: Value,
}

/// Keeps the most recent audit events in memory
#[derive(Debug, Clone)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    max_entries: usize,
}

impl MemoryAuditSink {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            max_entries,
        }
    }

    pub fn get_entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn latest_action(&self) -> Option<String> {
        self.entries
            .lock()
            .ok()?
            .last()
            .map(|entry| entry.action.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn log_event(&self, action: &str, context: Value) -> Result<(), String> {
        let entry = AuditEntry {
            timestamp: Local::now(),
            action: action.to_string(),
            context,
        };

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| "audit log lock poisoned".to_string())?;
        entries.push(entry);

        // Keep only the most recent entries
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(0..excess);
        }
        Ok(())
    }
}

/// Writes audit events to the `audit` log target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn log_event(&self, action: &str, context: Value) -> Result<(), String> {
        log::info!(target: "audit", "{} {}", action, context);
        Ok(())
    }
}
