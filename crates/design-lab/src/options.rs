use crate::constants::*;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Engine configuration shared by the ingestor, editor and renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Uploads above this many bytes are rejected before parsing
    pub max_source_bytes: usize,
    /// Oversampling factor for raster previews
    pub preview_scale: f32,
    /// How many pages become sides (1 or 2)
    pub max_sides: usize,
    /// Canvas width stamped onto new templates
    pub workspace_width: f32,
    pub placeholder_open: String,
    pub placeholder_close: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_source_bytes: MAX_SOURCE_BYTES,
            preview_scale: PREVIEW_SCALE,
            max_sides: MAX_SIDES,
            workspace_width: WORKSPACE_WIDTH,
            placeholder_open: PLACEHOLDER_OPEN.to_string(),
            placeholder_close: PLACEHOLDER_CLOSE.to_string(),
        }
    }
}

impl EngineOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| DesignError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DesignError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.max_source_bytes == 0 {
            return Err(DesignError::Config(
                "Source size ceiling must be positive".to_string(),
            ));
        }

        if !(self.preview_scale.is_finite() && self.preview_scale > 0.0) {
            return Err(DesignError::Config(format!(
                "Preview scale must be positive, got {}",
                self.preview_scale
            )));
        }

        if !(self.workspace_width.is_finite() && self.workspace_width > 0.0) {
            return Err(DesignError::Config(format!(
                "Workspace width must be positive, got {}",
                self.workspace_width
            )));
        }

        if !(1..=MAX_SIDES).contains(&self.max_sides) {
            return Err(DesignError::Config(format!(
                "A template has 1 or 2 sides, got {}",
                self.max_sides
            )));
        }

        if self.placeholder_open.is_empty() || self.placeholder_close.is_empty() {
            return Err(DesignError::Config(
                "Placeholder delimiters must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn placeholders(&self) -> Placeholders<'_> {
        Placeholders {
            open: &self.placeholder_open,
            close: &self.placeholder_close,
        }
    }
}

/// Delimiters that mark a binding key as a record lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholders<'a> {
    pub open: &'a str,
    pub close: &'a str,
}

impl Default for Placeholders<'static> {
    fn default() -> Self {
        Self {
            open: PLACEHOLDER_OPEN,
            close: PLACEHOLDER_CLOSE,
        }
    }
}

impl Placeholders<'_> {
    /// The bare key inside the delimiters, if `token` is a placeholder
    pub fn key<'t>(&self, token: &'t str) -> Option<&'t str> {
        let inner = token
            .trim()
            .strip_prefix(self.open)?
            .strip_suffix(self.close)?
            .trim();
        if inner.is_empty() { None } else { Some(inner) }
    }

    /// Wrap a field name into a placeholder token
    pub fn wrap(&self, key: &str) -> String {
        format!("{}{}{}", self.open, key, self.close)
    }
}
