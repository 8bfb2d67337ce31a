//! Engine configuration
//!
//! Settings are plain data and can be loaded from camelCase JSON:
//!
//! ```
//! use tdf_engine::EngineSettings;
//!
//! let settings = EngineSettings::from_json(r#"{"segmentSize":65536,"segmentHash":"GMAC"}"#)?;
//! assert_eq!(settings.segment_size, 65536);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use tdf_engine_protocol::SegmentHashAlgorithm;
use thiserror::Error;

/// Default plaintext segment size (2 MiB)
pub const DEFAULT_SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Largest accepted plaintext segment size (64 MiB)
pub const MAX_SEGMENT_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No recipient key configured")]
    MissingRecipient,

    #[error("No policy binding key configured")]
    MissingBindingKey,

    #[error("No key authority configured")]
    MissingAuthority,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Algorithm and layout choices recorded in every container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Plaintext bytes per segment
    pub segment_size: usize,
    pub segment_hash: SegmentHashAlgorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Key authority location recorded in the key access object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_url: Option<String>,
    /// Recipient key identifier recorded in the key access object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            segment_hash: SegmentHashAlgorithm::Hs256,
            mime_type: None,
            key_url: None,
            key_id: None,
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_size == 0 {
            return Err(ConfigError::InvalidSettings(
                "segmentSize must be greater than zero".to_string(),
            ));
        }
        if self.segment_size > MAX_SEGMENT_SIZE {
            return Err(ConfigError::InvalidSettings(format!(
                "segmentSize {} exceeds maximum {}",
                self.segment_size, MAX_SEGMENT_SIZE
            )));
        }
        if let Some(url) = &self.key_url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidSettings(
                    "keyUrl must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
