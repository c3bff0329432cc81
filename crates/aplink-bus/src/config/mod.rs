//! Bus config loader (strict parsing).

pub mod schema;

use std::fs;

use aplink_core::error::{AplinkError, Result};

pub use schema::{AplinkConfig, ChatSection, LoggingSection, RaiseHandSection, TranslationSection};

pub fn load_from_file(path: &str) -> Result<AplinkConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AplinkError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AplinkConfig> {
    let cfg: AplinkConfig = serde_yaml::from_str(s)
        .map_err(|e| AplinkError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
