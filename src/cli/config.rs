// FILE: src/cli/config.rs

use crate::error::{CompilerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Optional settings file; every field can be overridden on the command line
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub import_extension: Option<String>,
    pub debug_mode: Option<bool>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| CompilerError::InvalidConfig {
        message: format!("Config file {}: {}", config_path, e),
    })?;

    parse(config_path, &config_content)
}

fn parse(config_path: &str, content: &str) -> Result<ConfigFile> {
    if config_path.ends_with(".json") {
        serde_json::from_str(content).map_err(|e| CompilerError::InvalidConfig {
            message: format!("Invalid JSON config: {}", e),
        })
    } else if config_path.ends_with(".toml") {
        toml::from_str(content).map_err(|e| CompilerError::InvalidConfig {
            message: format!("Invalid TOML config: {}", e),
        })
    } else {
        Err(CompilerError::InvalidConfig {
            message: "Config file must be .json or .toml format".to_string(),
        })
    }
}
