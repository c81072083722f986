//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod digitize;
pub mod prompts;

use std::path::{Path, PathBuf};

use invox_core::{InvoxConfig, JsonMasterData, PromptLibrary};

/// Default configuration file location.
pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invox")
        .join("config.json")
}

/// Load configuration from an explicit path, the default location, or
/// built-in defaults.
pub(crate) fn load_config(config_path: Option<&str>) -> anyhow::Result<InvoxConfig> {
    if let Some(path) = config_path {
        return Ok(InvoxConfig::from_file(Path::new(path))?);
    }

    let default = default_config_path();
    if default.exists() {
        return Ok(InvoxConfig::from_file(&default)?);
    }

    Ok(InvoxConfig::default())
}

/// Prompt library: built-ins, optionally extended from a JSON file.
pub(crate) fn load_prompts(path: Option<&Path>) -> anyhow::Result<PromptLibrary> {
    match path {
        Some(path) => Ok(PromptLibrary::from_file(path)?),
        None => Ok(PromptLibrary::builtin()),
    }
}

/// Master data directory; without a file every lookup misses.
pub(crate) fn load_masterdata(path: Option<&Path>) -> anyhow::Result<JsonMasterData> {
    match path {
        Some(path) => Ok(JsonMasterData::from_file(path)?),
        None => Ok(JsonMasterData::empty()),
    }
}
