use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use schematic::ConfigLoader;
use tracing::{debug, info, trace};

use crate::{AppConfig, error::Result};

/// Name of the configuration file looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "va.toml";

/// Path to the user-wide configuration file, if a home directory exists.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "va").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the configuration.
///
/// Files are layered in order: the user-wide file, `va.toml` in the working
/// directory, then `file` if given. The first two are optional, an explicit
/// `file` must exist. Environment variables are applied last.
pub fn load(file: Option<&Path>) -> Result<AppConfig> {
    let mut loader = ConfigLoader::<AppConfig>::new();

    if let Some(path) = user_config_file() {
        trace!(path = %path.display(), "Trying user configuration file.");
        loader.file_optional(path)?;
    }

    loader.file_optional(PathBuf::from(LOCAL_CONFIG_FILE))?;

    if let Some(path) = file {
        info!(path = %path.display(), "Using configuration file.");
        loader.file(path.to_path_buf())?;
    }

    let config = loader.load()?.config;
    debug!(model = %config.model, endpoint = %config.endpoint, "Loaded configuration.");

    Ok(config)
}

/// Load the configuration from a TOML string, on top of the defaults and
/// environment variables.
pub fn load_from_str(toml: &str) -> Result<AppConfig> {
    let mut loader = ConfigLoader::<AppConfig>::new();
    loader.code(toml, LOCAL_CONFIG_FILE)?;

    Ok(loader.load()?.config)
}
