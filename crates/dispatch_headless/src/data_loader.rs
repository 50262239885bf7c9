//! Loading engine data and scripts from disk.

use std::path::Path;

use dispatch_core::config::EngineConfig;
use dispatch_core::error::DispatchError;
use dispatch_core::replay::Replay;
use thiserror::Error;

/// Default location of the shipped engine data, relative to the workspace.
pub const DEFAULT_CONFIG_PATH: &str = "assets/data/engine.ron";

/// Error type for loading files.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),
    /// File was read but its contents were rejected.
    #[error(transparent)]
    Invalid(#[from] DispatchError),
}

fn read(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Load and validate an engine configuration from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, LoadError> {
    let path = path.as_ref();
    let text = read(path)?;
    Ok(EngineConfig::from_ron_str(&text, &path.display().to_string())?)
}

/// Load the configuration at `path`, or the built-in data when `None`.
pub fn load_config_or_default(path: Option<&Path>) -> Result<EngineConfig, LoadError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            tracing::info!(path = %path.display(), "Loaded engine config");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Load a replay or hand-written script from a RON file.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Replay, LoadError> {
    let path = path.as_ref();
    let text = read(path)?;
    let replay = Replay::from_ron_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        commands = replay.command_count(),
        "Loaded script"
    );
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_config("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }

    #[test]
    fn test_default_when_no_path() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
