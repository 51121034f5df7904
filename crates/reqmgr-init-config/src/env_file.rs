// crates/reqmgr-init-config/src/env_file.rs
// ============================================================================
// Module: Dotenv File Loader
// Description: Reads a dotenv file into an in-memory environment.
// Purpose: Let operators supply settings from a file without mutating the
//          process environment.
// Dependencies: dotenvy, reqmgr-init-core
// ============================================================================

//! ## Overview
//! The loaded file never overrides the process environment: callers layer the
//! process environment over the returned [`MapEnv`].

use std::path::Path;

use reqmgr_init_core::MapEnv;
use thiserror::Error;

/// Dotenv file loading errors.
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// The file could not be opened.
    #[error("cannot read environment file {path}: {message}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// A line could not be parsed.
    #[error("invalid environment file {path}: {message}")]
    Parse {
        /// File that failed.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

/// Loads `path` as a dotenv file.
///
/// # Errors
///
/// Returns [`EnvFileError`] when the file is unreadable or malformed.
pub fn load_env_file(path: &Path) -> Result<MapEnv, EnvFileError> {
    let display = path.display().to_string();
    let entries = dotenvy::from_path_iter(path)
        .map_err(|err| EnvFileError::Io { path: display.clone(), message: err.to_string() })?;
    let mut env = MapEnv::new();
    for entry in entries {
        let (key, value) = entry
            .map_err(|err| EnvFileError::Parse { path: display.clone(), message: err.to_string() })?;
        env.insert(key, value);
    }
    Ok(env)
}
