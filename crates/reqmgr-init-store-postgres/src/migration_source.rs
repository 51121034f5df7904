// crates/reqmgr-init-store-postgres/src/migration_source.rs
// ============================================================================
// Module: Directory Migration Source
// Description: Loads numbered SQL migrations from a directory.
// Purpose: Turn a migrations directory into an ordered, validated list.
// Dependencies: reqmgr-init-core
// ============================================================================

//! ## Overview
//! Files are named `<version>_<name>.up.sql` or `<version>_<name>.down.sql`.
//! A `.gitkeep` placeholder is ignored; any other entry is rejected so a
//! stray file never silently changes what gets applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use reqmgr_init_core::Migration;
use reqmgr_init_core::MigrationSource;
use reqmgr_init_core::MigrationSourceError;

/// Placeholder file allowed in an otherwise empty directory.
const PLACEHOLDER_FILE: &str = ".gitkeep";
/// Suffix of forward scripts.
const UP_SUFFIX: &str = ".up.sql";
/// Suffix of reverse scripts.
const DOWN_SUFFIX: &str = ".down.sql";

// ============================================================================
// SECTION: File Names
// ============================================================================

/// Direction of a migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward script.
    Up,
    /// Reverse script.
    Down,
}

impl Direction {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Parsed migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFileName {
    /// Version prefix.
    pub version: u64,
    /// Descriptive name.
    pub name: String,
    /// Script direction.
    pub direction: Direction,
}

/// Parses a migration file name; `Ok(None)` for the placeholder file.
///
/// # Errors
///
/// Returns [`MigrationSourceError`] when the name does not follow the scheme
/// or the version is not an unsigned integer.
pub fn parse_file_name(file_name: &str) -> Result<Option<MigrationFileName>, MigrationSourceError> {
    if file_name == PLACEHOLDER_FILE {
        return Ok(None);
    }
    let (stem, direction) = if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
        (stem, Direction::Up)
    } else if let Some(stem) = file_name.strip_suffix(DOWN_SUFFIX) {
        (stem, Direction::Down)
    } else {
        return Err(MigrationSourceError::UnrecognizedFile(file_name.to_string()));
    };
    let Some((version, name)) = stem.split_once('_') else {
        return Err(MigrationSourceError::UnrecognizedFile(file_name.to_string()));
    };
    if version.is_empty() || !version.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(MigrationSourceError::InvalidVersion(file_name.to_string()));
    }
    let version = version
        .parse::<u64>()
        .map_err(|_| MigrationSourceError::InvalidVersion(file_name.to_string()))?;
    Ok(Some(MigrationFileName { version, name: name.to_string(), direction }))
}

// ============================================================================
// SECTION: Directory Source
// ============================================================================

/// Migration source reading a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryMigrationSource {
    /// Directory holding the migration files.
    dir: PathBuf,
}

impl DirectoryMigrationSource {
    /// Creates a source over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory read by this source.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps an I/O failure to a source error.
    fn io_error(path: &Path, err: &std::io::Error) -> MigrationSourceError {
        MigrationSourceError::Io { path: path.display().to_string(), message: err.to_string() }
    }
}

/// Scripts collected for one version.
#[derive(Default)]
struct PendingMigration {
    /// Descriptive name from the first file seen.
    name: String,
    /// Forward script.
    up: Option<String>,
    /// Reverse script.
    down: Option<String>,
}

impl MigrationSource for DirectoryMigrationSource {
    fn load(&self) -> Result<Vec<Migration>, MigrationSourceError> {
        let entries = fs::read_dir(&self.dir).map_err(|err| Self::io_error(&self.dir, &err))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Self::io_error(&self.dir, &err))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().map_err(|err| Self::io_error(&entry.path(), &err))?.is_file();
            if !is_file {
                return Err(MigrationSourceError::UnrecognizedFile(file_name));
            }
            files.push((file_name, entry.path()));
        }
        files.sort();

        let mut pending: BTreeMap<u64, PendingMigration> = BTreeMap::new();
        for (file_name, path) in files {
            let Some(parsed) = parse_file_name(&file_name)? else {
                continue;
            };
            let sql = fs::read_to_string(&path).map_err(|err| Self::io_error(&path, &err))?;
            let slot = pending.entry(parsed.version).or_default();
            if slot.name.is_empty() {
                slot.name = parsed.name;
            }
            let target = match parsed.direction {
                Direction::Up => &mut slot.up,
                Direction::Down => &mut slot.down,
            };
            if target.is_some() {
                return Err(MigrationSourceError::DuplicateVersion {
                    version: parsed.version,
                    direction: parsed.direction.as_str(),
                });
            }
            *target = Some(sql);
        }

        if pending.is_empty() {
            return Err(MigrationSourceError::Empty(self.location()));
        }
        pending
            .into_iter()
            .map(|(version, scripts)| match scripts.up {
                Some(up) => Ok(Migration { version, name: scripts.name, up, down: scripts.down }),
                None => Err(MigrationSourceError::MissingUp(version)),
            })
            .collect()
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
