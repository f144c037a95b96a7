//! Implementation of the `init` command.
//!
//! This module creates the `.taskdeps/` directory with a configuration file
//! and an empty, migrated SQLite database.

use crate::config::{GraphConfig, DEFAULT_DATABASE_PATH};
use crate::engine::StrategyPreference;
use crate::error::{Error, Result};
use crate::storage::SqliteGraphStore;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the project directory
pub const TASKDEPS_DIR_NAME: &str = ".taskdeps";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the gitignore file within .taskdeps
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the project root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created .taskdeps directory
    pub taskdeps_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created database
    pub database_file: PathBuf,
    /// Traversal strategy written to the config
    pub strategy: StrategyPreference,
}

/// Initialize a new project in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.taskdeps/` directory already exists
/// - File system operations fail
/// - The database cannot be created
pub async fn init(base_dir: &Path, strategy: StrategyPreference) -> Result<InitResult> {
    let taskdeps_dir = base_dir.join(TASKDEPS_DIR_NAME);

    if taskdeps_dir.exists() {
        return Err(Error::Validation(format!(
            "taskdeps is already initialized in this directory. Found existing '{TASKDEPS_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&taskdeps_dir).await?;

    let config_file = taskdeps_dir.join(CONFIG_FILE_NAME);
    let config = GraphConfig {
        strategy,
        ..GraphConfig::default()
    };
    config.save(&config_file).await?;

    let database_file = base_dir.join(DEFAULT_DATABASE_PATH);
    SqliteGraphStore::open(&database_file)?;

    let gitignore_content = "\
# SQLite database and its WAL sidecars
tasks.db
tasks.db-wal
tasks.db-shm
";
    fs::write(taskdeps_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    tracing::info!(dir = %taskdeps_dir.display(), "Initialized taskdeps project");

    Ok(InitResult {
        taskdeps_dir,
        config_file,
        database_file,
        strategy,
    })
}

/// Check if a directory has been initialized.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(TASKDEPS_DIR_NAME).exists()
}

/// Find the project root by searching up the directory tree.
///
/// Returns the directory containing `.taskdeps/`, or `None` if none is
/// found before the filesystem root or the depth limit.
pub fn find_taskdeps_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(TASKDEPS_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
