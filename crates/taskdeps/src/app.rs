//! Application context for CLI command execution.
//!
//! [`App`] resolves the project directory, loads the configuration, opens
//! the SQLite store and builds the [`DependencyGraphService`] on top of it.
//!
//! # Example
//!
//! ```no_run
//! use taskdeps::app::{App, AppOptions};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new("."), &AppOptions::default()).await?;
//!     let blocked = !app.service().is_completion_allowed(&"deploy".into()).await?;
//!     println!("deploy blocked: {blocked}");
//!     Ok(())
//! }
//! ```

use crate::cache::MemoryCache;
use crate::commands::init::{find_taskdeps_root, CONFIG_FILE_NAME, TASKDEPS_DIR_NAME};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::service::DependencyGraphService;
use crate::storage::SqliteGraphStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Overrides taken from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Explicit database file
    pub database: Option<PathBuf>,
}

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    store: SqliteGraphStore,
    service: DependencyGraphService,
    config: GraphConfig,
    database: PathBuf,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.taskdeps/` unless both the
    /// database and (optionally) the configuration are given explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No project is found and no `--db` override was given
    /// - Configuration cannot be loaded
    /// - The database cannot be opened
    pub async fn from_directory(working_dir: &Path, options: &AppOptions) -> Result<Self> {
        let root = find_taskdeps_root(working_dir);

        let config = match (&options.config, &root) {
            (Some(path), _) => GraphConfig::load(path).await?,
            (None, Some(root)) => {
                GraphConfig::load(&root.join(TASKDEPS_DIR_NAME).join(CONFIG_FILE_NAME)).await?
            }
            (None, None) if options.database.is_some() => GraphConfig::default(),
            (None, None) => {
                return Err(Error::Validation(
                    "Not a taskdeps project (or any parent directory). Run 'taskdeps init' or pass --db"
                        .to_string(),
                ))
            }
        };

        let database = match (&options.database, &root) {
            (Some(path), _) => path.clone(),
            (None, Some(root)) if config.database.is_relative() => root.join(&config.database),
            (None, _) => config.database.clone(),
        };

        Self::open(config, database).await
    }

    /// Open the store at `database` and build the service from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the configuration
    /// is invalid.
    pub async fn open(config: GraphConfig, database: PathBuf) -> Result<Self> {
        let store = SqliteGraphStore::open(&database)?;
        let service = DependencyGraphService::new(
            Arc::new(store.clone()),
            Arc::new(MemoryCache::new()),
            &config,
        )
        .await?;

        Ok(Self {
            store,
            service,
            config,
            database,
        })
    }

    /// The SQLite store, for task-level operations the graph service does
    /// not own.
    pub fn store(&self) -> &SqliteGraphStore {
        &self.store
    }

    /// The dependency graph service.
    pub fn service(&self) -> &DependencyGraphService {
        &self.service
    }

    /// The loaded configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Path of the open database.
    pub fn database(&self) -> &Path {
        &self.database
    }
}
