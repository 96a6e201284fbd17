/// Persistence module
///
/// This module handles where projects live between sessions:
/// - SQLite blob store, the primary and unbounded store (blob.rs)
/// - Size-limited key/value file, the fallback and home of small
///   client-local state (local.rs)
///
/// Writes go to the primary store first. A failed write is not retried;
/// it falls back to the local store, and only when that also fails does
/// the caller get an error to show to the user.

pub mod blob;
pub mod local;

pub use blob::BlobStore;
pub use local::LocalStore;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::data::{Project, ProjectMap};

/// Key under which the project map is stored
pub const PROJECTS_KEY: &str = "pano_tour_projects";

/// A place the whole project map can be loaded from and saved to
pub trait ProjectStore {
    /// `Ok(None)` means nothing has been saved yet
    fn load(&self) -> Result<Option<ProjectMap>>;
    fn save(&mut self, projects: &ProjectMap) -> Result<()>;
}

/// Which store accepted a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary,
    Fallback,
}

/// Primary store with a fallback
#[derive(Debug)]
pub struct Persistence<P = BlobStore, F = LocalStore> {
    primary: Option<P>,
    fallback: F,
}

impl Persistence<BlobStore, LocalStore> {
    /// Open both stores in the configured data directory. An unavailable
    /// blob store is tolerated; an unavailable local store degrades to an
    /// in-memory one.
    pub fn open(config: &Config) -> Self {
        let primary = BlobStore::open(&config.database_path())
            .map_err(|e| warn!(error = %e, "blob store unavailable, using local store only"))
            .ok();

        let fallback = LocalStore::open(&config.local_store_path(), config.local_store_quota_bytes)
            .unwrap_or_else(|e| {
                warn!(error = %e, "local store unavailable, progress will not survive restarts");
                LocalStore::in_memory(config.local_store_quota_bytes)
            });

        Self::new(primary, fallback)
    }

    /// Purely in-memory stores
    pub fn in_memory(quota: usize) -> Result<Self> {
        Ok(Self::new(Some(BlobStore::open_in_memory()?), LocalStore::in_memory(quota)))
    }
}

impl<P: ProjectStore, F: ProjectStore> Persistence<P, F> {
    pub fn new(primary: Option<P>, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// The fallback store doubles as the client-local key/value store
    pub fn fallback_mut(&mut self) -> &mut F {
        &mut self.fallback
    }

    /// Load the project map. Never fails: unreadable stores degrade to
    /// the next source and finally to the default projects.
    pub fn load(&self) -> ProjectMap {
        if let Some(primary) = &self.primary {
            match primary.load() {
                Ok(Some(projects)) => {
                    info!(count = projects.len(), "projects loaded from blob store");
                    return projects;
                }
                Ok(None) => info!("blob store is empty, checking local store"),
                Err(e) => error!(error = %e, "failed to read blob store, using local store"),
            }
        }

        match self.fallback.load() {
            Ok(Some(projects)) => {
                info!(count = projects.len(), "projects loaded from local store");
                projects
            }
            Ok(None) => {
                info!("no saved projects, using defaults");
                default_projects()
            }
            Err(e) => {
                error!(error = %e, "failed to read local store, using defaults");
                default_projects()
            }
        }
    }

    /// Save the project map to the primary store, falling back once
    pub fn save(&mut self, projects: &ProjectMap) -> Result<SaveOutcome> {
        if let Some(primary) = &mut self.primary {
            match primary.save(projects) {
                Ok(()) => return Ok(SaveOutcome::Primary),
                Err(e) => error!(error = %e, "blob store write failed, using local store"),
            }
        }

        match self.fallback.save(projects) {
            Ok(()) => {
                info!("projects saved to local store (fallback)");
                Ok(SaveOutcome::Fallback)
            }
            Err(e) => {
                error!(error = %e, "local store write failed");
                Err(Error::Persistence(e.to_string()))
            }
        }
    }
}

/// Projects seeded on first run
pub fn default_projects() -> ProjectMap {
    ProjectMap::from([(
        "demo-project".to_string(),
        Project {
            title: "Demo Project".to_string(),
            image: "https://pannellum.org/images/alma.jpg".to_string(),
            logo: None,
            created_at: Utc::now(),
            hotspots: Vec::new(),
            password: Some("123456".to_string()),
        },
    )])
}
