/// Error types for the tour engine
///
/// Not-found conditions on hotspot edits are not errors:
/// the store reports them as a `false` return so stale UI state is
/// silently ignored.

use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite blob store error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (projects, progress, viewer config)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested project or scene does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid user input; the operation was aborted
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Edit would break the hotspot forest
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Both the primary and the fallback store failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Local store would exceed its size limit
    #[error("Local store quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

/// Structural violations of the hotspot forest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("parent hotspot '{0}' does not exist")]
    UnknownParent(String),

    #[error("hotspot '{0}' does not exist")]
    UnknownHotspot(String),

    #[error("making '{parent}' the parent of '{id}' would create a cycle")]
    Cycle { id: String, parent: String },

    #[error("hotspot '{0}' has no target image yet")]
    Draft(String),

    #[error("hotspot '{0}' is not placed on the current panorama")]
    NotOnCurrentPanorama(String),

    #[error("duplicate hotspot id '{0}'")]
    DuplicateId(String),
}
