//! Core of a 360° virtual tour builder.
//!
//! Projects are root panoramas with hotspots nested under each other.
//! Editors place and link hotspots (`editor`), the library validates and
//! persists projects (`state::library`, `storage`), the scene compiler
//! turns the hotspot tree into viewer scenes (`scene`) and visitors walk
//! through them with progressive unlocking (`tour`).

pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod media;
pub mod notice;
pub mod scene;
pub mod slug;
pub mod state;
pub mod storage;
pub mod tour;

pub use config::Config;
pub use editor::ProjectEditor;
pub use error::{Error, HierarchyError, Result};
pub use notice::{Notice, NoticeLevel};
pub use state::data::{Hotspot, HotspotKind, Project, ProjectMap, Variant};
pub use state::library::{ProjectForm, ProjectLibrary};
pub use storage::Persistence;
pub use tour::TourSession;
