/// State management module
///
/// This module handles all project and visitor state:
/// - Shared data structures (data.rs)
/// - Partial hotspot edits (edit.rs)
/// - The editable hotspot list and its hierarchy rules (hotspots.rs)
/// - The editor's position in the hotspot tree (navigator.rs)
/// - The project library and its validation (library.rs)
/// - Per-session unlock progress (progress.rs)
/// - Light/dark theme preference (theme.rs)

pub mod data;
pub mod edit;
pub mod hotspots;
pub mod library;
pub mod navigator;
pub mod progress;
pub mod theme;
