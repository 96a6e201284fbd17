/// Scene graph module
///
/// This module derives everything the visitor navigates:
/// - Compiling hotspots into scenes and links (compiler.rs)
/// - Translating scenes into the viewer's configuration (viewer.rs)

pub mod compiler;
pub mod viewer;

pub use compiler::{compile, SceneDescriptor, SceneGraph, SceneLink, MAIN_SCENE};
pub use viewer::{to_viewer_config, PanoramaViewer, ViewerConfig, ViewerEvent};
