/// Viewer adapter
///
/// Translates a compiled `SceneGraph` into the multi-scene configuration
/// consumed by the external panorama viewer, and defines the narrow
/// trait through which that viewer is driven.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use super::compiler::{SceneGraph, SceneLink, MAIN_SCENE};
use crate::config::ViewerSettings;
use crate::notice::Notice;

/// Heading every scene opens at
pub const DEFAULT_HEADING: f64 = 0.0;

/// Back links sit directly behind the default heading
pub const BACK_YAW_OFFSET: f64 = 180.0;

/// Back links sit slightly below the horizon
pub const BACK_PITCH: f64 = -10.0;

pub const BACK_CSS_CLASS: &str = "hotspot-back";

/// Top-level viewer configuration
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub default: ViewerDefaults,
    pub scenes: BTreeMap<String, SceneConfig>,
}

/// Options applied to every scene
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerDefaults {
    pub first_scene: String,
    pub auto_load: bool,
    pub auto_rotate: f64,
    pub compass: bool,
    pub show_zoom_ctrl: bool,
    pub show_fullscreen_ctrl: bool,
    /// Initial heading; the visitor's previous orientation is never restored
    pub yaw: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    #[serde(rename = "type")]
    pub projection: &'static str,
    pub panorama: String,
    pub hot_spots: Vec<HotSpotConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotSpotConfig {
    pub id: String,
    pub pitch: f64,
    pub yaw: f64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    pub scene_id: String,
    pub css_class: String,
}

impl ViewerConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the viewer configuration for a compiled graph
pub fn to_viewer_config(graph: &SceneGraph, settings: &ViewerSettings) -> ViewerConfig {
    let scenes = graph
        .iter()
        .map(|scene| {
            let hot_spots = scene
                .links
                .iter()
                .map(|link| hot_spot(&scene.id, link, settings))
                .collect();

            let config = SceneConfig {
                projection: "equirectangular",
                panorama: scene.panorama.clone(),
                hot_spots,
                yaw: scene.is_main().then_some(DEFAULT_HEADING),
            };
            (scene.id.clone(), config)
        })
        .collect();

    ViewerConfig {
        default: ViewerDefaults {
            first_scene: MAIN_SCENE.to_string(),
            auto_load: settings.auto_load,
            auto_rotate: settings.auto_rotate,
            compass: settings.compass,
            show_zoom_ctrl: settings.show_zoom_ctrl,
            show_fullscreen_ctrl: settings.show_fullscreen_ctrl,
            yaw: DEFAULT_HEADING,
        },
        scenes,
    }
}

fn hot_spot(scene_id: &str, link: &SceneLink, settings: &ViewerSettings) -> HotSpotConfig {
    match link {
        SceneLink::Back { target } => HotSpotConfig {
            id: format!("back_{scene_id}"),
            pitch: BACK_PITCH,
            yaw: DEFAULT_HEADING + BACK_YAW_OFFSET,
            kind: "scene",
            text: settings.back_label.clone(),
            scene_id: target.clone(),
            css_class: BACK_CSS_CLASS.to_string(),
        },
        SceneLink::Child {
            hotspot_id,
            target,
            pitch,
            yaw,
            text,
            style,
        } => HotSpotConfig {
            id: hotspot_id.clone(),
            pitch: *pitch,
            yaw: *yaw,
            kind: "scene",
            text: text.clone(),
            scene_id: target.clone(),
            css_class: style.css_class().to_string(),
        },
    }
}

/// Failure reported by the external viewer
#[derive(Error, Debug)]
#[error("viewer failed: {0}")]
pub struct ViewerError(pub String);

/// Events emitted by the external viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The visitor followed a link into another scene
    SceneChange(String),
    /// The first scene finished loading
    Load,
}

/// The external panorama viewer
pub trait PanoramaViewer {
    /// Tear down any previous tour and show this one
    fn load(&mut self, config: &ViewerConfig) -> Result<(), ViewerError>;
}

/// Hand a configuration to the viewer. A viewer failure never propagates;
/// it comes back as a notice for the user.
pub fn mount(viewer: &mut dyn PanoramaViewer, config: &ViewerConfig) -> Option<Notice> {
    match viewer.load(config) {
        Ok(()) => {
            info!(scenes = config.scenes.len(), "tour loaded into viewer");
            None
        }
        Err(e) => {
            warn!(error = %e, "viewer initialization failed");
            Some(Notice::danger("Could not load the panorama."))
        }
    }
}
