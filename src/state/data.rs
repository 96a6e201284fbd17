/// Shared data structures for the tour state
///
/// These structs represent the persisted data model that flows between
/// the storage layer, the editor and the scene compiler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All projects, keyed by their unique project name
pub type ProjectMap = BTreeMap<String, Project>;

/// Hotspot marker style
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HotspotKind {
    #[default]
    Normal,
    Door,
}

/// Cosmetic sub-style of a hotspot marker
///
/// Older project files stored the marker image name instead, so those
/// tokens are accepted on load.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    #[serde(alias = "normal 1.png", alias = "porta 1.png")]
    Primary,
    #[serde(alias = "normal 2.png", alias = "porta 2.png")]
    Alternate,
}

impl Variant {
    /// The other variant
    pub fn toggled(self) -> Self {
        match self {
            Variant::Primary => Variant::Alternate,
            Variant::Alternate => Variant::Primary,
        }
    }
}

/// A placement on a panorama
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Opaque unique token
    pub id: String,
    /// Vertical angle in degrees, [-90, 90]
    pub pitch: f64,
    /// Horizontal angle in degrees, [0, 360)
    pub yaw: f64,
    /// Display label
    pub text: String,
    /// Child panorama; `None` or empty means draft
    #[serde(default)]
    pub target_image: Option<String>,
    /// Parent hotspot; `None` means root level
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: HotspotKind,
    #[serde(default, alias = "typeImage")]
    pub variant: Variant,
    /// Insertion sequence
    #[serde(default, alias = "unlock_order")]
    pub unlock_order: usize,
}

impl Hotspot {
    /// A hotspot without a target panorama is a draft and never compiled
    pub fn is_draft(&self) -> bool {
        self.target_image.as_deref().map_or(true, str::is_empty)
    }

    /// The target panorama, if this hotspot is linked
    pub fn target(&self) -> Option<&str> {
        self.target_image.as_deref().filter(|t| !t.is_empty())
    }

    /// Whether this hotspot sits on the main panorama
    pub fn is_root_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A named tour
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    /// Root panorama
    pub image: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Project {
    /// Number of hotspots that already link to a panorama
    pub fn linked_count(&self) -> usize {
        self.hotspots.iter().filter(|h| !h.is_draft()).count()
    }
}

/// Wrap a yaw angle into [0, 360)
pub fn normalize_yaw(yaw: f64) -> f64 {
    let wrapped = yaw.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Clamp a pitch angle into [-90, 90]
pub fn clamp_pitch(pitch: f64) -> f64 {
    pitch.clamp(-90.0, 90.0)
}
