/// Partial hotspot updates coming from the editor
///
/// A patch lists only the fields the user touched. It is applied by
/// `HotspotStore::update`, which merges every `Some` field and leaves the
/// rest untouched. The id, parent and unlock order are never patchable.

use serde::{Deserialize, Serialize};

use super::data::{clamp_pitch, normalize_yaw, Hotspot, HotspotKind, Variant};

/// Editable hotspot fields
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotspotPatch {
    // ========== Label & Link ==========

    /// New display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// New child panorama
    /// - `Some(String::new())` turns the hotspot back into a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image: Option<String>,

    // ========== Style ==========

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<HotspotKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,

    // ========== Position ==========

    /// Pitch in degrees, clamped into [-90, 90]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,

    /// Yaw in degrees, wrapped into [0, 360)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
}

impl HotspotPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn target_image(mut self, image: impl Into<String>) -> Self {
        self.target_image = Some(image.into());
        self
    }

    pub fn kind(mut self, kind: HotspotKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn position(mut self, pitch: f64, yaw: f64) -> Self {
        self.pitch = Some(pitch);
        self.yaw = Some(yaw);
        self
    }

    /// Parse from JSON string (from the UI layer)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into a hotspot
    pub fn apply_to(&self, hotspot: &mut Hotspot) {
        if let Some(text) = &self.text {
            hotspot.text = text.clone();
        }
        if let Some(target) = &self.target_image {
            hotspot.target_image = if target.is_empty() {
                None
            } else {
                Some(target.clone())
            };
        }
        if let Some(kind) = self.kind {
            hotspot.kind = kind;
        }
        if let Some(variant) = self.variant {
            hotspot.variant = variant;
        }
        if let Some(pitch) = self.pitch {
            hotspot.pitch = clamp_pitch(pitch);
        }
        if let Some(yaw) = self.yaw {
            hotspot.yaw = normalize_yaw(yaw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hotspot {
        Hotspot {
            id: "hotspot_a".into(),
            pitch: 10.0,
            yaw: 45.0,
            text: "Point 1".into(),
            target_image: None,
            parent_id: None,
            kind: HotspotKind::Normal,
            variant: Variant::Primary,
            unlock_order: 0,
        }
    }

    #[test]
    fn test_default_is_empty() {
        assert!(HotspotPatch::default().is_empty());
        assert!(!HotspotPatch::new().text("Hall").is_empty());
    }

    #[test]
    fn test_apply_merges_only_set_fields() {
        let mut hotspot = sample();
        HotspotPatch::new()
            .text("Hall")
            .kind(HotspotKind::Door)
            .apply_to(&mut hotspot);

        assert_eq!(hotspot.text, "Hall");
        assert_eq!(hotspot.kind, HotspotKind::Door);
        assert_eq!(hotspot.pitch, 10.0);
        assert_eq!(hotspot.yaw, 45.0);
        assert_eq!(hotspot.id, "hotspot_a");
    }

    #[test]
    fn test_apply_normalizes_position() {
        let mut hotspot = sample();
        HotspotPatch::new().position(100.0, -30.0).apply_to(&mut hotspot);

        assert_eq!(hotspot.pitch, 90.0);
        assert_eq!(hotspot.yaw, 330.0);
    }

    #[test]
    fn test_empty_target_clears_link() {
        let mut hotspot = sample();
        hotspot.target_image = Some("pano.jpg".into());

        HotspotPatch::new().target_image("").apply_to(&mut hotspot);

        assert!(hotspot.is_draft());
    }

    #[test]
    fn test_from_json() {
        let patch = HotspotPatch::from_json(r#"{"text":"Garden","type":"door","yaw":12.5}"#).unwrap();

        assert_eq!(patch.text.as_deref(), Some("Garden"));
        assert_eq!(patch.kind, Some(HotspotKind::Door));
        assert_eq!(patch.yaw, Some(12.5));
        assert_eq!(patch.pitch, None);
    }
}
