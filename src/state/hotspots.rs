use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use super::data::{clamp_pitch, normalize_yaw, Hotspot, HotspotKind, Variant};
use super::edit::HotspotPatch;
use crate::error::{HierarchyError, Result};

/// What happens to the descendants of a removed hotspot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Children keep pointing at the removed id
    #[default]
    Orphan,
    /// Every descendant is removed as well
    Cascade,
    /// Direct children move to the main panorama
    ReparentToRoot,
}

/// The HotspotStore owns the hotspots of the project being edited.
///
/// Order matters: it is the insertion order shown in the editor and the
/// order links appear in compiled scenes. Edits addressing an unknown id
/// return `false` instead of failing, since the editor can hold stale ids.
#[derive(Debug, Clone, Default)]
pub struct HotspotStore {
    hotspots: Vec<Hotspot>,
}

impl HotspotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the hotspots of an existing project
    pub fn from_vec(hotspots: Vec<Hotspot>) -> Self {
        Self { hotspots }
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn into_vec(self) -> Vec<Hotspot> {
        self.hotspots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|h| h.id == id)
    }

    /// Place a new draft hotspot
    ///
    /// The label is "Point N" with N = existing count + 1 and the unlock
    /// order is the existing count.
    pub fn add(&mut self, pitch: f64, yaw: f64, parent_id: Option<&str>) -> Result<&Hotspot> {
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(HierarchyError::UnknownParent(parent.to_string()).into());
            }
        }

        let count = self.hotspots.len();
        let hotspot = Hotspot {
            id: self.generate_id(),
            pitch: clamp_pitch(pitch),
            yaw: normalize_yaw(yaw),
            text: format!("Point {}", count + 1),
            target_image: None,
            parent_id: parent_id.map(str::to_string),
            kind: HotspotKind::Normal,
            variant: Variant::Primary,
            unlock_order: count,
        };

        debug!(id = %hotspot.id, parent = ?hotspot.parent_id, "hotspot added");
        self.hotspots.push(hotspot);
        Ok(&self.hotspots[count])
    }

    fn generate_id(&self) -> String {
        loop {
            let id = format!("hotspot_{}", Uuid::new_v4().simple());
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Merge a patch into a hotspot. Returns `false` if the id is unknown.
    pub fn update(&mut self, id: &str, patch: &HotspotPatch) -> bool {
        match self.get_mut(id) {
            Some(hotspot) => {
                patch.apply_to(hotspot);
                true
            }
            None => false,
        }
    }

    /// Remove a hotspot, leaving its children orphaned
    pub fn remove(&mut self, id: &str) -> bool {
        self.remove_with(id, DeletePolicy::Orphan) > 0
    }

    /// Remove a hotspot under an explicit policy for its descendants.
    /// Returns how many hotspots were removed.
    pub fn remove_with(&mut self, id: &str, policy: DeletePolicy) -> usize {
        if !self.contains(id) {
            return 0;
        }

        let doomed: HashSet<String> = match policy {
            DeletePolicy::Cascade => self.subtree_ids(id),
            DeletePolicy::Orphan | DeletePolicy::ReparentToRoot => {
                HashSet::from([id.to_string()])
            }
        };

        if policy == DeletePolicy::ReparentToRoot {
            for hotspot in &mut self.hotspots {
                if hotspot.parent_id.as_deref() == Some(id) {
                    hotspot.parent_id = None;
                }
            }
        }

        let before = self.hotspots.len();
        self.hotspots.retain(|h| !doomed.contains(&h.id));
        let removed = before - self.hotspots.len();

        debug!(id, ?policy, removed, "hotspot removed");
        removed
    }

    /// The id plus the ids of every descendant
    fn subtree_ids(&self, id: &str) -> HashSet<String> {
        let mut ids = HashSet::from([id.to_string()]);
        let mut frontier = vec![id.to_string()];

        while let Some(current) = frontier.pop() {
            for child in self
                .hotspots
                .iter()
                .filter(|h| h.parent_id.as_deref() == Some(current.as_str()))
            {
                if ids.insert(child.id.clone()) {
                    frontier.push(child.id.clone());
                }
            }
        }

        ids
    }

    pub fn remove_all(&mut self) {
        self.hotspots.clear();
    }

    /// Nudge a hotspot. Yaw wraps into [0, 360), pitch clamps into [-90, 90].
    pub fn move_by(&mut self, id: &str, delta_yaw: f64, delta_pitch: f64) -> bool {
        match self.get_mut(id) {
            Some(hotspot) => {
                hotspot.yaw = normalize_yaw(hotspot.yaw + delta_yaw);
                hotspot.pitch = clamp_pitch(hotspot.pitch + delta_pitch);
                true
            }
            None => false,
        }
    }

    /// Snap a hotspot to where the editor is currently looking
    pub fn center(&mut self, id: &str, current_pitch: f64, current_yaw: f64) -> bool {
        match self.get_mut(id) {
            Some(hotspot) => {
                hotspot.pitch = clamp_pitch(current_pitch);
                hotspot.yaw = normalize_yaw(current_yaw);
                true
            }
            None => false,
        }
    }

    /// Switch the marker type. Picking the current type again flips the
    /// variant; picking a new type starts at the primary variant.
    pub fn change_type(&mut self, id: &str, kind: HotspotKind) -> bool {
        match self.get_mut(id) {
            Some(hotspot) => {
                hotspot.variant = if hotspot.kind == kind {
                    hotspot.variant.toggled()
                } else {
                    Variant::Primary
                };
                hotspot.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Move a hotspot under another parent (or to the root with `None`)
    pub fn set_parent(&mut self, id: &str, parent_id: Option<&str>) -> Result<()> {
        if !self.contains(id) {
            return Err(HierarchyError::UnknownHotspot(id.to_string()).into());
        }

        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(HierarchyError::UnknownParent(parent.to_string()).into());
            }
            if self.is_ancestor_or_self(id, parent) {
                return Err(HierarchyError::Cycle {
                    id: id.to_string(),
                    parent: parent.to_string(),
                }
                .into());
            }
        }

        if let Some(hotspot) = self.get_mut(id) {
            hotspot.parent_id = parent_id.map(str::to_string);
        }
        Ok(())
    }

    /// Whether `ancestor` is `id` itself or appears on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: &str, id: &str) -> bool {
        let mut current = Some(id);
        // Bounded walk so malformed loaded data cannot spin forever
        for _ in 0..=self.hotspots.len() {
            match current {
                Some(cur) if cur == ancestor => return true,
                Some(cur) => current = self.get(cur).and_then(|h| h.parent_id.as_deref()),
                None => return false,
            }
        }
        false
    }

    /// Check loaded data for duplicate ids, dangling parents and cycles
    pub fn validate(&self) -> Vec<HierarchyError> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for hotspot in &self.hotspots {
            if !seen.insert(hotspot.id.as_str()) {
                problems.push(HierarchyError::DuplicateId(hotspot.id.clone()));
            }
        }

        for hotspot in &self.hotspots {
            let Some(parent) = hotspot.parent_id.as_deref() else {
                continue;
            };
            if !self.contains(parent) {
                problems.push(HierarchyError::UnknownParent(parent.to_string()));
            } else if self.is_ancestor_or_self(&hotspot.id, parent) {
                problems.push(HierarchyError::Cycle {
                    id: hotspot.id.clone(),
                    parent: parent.to_string(),
                });
            }
        }

        problems
    }
}
