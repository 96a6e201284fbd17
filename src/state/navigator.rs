use tracing::debug;

use super::data::Hotspot;
use super::hotspots::HotspotStore;
use crate::error::{HierarchyError, Result};

/// Upper bound on remembered descend steps
pub const MAX_HISTORY: usize = 64;

/// All hotspots whose parent is `parent_id`, in insertion order
pub fn children_of<'a>(
    hotspots: &'a [Hotspot],
    parent_id: Option<&'a str>,
) -> impl Iterator<Item = &'a Hotspot> + 'a {
    hotspots
        .iter()
        .filter(move |h| h.parent_id.as_deref() == parent_id)
}

/// Linked hotspots from `start` up to the root, deepest first, cut below
/// any draft level. Empty when the chain is broken by a missing hotspot or
/// a cycle.
fn reachable_chain<'s>(store: &'s HotspotStore, start: &str) -> Vec<&'s str> {
    let mut reachable = Vec::new();
    let mut next = Some(start);

    for _ in 0..=store.len() {
        let Some(id) = next else {
            return reachable;
        };
        let Some(hotspot) = store.get(id) else {
            return Vec::new();
        };
        if hotspot.is_draft() {
            reachable.clear();
        } else {
            reachable.push(hotspot.id.as_str());
        }
        next = hotspot.parent_id.as_deref();
    }

    // A parent chain longer than the store is a cycle
    if next.is_some() {
        reachable.clear();
    }
    reachable
}

/// Editor cursor over the hotspot hierarchy.
///
/// `current_parent` is the hotspot whose panorama is being edited, or
/// `None` while editing the main panorama. New hotspots are placed under
/// the cursor.
#[derive(Debug, Clone, Default)]
pub struct HierarchyNavigator {
    current_parent: Option<String>,
    history: Vec<Option<String>>,
}

impl HierarchyNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_parent(&self) -> Option<&str> {
        self.current_parent.as_deref()
    }

    pub fn is_at_root(&self) -> bool {
        self.current_parent.is_none()
    }

    /// Depth of the descend history
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Hotspots editable at the cursor
    pub fn visible<'a>(&'a self, store: &'a HotspotStore) -> Vec<&'a Hotspot> {
        children_of(store.hotspots(), self.current_parent.as_deref()).collect()
    }

    /// Enter a linked hotspot placed on the current panorama
    pub fn descend_into(&mut self, store: &HotspotStore, hotspot_id: &str) -> Result<()> {
        let hotspot = store
            .get(hotspot_id)
            .ok_or_else(|| HierarchyError::UnknownHotspot(hotspot_id.to_string()))?;

        if hotspot.parent_id != self.current_parent {
            return Err(HierarchyError::NotOnCurrentPanorama(hotspot_id.to_string()).into());
        }
        if hotspot.is_draft() {
            return Err(HierarchyError::Draft(hotspot_id.to_string()).into());
        }

        if self.history.len() == MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(self.current_parent.take());
        self.current_parent = Some(hotspot.id.clone());
        Ok(())
    }

    /// Return to the panorama containing the cursor hotspot.
    ///
    /// The destination is always the cursor hotspot's own parent; the
    /// history only mirrors it. If the cursor hotspot or its parent was
    /// deleted the cursor falls back to the root.
    pub fn ascend_to_parent(&mut self, store: &HotspotStore) -> Option<&str> {
        let Some(current) = self.current_parent.take() else {
            self.history.clear();
            return None;
        };

        self.history.pop();
        self.current_parent = store
            .get(&current)
            .and_then(|h| h.parent_id.as_deref())
            .filter(|parent| store.contains(parent))
            .map(str::to_string);
        if self.current_parent.is_none() {
            self.history.clear();
        } else {
            self.repair(store);
        }
        self.current_parent.as_deref()
    }

    /// Move the cursor to the deepest level that can still be reached from
    /// the root through linked hotspots. A deleted cursor hotspot falls
    /// back to the nearest surviving level in the history. Returns `true`
    /// if the cursor moved.
    ///
    /// Called after edits that may delete or unlink a level at or above
    /// the cursor.
    pub fn repair(&mut self, store: &HotspotStore) -> bool {
        let reachable = match self.current_parent.as_deref() {
            None => return false,
            Some(id) if store.contains(id) => reachable_chain(store, id),
            Some(_) => self
                .history
                .iter()
                .rev()
                .find_map(|level| match level.as_deref() {
                    None => Some(Vec::new()),
                    Some(id) if store.contains(id) => Some(reachable_chain(store, id)),
                    Some(_) => None,
                })
                .unwrap_or_default(),
        };

        let target = reachable.first().map(|id| id.to_string());
        if target == self.current_parent {
            return false;
        }

        // Rebuild the history as the levels above the new cursor
        let mut history: Vec<Option<String>> = Vec::with_capacity(reachable.len());
        if target.is_some() {
            history.push(None);
            history.extend(reachable.iter().skip(1).rev().map(|id| Some(id.to_string())));
        }
        let overflow = history.len().saturating_sub(MAX_HISTORY);
        history.drain(..overflow);

        debug!(from = ?self.current_parent, to = ?target, "editor cursor repaired");
        self.history = history;
        self.current_parent = target;
        true
    }

    /// Hotspot chain from the root down to the cursor
    pub fn ancestors<'a>(&self, store: &'a HotspotStore) -> Vec<&'a Hotspot> {
        let mut chain = Vec::new();
        let mut current = self.current_parent.as_deref().and_then(|id| store.get(id));

        while let Some(hotspot) = current {
            if chain.len() > store.len() {
                break;
            }
            chain.push(hotspot);
            current = hotspot.parent_id.as_deref().and_then(|id| store.get(id));
        }

        chain.reverse();
        chain
    }

    /// Panorama shown at the cursor
    pub fn current_panorama<'a>(&self, store: &'a HotspotStore, root_image: &'a str) -> &'a str {
        self.current_parent
            .as_deref()
            .and_then(|id| store.get(id))
            .and_then(Hotspot::target)
            .unwrap_or(root_image)
    }

    /// Jump back to the main panorama
    pub fn reset(&mut self) {
        self.current_parent = None;
        self.history.clear();
    }
}
