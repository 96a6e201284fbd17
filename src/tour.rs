//! Visitor-side tour navigation
//!
//! A `TourSession` follows one visitor through one published project: it
//! tracks the current scene, keeps an explicit back-navigation stack,
//! unlocks hotspots as scenes are entered and builds the navigation menu
//! under the progressive disclosure policy.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::scene::compiler::{hotspot_id, SceneGraph, SceneLink, MAIN_SCENE};
use crate::scene::viewer::{to_viewer_config, ViewerConfig, ViewerEvent};
use crate::state::library::ProjectLibrary;
use crate::state::progress::{SessionToken, UnlockStatus, UnlockTracker};
use crate::storage::ProjectStore;

/// Upper bound on remembered scenes
pub const MAX_SCENE_HISTORY: usize = 64;

/// Label of the main scene in the navigation menu
pub const MAIN_LABEL: &str = "Main Scene";

/// How a menu entry is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    /// Always reachable (the main scene)
    Open,
    Unlocked,
    NextAvailable,
}

impl From<UnlockStatus> for NavStatus {
    fn from(status: UnlockStatus) -> Self {
        match status {
            UnlockStatus::Unlocked => NavStatus::Unlocked,
            UnlockStatus::NextAvailable => NavStatus::NextAvailable,
        }
    }
}

/// One entry of the navigation menu
#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub scene_id: String,
    pub label: String,
    pub active: bool,
    pub status: NavStatus,
}

/// One visitor walking through one project
#[derive(Debug, Clone)]
pub struct TourSession {
    project: String,
    session: SessionToken,
    graph: SceneGraph,
    current: String,
    history: Vec<String>,
}

impl TourSession {
    /// Compile a project and start at its main scene
    pub fn open<P: ProjectStore, F: ProjectStore>(
        library: &ProjectLibrary<P, F>,
        project: &str,
        session: SessionToken,
    ) -> Result<(Self, ViewerConfig)> {
        let graph = library.compile(project)?;
        let config = to_viewer_config(&graph, library.viewer_settings());

        info!(project, scenes = graph.len(), "tour opened");
        let tour = TourSession {
            project: project.to_string(),
            session,
            graph,
            current: MAIN_SCENE.to_string(),
            history: Vec::new(),
        };
        Ok((tour, config))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn current_scene(&self) -> &str {
        &self.current
    }

    /// Scenes that can be returned to with `go_back`
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// React to the viewer. Scene changes come from the visitor clicking a
    /// link inside the panorama, so they are never gated.
    pub fn handle_event(&mut self, event: &ViewerEvent, tracker: &mut UnlockTracker) {
        match event {
            ViewerEvent::SceneChange(scene_id) => {
                if *scene_id != self.current && self.graph.contains(scene_id) {
                    self.push_history();
                    self.enter(scene_id, tracker);
                }
            }
            ViewerEvent::Load => debug!(project = %self.project, "viewer loaded"),
        }
    }

    /// Navigate from the menu. Locked scenes are refused.
    pub fn go_to(&mut self, scene_id: &str, tracker: &mut UnlockTracker) -> Result<()> {
        if !self.graph.contains(scene_id) {
            return Err(Error::NotFound(format!("scene '{}'", scene_id)));
        }
        if scene_id == self.current {
            return Ok(());
        }
        if !self.is_reachable(scene_id, tracker) {
            return Err(Error::Validation(
                "Scene locked. Explore other points first.".to_string(),
            ));
        }

        self.push_history();
        self.enter(scene_id, tracker);
        Ok(())
    }

    /// Return to the previously visited scene. A scene that no longer
    /// exists sends the visitor to the main scene.
    pub fn go_back(&mut self) -> Option<&str> {
        let previous = self.history.pop()?;
        self.current = if self.graph.contains(&previous) {
            previous
        } else {
            MAIN_SCENE.to_string()
        };
        Some(self.current.as_str())
    }

    /// Main scene first, then the root-level scenes the visitor may see
    pub fn navigation(&self, tracker: &UnlockTracker) -> Vec<NavEntry> {
        let mut entries = vec![NavEntry {
            scene_id: MAIN_SCENE.to_string(),
            label: MAIN_LABEL.to_string(),
            active: self.current == MAIN_SCENE,
            status: NavStatus::Open,
        }];

        let Some(main) = self.graph.main() else {
            return entries;
        };

        let links: Vec<(&str, &str, &str)> = main
            .child_links()
            .filter_map(|link| match link {
                SceneLink::Child {
                    hotspot_id,
                    target,
                    text,
                    ..
                } => Some((hotspot_id.as_str(), target.as_str(), text.as_str())),
                SceneLink::Back { .. } => None,
            })
            .collect();
        let ids: Vec<&str> = links.iter().map(|(id, _, _)| *id).collect();

        for (id, status) in tracker.visible_children(&self.session, &self.project, &ids) {
            if let Some((_, target, text)) = links.iter().find(|(link_id, _, _)| *link_id == id) {
                entries.push(NavEntry {
                    scene_id: target.to_string(),
                    label: text.to_string(),
                    active: self.current == *target,
                    status: status.into(),
                });
            }
        }

        entries
    }

    /// Main, already unlocked, or offered by the menu
    fn is_reachable(&self, scene_id: &str, tracker: &UnlockTracker) -> bool {
        if scene_id == MAIN_SCENE {
            return true;
        }
        let unlocked = hotspot_id(scene_id)
            .is_some_and(|id| tracker.is_unlocked(&self.session, &self.project, id));

        unlocked
            || self
                .navigation(tracker)
                .iter()
                .any(|entry| entry.scene_id == scene_id)
    }

    fn push_history(&mut self) {
        if self.history.len() == MAX_SCENE_HISTORY {
            self.history.remove(0);
        }
        self.history.push(self.current.clone());
    }

    fn enter(&mut self, scene_id: &str, tracker: &mut UnlockTracker) {
        self.current = scene_id.to_string();
        if let Some(id) = self.graph.get(scene_id).and_then(|s| s.entered_from.as_deref()) {
            tracker.unlock(&self.session, &self.project, id);
        }
        debug!(project = %self.project, scene = scene_id, "scene entered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerSettings;
    use crate::state::data::{Hotspot, HotspotKind, Project, Variant};
    use crate::state::library::ProjectForm;
    use crate::storage::{BlobStore, LocalStore, Persistence};

    fn hotspot(id: &str, parent: Option<&str>) -> Hotspot {
        Hotspot {
            id: id.into(),
            pitch: 0.0,
            yaw: 0.0,
            text: format!("Room {id}"),
            target_image: Some(format!("{id}.jpg")),
            parent_id: parent.map(str::to_string),
            kind: HotspotKind::Normal,
            variant: Variant::Primary,
            unlock_order: 0,
        }
    }

    fn library() -> ProjectLibrary<BlobStore, LocalStore> {
        let mut library =
            ProjectLibrary::open(Persistence::in_memory(1 << 20).unwrap(), ViewerSettings::default());
        library
            .save_project(ProjectForm {
                name: "house".into(),
                title: "House".into(),
                image: Some("root.jpg".into()),
                hotspots: vec![
                    hotspot("c1", None),
                    hotspot("c2", None),
                    hotspot("c3", None),
                    hotspot("k", Some("c1")),
                ],
                ..ProjectForm::default()
            })
            .unwrap();
        library
    }

    fn open() -> (TourSession, UnlockTracker) {
        let (tour, config) = TourSession::open(&library(), "house", "session_t".into()).unwrap();
        assert_eq!(config.default.first_scene, MAIN_SCENE);
        (tour, UnlockTracker::new())
    }

    fn menu(tour: &TourSession, tracker: &UnlockTracker) -> Vec<(String, NavStatus, bool)> {
        tour.navigation(tracker)
            .into_iter()
            .map(|e| (e.scene_id, e.status, e.active))
            .collect()
    }

    #[test]
    fn test_fresh_visitor_sees_first_room_only() {
        let (tour, tracker) = open();

        assert_eq!(
            menu(&tour, &tracker),
            vec![
                ("main".to_string(), NavStatus::Open, true),
                ("scene_c1".to_string(), NavStatus::NextAvailable, false),
            ]
        );
    }

    #[test]
    fn test_entering_a_scene_unlocks_it() {
        let (mut tour, mut tracker) = open();

        tour.handle_event(&ViewerEvent::SceneChange("scene_c1".into()), &mut tracker);

        assert!(tracker.is_unlocked(tour.session(), "house", "c1"));
        assert_eq!(
            menu(&tour, &tracker),
            vec![
                ("main".to_string(), NavStatus::Open, false),
                ("scene_c1".to_string(), NavStatus::Unlocked, true),
                ("scene_c2".to_string(), NavStatus::NextAvailable, false),
            ]
        );
    }

    #[test]
    fn test_locked_scene_is_refused() {
        let (mut tour, mut tracker) = open();

        let err = tour.go_to("scene_c3", &mut tracker).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(tour.current_scene(), MAIN_SCENE);

        assert!(matches!(tour.go_to("scene_nope", &mut tracker), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_history_goes_back_in_order() {
        let (mut tour, mut tracker) = open();

        tour.go_to("scene_c1", &mut tracker).unwrap();
        tour.handle_event(&ViewerEvent::SceneChange("scene_k".into()), &mut tracker);
        assert_eq!(tour.history(), ["main".to_string(), "scene_c1".to_string()]);

        assert_eq!(tour.go_back(), Some("scene_c1"));
        assert_eq!(tour.go_back(), Some("main"));
        assert_eq!(tour.go_back(), None);
    }

    #[test]
    fn test_visited_scene_stays_reachable() {
        let (mut tour, mut tracker) = open();
        assert!(tour.go_to("scene_k", &mut tracker).is_err());

        tour.go_to("scene_c1", &mut tracker).unwrap();
        tour.handle_event(&ViewerEvent::SceneChange("scene_k".into()), &mut tracker);
        tour.go_to(MAIN_SCENE, &mut tracker).unwrap();

        tour.go_to("scene_k", &mut tracker).unwrap();
        assert_eq!(tour.current_scene(), "scene_k");
    }

    #[test]
    fn test_missing_project_fails_gracefully() {
        let result = TourSession::open(&library(), "gone", "session_t".into());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_project_without_hotspots_has_main_only() {
        let mut library = library();
        library
            .save_project(ProjectForm {
                name: "empty".into(),
                title: "Empty".into(),
                image: Some("root.jpg".into()),
                ..ProjectForm::default()
            })
            .unwrap();
        let project: &Project = library.get("empty").unwrap();
        assert!(project.hotspots.is_empty());

        let (tour, config) = TourSession::open(&library, "empty", "s".into()).unwrap();

        assert_eq!(config.scenes.len(), 1);
        assert_eq!(tour.navigation(&UnlockTracker::new()).len(), 1);
    }
}
