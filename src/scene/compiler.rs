/// Scene graph compilation
///
/// Turns the flat, user-edited hotspot list into navigable scenes. The
/// graph is a pure function of its input and is rebuilt on every publish;
/// nothing here is ever persisted.

use std::collections::{BTreeMap, HashMap};

use crate::state::data::{Hotspot, HotspotKind, Variant};

/// Scene id of the main panorama
pub const MAIN_SCENE: &str = "main";

/// Scene id derived from the hotspot that leads into it
pub fn scene_id(hotspot_id: &str) -> String {
    format!("scene_{hotspot_id}")
}

/// Hotspot id a scene id was derived from, `None` for the main scene
pub fn hotspot_id(scene_id: &str) -> Option<&str> {
    scene_id.strip_prefix("scene_")
}

/// Marker style of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    DoorPrimary,
    DoorAlternate,
    NormalPrimary,
    NormalAlternate,
}

impl LinkStyle {
    pub fn from_hotspot(kind: HotspotKind, variant: Variant) -> Self {
        match (kind, variant) {
            (HotspotKind::Door, Variant::Primary) => LinkStyle::DoorPrimary,
            (HotspotKind::Door, Variant::Alternate) => LinkStyle::DoorAlternate,
            (HotspotKind::Normal, Variant::Primary) => LinkStyle::NormalPrimary,
            (HotspotKind::Normal, Variant::Alternate) => LinkStyle::NormalAlternate,
        }
    }

    /// CSS class understood by the viewer's stylesheet
    pub fn css_class(self) -> &'static str {
        match self {
            LinkStyle::DoorPrimary => "hotspot-door porta-1",
            LinkStyle::DoorAlternate => "hotspot-door porta-2",
            LinkStyle::NormalPrimary => "hotspot-nav normal-1",
            LinkStyle::NormalAlternate => "hotspot-nav normal-2",
        }
    }
}

/// Outbound link of a scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneLink {
    /// Synthetic link to the parent scene
    Back { target: String },
    /// Link placed by a hotspot
    Child {
        hotspot_id: String,
        target: String,
        pitch: f64,
        yaw: f64,
        text: String,
        style: LinkStyle,
    },
}

impl SceneLink {
    fn child(hotspot: &Hotspot) -> Self {
        SceneLink::Child {
            hotspot_id: hotspot.id.clone(),
            target: scene_id(&hotspot.id),
            pitch: hotspot.pitch,
            yaw: hotspot.yaw,
            text: hotspot.text.clone(),
            style: LinkStyle::from_hotspot(hotspot.kind, hotspot.variant),
        }
    }

    /// Scene this link leads to
    pub fn target(&self) -> &str {
        match self {
            SceneLink::Back { target } | SceneLink::Child { target, .. } => target,
        }
    }

    pub fn is_back(&self) -> bool {
        matches!(self, SceneLink::Back { .. })
    }
}

/// One navigable panorama
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub id: String,
    pub panorama: String,
    /// Hotspot the scene is entered through; `None` for the main scene
    pub entered_from: Option<String>,
    /// Back link first (except on the main scene), then children in order
    pub links: Vec<SceneLink>,
}

impl SceneDescriptor {
    pub fn is_main(&self) -> bool {
        self.id == MAIN_SCENE
    }

    /// Target of the back link, `None` on the main scene
    pub fn parent_scene(&self) -> Option<&str> {
        self.links.iter().find(|l| l.is_back()).map(SceneLink::target)
    }

    /// Child links without the back link
    pub fn child_links(&self) -> impl Iterator<Item = &SceneLink> {
        self.links.iter().filter(|l| !l.is_back())
    }
}

/// Compiled scenes keyed by scene id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneGraph {
    scenes: BTreeMap<String, SceneDescriptor>,
}

impl SceneGraph {
    pub fn get(&self, scene_id: &str) -> Option<&SceneDescriptor> {
        self.scenes.get(scene_id)
    }

    /// The main scene. Always present in a compiled graph.
    pub fn main(&self) -> Option<&SceneDescriptor> {
        self.scenes.get(MAIN_SCENE)
    }

    pub fn contains(&self, scene_id: &str) -> bool {
        self.scenes.contains_key(scene_id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneDescriptor> {
        self.scenes.values()
    }
}

/// Build the scene graph for a root panorama and its hotspots.
///
/// Draft hotspots contribute neither a scene nor a link. Linked hotspots
/// are indexed by parent once, so each scene's children are a lookup.
pub fn compile(root_image: &str, hotspots: &[Hotspot]) -> SceneGraph {
    let linked: Vec<&Hotspot> = hotspots.iter().filter(|h| !h.is_draft()).collect();

    let mut by_parent: HashMap<Option<&str>, Vec<&Hotspot>> = HashMap::new();
    for &hotspot in &linked {
        by_parent
            .entry(hotspot.parent_id.as_deref())
            .or_default()
            .push(hotspot);
    }

    let mut scenes = BTreeMap::new();

    scenes.insert(
        MAIN_SCENE.to_string(),
        SceneDescriptor {
            id: MAIN_SCENE.to_string(),
            panorama: root_image.to_string(),
            entered_from: None,
            links: links_under(&by_parent, None),
        },
    );

    for &hotspot in &linked {
        let id = scene_id(&hotspot.id);
        // Orphans keep pointing at their parent's scene id
        let back = SceneLink::Back {
            target: hotspot
                .parent_id
                .as_deref()
                .map_or_else(|| MAIN_SCENE.to_string(), scene_id),
        };

        let mut links = vec![back];
        links.extend(links_under(&by_parent, Some(hotspot.id.as_str())));

        scenes.insert(
            id.clone(),
            SceneDescriptor {
                id,
                panorama: hotspot.target().unwrap_or_default().to_string(),
                entered_from: Some(hotspot.id.clone()),
                links,
            },
        );
    }

    SceneGraph { scenes }
}

fn links_under<'h>(
    by_parent: &HashMap<Option<&'h str>, Vec<&'h Hotspot>>,
    parent: Option<&'h str>,
) -> Vec<SceneLink> {
    by_parent
        .get(&parent)
        .map(|children| children.iter().map(|h| SceneLink::child(h)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(id: &str, parent: Option<&str>, target: Option<&str>) -> Hotspot {
        Hotspot {
            id: id.into(),
            pitch: -5.0,
            yaw: 90.0,
            text: id.to_uppercase(),
            target_image: target.map(str::to_string),
            parent_id: parent.map(str::to_string),
            kind: HotspotKind::Normal,
            variant: Variant::Primary,
            unlock_order: 0,
        }
    }

    fn sample() -> Vec<Hotspot> {
        vec![
            hotspot("a", None, Some("a.jpg")),
            hotspot("b", Some("a"), Some("b.jpg")),
            hotspot("draft", None, None),
            hotspot("c", None, Some("c.jpg")),
            hotspot("d", Some("a"), Some("d.jpg")),
            hotspot("e", Some("a"), Some("")),
        ]
    }

    fn targets(scene: &SceneDescriptor) -> Vec<&str> {
        scene.links.iter().map(SceneLink::target).collect()
    }

    #[test]
    fn test_compile_is_idempotent() {
        let hotspots = sample();
        assert_eq!(compile("root.jpg", &hotspots), compile("root.jpg", &hotspots));
    }

    #[test]
    fn test_main_scene_lists_root_links_in_order() {
        let graph = compile("root.jpg", &sample());
        let main = graph.main().unwrap();

        assert_eq!(main.panorama, "root.jpg");
        assert_eq!(main.entered_from, None);
        assert_eq!(main.parent_scene(), None);
        assert_eq!(targets(main), vec!["scene_a", "scene_c"]);
    }

    #[test]
    fn test_drafts_are_excluded() {
        let graph = compile("root.jpg", &sample());

        assert!(!graph.contains("scene_draft"));
        assert!(!graph.contains("scene_e"));
        assert_eq!(graph.len(), 5);
        for scene in graph.iter() {
            assert!(scene.links.iter().all(|l| l.target() != "scene_draft"));
            assert!(scene.links.iter().all(|l| l.target() != "scene_e"));
        }
    }

    #[test]
    fn test_back_link_comes_first() {
        let graph = compile("root.jpg", &sample());

        let a = graph.get("scene_a").unwrap();
        assert_eq!(a.panorama, "a.jpg");
        assert_eq!(a.entered_from.as_deref(), Some("a"));
        assert_eq!(targets(a), vec!["main", "scene_b", "scene_d"]);
        assert!(a.links[0].is_back());

        let b = graph.get("scene_b").unwrap();
        assert_eq!(targets(b), vec!["scene_a"]);
        assert_eq!(b.parent_scene(), Some("scene_a"));
    }

    #[test]
    fn test_orphans_are_unreachable_but_compiled() {
        let hotspots = vec![
            hotspot("lost", Some("deleted"), Some("lost.jpg")),
            hotspot("under_draft", Some("draft"), Some("u.jpg")),
            hotspot("draft", None, None),
        ];

        let graph = compile("root.jpg", &hotspots);

        assert_eq!(targets(graph.get("scene_lost").unwrap()), vec!["scene_deleted"]);
        assert_eq!(targets(graph.get("scene_under_draft").unwrap()), vec!["scene_draft"]);
        assert!(!graph.contains("scene_deleted"));
        assert!(graph.main().unwrap().links.is_empty());
    }

    #[test]
    fn test_link_style_from_type_and_variant() {
        let mut hotspots = sample();
        hotspots[0].kind = HotspotKind::Door;
        hotspots[3].variant = Variant::Alternate;

        let graph = compile("root.jpg", &hotspots);
        let styles: Vec<_> = graph
            .main()
            .unwrap()
            .child_links()
            .map(|l| match l {
                SceneLink::Child { style, .. } => style.css_class(),
                SceneLink::Back { .. } => unreachable!(),
            })
            .collect();

        assert_eq!(styles, vec!["hotspot-door porta-1", "hotspot-nav normal-2"]);
    }

    #[test]
    fn test_empty_project_has_only_main() {
        let graph = compile("root.jpg", &[]);

        assert_eq!(graph.scene_ids().collect::<Vec<_>>(), vec![MAIN_SCENE]);
        assert!(graph.main().unwrap().links.is_empty());
    }

    #[test]
    fn test_scene_id_round_trip() {
        assert_eq!(hotspot_id(&scene_id("hotspot_1")), Some("hotspot_1"));
        assert_eq!(hotspot_id(MAIN_SCENE), None);
    }
}
