//! Project editing session
//!
//! Binds the hotspot store and the hierarchy navigator to one project form.
//! The UI layer calls these command methods in response to user actions;
//! uploads go through the image pipeline, everything else is synchronous.

use tracing::{debug, info};

use crate::config::ImageSettings;
use crate::error::{Error, Result};
use crate::media;
use crate::notice::Notice;
use crate::slug::slugify;
use crate::state::data::{Hotspot, HotspotKind};
use crate::state::edit::HotspotPatch;
use crate::state::hotspots::{DeletePolicy, HotspotStore};
use crate::state::library::{ProjectForm, ProjectLibrary};
use crate::state::navigator::HierarchyNavigator;
use crate::storage::ProjectStore;

/// State of the create/edit project form
#[derive(Debug, Clone, Default)]
pub struct ProjectEditor {
    images: ImageSettings,
    /// Name of the project being edited, `None` when creating
    editing: Option<String>,
    /// Root panorama, either newly uploaded or the existing one
    root_image: Option<String>,
    /// Whether `root_image` was uploaded in this session
    root_replaced: bool,
    logo: Option<String>,
    store: HotspotStore,
    navigator: HierarchyNavigator,
}

impl ProjectEditor {
    pub fn new(images: ImageSettings) -> Self {
        Self {
            images,
            ..Self::default()
        }
    }

    /// Start editing an existing project
    pub fn open_existing<P: ProjectStore, F: ProjectStore>(
        &mut self,
        library: &ProjectLibrary<P, F>,
        name: &str,
    ) -> Result<()> {
        let project = library
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("project '{}'", name)))?;

        self.reset();
        self.editing = Some(name.to_string());
        self.root_image = Some(project.image.clone());
        self.store = HotspotStore::from_vec(project.hotspots.clone());

        info!(project = name, hotspots = self.store.len(), "editing project");
        Ok(())
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn store(&self) -> &HotspotStore {
        &self.store
    }

    pub fn navigator(&self) -> &HierarchyNavigator {
        &self.navigator
    }

    /// Upload a new root panorama. Editing restarts at the root.
    pub async fn upload_root_image(&mut self, bytes: Vec<u8>) -> Result<()> {
        let image = media::compress(bytes, self.images.panorama).await?;
        self.root_image = Some(image);
        self.root_replaced = true;
        self.navigator.reset();
        Ok(())
    }

    pub async fn upload_logo(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.logo = Some(media::compress(bytes, self.images.logo).await?);
        Ok(())
    }

    pub fn remove_logo(&mut self) {
        self.logo = None;
    }

    /// Attach a child panorama to a hotspot. Returns `false` if the
    /// hotspot disappeared while the image was being compressed.
    pub async fn upload_hotspot_image(&mut self, id: &str, bytes: Vec<u8>) -> Result<bool> {
        let image = media::compress(bytes, self.images.panorama).await?;
        Ok(self.update_hotspot(id, &HotspotPatch::new().target_image(image)))
    }

    /// Panorama currently being edited
    pub fn current_panorama(&self) -> Option<&str> {
        let root = self.root_image.as_deref()?;
        Some(self.navigator.current_panorama(&self.store, root))
    }

    /// Hotspots placed on the current panorama
    pub fn visible_hotspots(&self) -> Vec<&Hotspot> {
        self.navigator.visible(&self.store)
    }

    /// Place a hotspot on the current panorama
    pub fn add_hotspot(&mut self, pitch: f64, yaw: f64) -> Result<String> {
        if self.root_image.is_none() {
            return Err(Error::Validation("Select a 360° image first.".to_string()));
        }
        let parent = self.navigator.current_parent().map(str::to_string);
        let hotspot = self.store.add(pitch, yaw, parent.as_deref())?;
        Ok(hotspot.id.clone())
    }

    /// Clearing the target of a level the editor is inside moves the
    /// editor out of it.
    pub fn update_hotspot(&mut self, id: &str, patch: &HotspotPatch) -> bool {
        let updated = self.store.update(id, patch);
        self.navigator.repair(&self.store);
        updated
    }

    pub fn change_type(&mut self, id: &str, kind: HotspotKind) -> bool {
        self.store.change_type(id, kind)
    }

    pub fn move_hotspot(&mut self, id: &str, delta_yaw: f64, delta_pitch: f64) -> bool {
        self.store.move_by(id, delta_yaw, delta_pitch)
    }

    pub fn center_hotspot(&mut self, id: &str, pitch: f64, yaw: f64) -> bool {
        self.store.center(id, pitch, yaw)
    }

    /// Removing the level the editor is inside (or one above it) moves
    /// the editor to the deepest level still reachable.
    pub fn remove_hotspot(&mut self, id: &str, policy: DeletePolicy) -> usize {
        let removed = self.store.remove_with(id, policy);
        if self.navigator.repair(&self.store) {
            info!(hotspot = id, "editor moved out of a removed panorama");
        }
        removed
    }

    pub fn remove_all_hotspots(&mut self) {
        self.store.remove_all();
        self.navigator.reset();
    }

    /// Edit the panorama behind a linked hotspot
    pub fn enter(&mut self, id: &str) -> Result<()> {
        self.navigator.descend_into(&self.store, id)?;
        debug!(hotspot = id, "entered hotspot");
        Ok(())
    }

    /// Go back to the panorama containing the current one
    pub fn back(&mut self) {
        self.navigator.ascend_to_parent(&self.store);
    }

    /// Validate and save the form into the library. A blank name is
    /// derived from the title. The editor is reset after a successful save.
    pub fn submit<P: ProjectStore, F: ProjectStore>(
        &mut self,
        library: &mut ProjectLibrary<P, F>,
        name: &str,
        title: &str,
    ) -> Result<Notice> {
        let name = if name.trim().is_empty() {
            slugify(title)
        } else {
            name.to_string()
        };

        let form = ProjectForm {
            name,
            title: title.to_string(),
            editing: self.editing.clone(),
            image: if self.editing.is_none() || self.root_replaced {
                self.root_image.clone()
            } else {
                None
            },
            logo: self.logo.clone(),
            hotspots: self.store.hotspots().to_vec(),
        };

        let notice = library.save_project(form)?;
        self.reset();
        Ok(notice)
    }

    /// Clear the form
    pub fn reset(&mut self) {
        *self = Self::new(self.images.clone());
    }
}
