use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::data::{Hotspot, Project, ProjectMap};
use super::hotspots::HotspotStore;
use crate::config::ViewerSettings;
use crate::error::{Error, HierarchyError, Result};
use crate::notice::Notice;
use crate::scene::{compile, to_viewer_config, SceneGraph, ViewerConfig};
use crate::storage::{LocalStore, Persistence, ProjectStore, SaveOutcome};

/// Everything the editor submits when creating or updating a project.
/// Images are already-compressed data URIs (or URLs).
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub title: String,
    /// Name of the project being edited; `None` when creating
    pub editing: Option<String>,
    /// New root panorama; required when creating
    pub image: Option<String>,
    /// New logo; keeps the existing one when `None`
    pub logo: Option<String>,
    pub hotspots: Vec<Hotspot>,
}

/// One row of the project overview
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub title: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub hotspot_count: usize,
}

/// The ProjectLibrary manages the project map.
/// It validates edits, keeps projects in memory and writes the whole
/// map through `Persistence` after every change.
#[derive(Debug)]
pub struct ProjectLibrary<P = crate::storage::BlobStore, F = LocalStore> {
    projects: ProjectMap,
    persistence: Persistence<P, F>,
    viewer: ViewerSettings,
}

impl<P: ProjectStore, F: ProjectStore> ProjectLibrary<P, F> {
    /// Load all projects from persistence
    pub fn open(persistence: Persistence<P, F>, viewer: ViewerSettings) -> Self {
        let projects = persistence.load();
        info!(count = projects.len(), "📁 project library ready");

        ProjectLibrary {
            projects,
            persistence,
            viewer,
        }
    }

    pub fn projects(&self) -> &ProjectMap {
        &self.projects
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence<P, F> {
        &mut self.persistence
    }

    /// Overview of all projects, ordered by name
    pub fn summaries(&self) -> Vec<ProjectSummary> {
        self.projects
            .iter()
            .map(|(name, project)| ProjectSummary {
                name: name.clone(),
                title: project.title.clone(),
                image: project.image.clone(),
                created_at: project.created_at,
                hotspot_count: project.hotspots.len(),
            })
            .collect()
    }

    /// Create or update a project.
    ///
    /// Validation failures abort before anything changes. Once the
    /// project map is updated, a storage failure is reported as a notice
    /// rather than an error: the edit is kept in memory.
    pub fn save_project(&mut self, form: ProjectForm) -> Result<Notice> {
        let name = form.name.trim().to_string();
        let title = form.title.trim().to_string();

        if name.is_empty() {
            return Err(Error::Validation("Enter a project name.".to_string()));
        }
        if title.is_empty() {
            return Err(Error::Validation("Enter a title.".to_string()));
        }

        let existing = match form.editing.as_deref() {
            Some(editing) => Some(
                self.projects
                    .get(editing)
                    .ok_or_else(|| Error::NotFound(format!("project '{}'", editing)))?,
            ),
            None => None,
        };

        if form.editing.as_deref() != Some(name.as_str()) && self.projects.contains_key(&name) {
            return Err(Error::Validation(format!(
                "A project named '{}' already exists.",
                name
            )));
        }

        let image = match (form.image.filter(|i| !i.is_empty()), existing) {
            (Some(image), _) => image,
            (None, Some(project)) => project.image.clone(),
            (None, None) => {
                return Err(Error::Validation("Select a 360° image.".to_string()));
            }
        };

        validate_hotspots(&form.hotspots)?;

        let project = Project {
            title,
            image,
            logo: form.logo.or_else(|| existing.and_then(|p| p.logo.clone())),
            created_at: existing.map_or_else(Utc::now, |p| p.created_at),
            hotspots: form.hotspots,
            password: existing.and_then(|p| p.password.clone()),
        };

        let updating = form.editing.is_some();
        if let Some(old_name) = form.editing.filter(|old| *old != name) {
            self.projects.remove(&old_name);
            info!(from = %old_name, to = %name, "project renamed");
        }

        info!(
            project = %name,
            hotspots = project.hotspots.len(),
            linked = project.linked_count(),
            "saving project"
        );
        self.projects.insert(name, project);

        Ok(self.persist().unwrap_or_else(|| {
            Notice::success(if updating {
                "Project updated!"
            } else {
                "Project created!"
            })
        }))
    }

    /// Delete a project and all of its hotspots
    pub fn delete(&mut self, name: &str) -> Result<Notice> {
        if self.projects.remove(name).is_none() {
            return Err(Error::NotFound(format!("project '{}'", name)));
        }

        info!(project = name, "project deleted");
        Ok(self
            .persist()
            .unwrap_or_else(|| Notice::success("Project deleted.")))
    }

    /// Compile a project's scene graph
    pub fn compile(&self, name: &str) -> Result<SceneGraph> {
        let project = self
            .projects
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("project '{}'", name)))?;

        Ok(compile(&project.image, &project.hotspots))
    }

    /// Viewer configuration for previewing a project
    pub fn preview_project(&self, name: &str) -> Result<ViewerConfig> {
        let graph = self.compile(name)?;
        Ok(to_viewer_config(&graph, &self.viewer))
    }

    pub fn viewer_settings(&self) -> &ViewerSettings {
        &self.viewer
    }

    /// Write the project map. Returns a notice only when nothing could be
    /// saved at all.
    fn persist(&mut self) -> Option<Notice> {
        match self.persistence.save(&self.projects) {
            Ok(SaveOutcome::Primary) => None,
            Ok(SaveOutcome::Fallback) => {
                warn!("projects only saved to the local store");
                None
            }
            Err(e) => {
                warn!(error = %e, "projects could not be saved");
                Some(Notice::danger("Error saving project."))
            }
        }
    }
}

/// Duplicate ids and cycles are rejected; orphans left by hotspot
/// removal are allowed.
fn validate_hotspots(hotspots: &[Hotspot]) -> Result<()> {
    let store = HotspotStore::from_vec(hotspots.to_vec());

    match store
        .validate()
        .into_iter()
        .find(|e| !matches!(e, HierarchyError::UnknownParent(_)))
    {
        Some(problem) => Err(Error::Validation(problem.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BlobStore;

    fn library() -> ProjectLibrary<BlobStore, LocalStore> {
        ProjectLibrary::open(Persistence::in_memory(1 << 20).unwrap(), ViewerSettings::default())
    }

    fn form(name: &str) -> ProjectForm {
        ProjectForm {
            name: name.to_string(),
            title: "Beach House".to_string(),
            image: Some("root.jpg".to_string()),
            ..ProjectForm::default()
        }
    }

    #[test]
    fn test_starts_with_demo_project() {
        let library = library();
        assert!(library.contains("demo-project"));
        assert_eq!(library.summaries()[0].hotspot_count, 0);
    }

    #[test]
    fn test_create_requires_name_title_and_image() {
        let mut library = library();

        let mut missing_image = form("beach");
        missing_image.image = None;

        for bad in [form("  "), ProjectForm { title: String::new(), ..form("beach") }, missing_image] {
            let err = library.save_project(bad).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(!library.contains("beach"));
    }

    #[test]
    fn test_edit_keeps_image_logo_and_created_at() {
        let mut library = library();
        let mut create = form("beach");
        create.logo = Some("logo.jpg".to_string());
        library.save_project(create).unwrap();
        let created_at = library.get("beach").unwrap().created_at;

        let notice = library
            .save_project(ProjectForm {
                name: "beach-house".to_string(),
                title: "Beach House II".to_string(),
                editing: Some("beach".to_string()),
                ..ProjectForm::default()
            })
            .unwrap();

        assert_eq!(notice, Notice::success("Project updated!"));
        assert!(!library.contains("beach"));
        let project = library.get("beach-house").unwrap();
        assert_eq!(project.title, "Beach House II");
        assert_eq!(project.image, "root.jpg");
        assert_eq!(project.logo.as_deref(), Some("logo.jpg"));
        assert_eq!(project.created_at, created_at);
    }

    #[test]
    fn test_name_must_be_unique() {
        let mut library = library();
        library.save_project(form("beach")).unwrap();

        let err = library.save_project(form("beach")).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rejects_cyclic_hotspots() {
        let mut library = library();
        let mut store = HotspotStore::new();
        let a = store.add(0.0, 0.0, None).unwrap().id.clone();
        let b = store.add(0.0, 0.0, Some(a.as_str())).unwrap().id.clone();
        let mut hotspots = store.into_vec();
        hotspots[0].parent_id = Some(b);

        let err = library
            .save_project(ProjectForm { hotspots, ..form("loop") })
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_deleted_project_cannot_be_previewed() {
        let mut library = library();
        library.save_project(form("demo")).unwrap();
        assert!(library.preview_project("demo").is_ok());

        library.delete("demo").unwrap();

        assert!(!library.contains("demo"));
        assert!(matches!(library.preview_project("demo"), Err(Error::NotFound(_))));
        assert!(matches!(library.delete("demo"), Err(Error::NotFound(_))));
    }
}
