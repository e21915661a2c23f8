
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub github_link: String,
}

/// Project listing appended to chat answers about projects
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectCatalog {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl ProjectCatalog {
    /// Load `{"projects": [...]}` from disk; any failure yields an empty catalog
    #[inline]
    pub fn load(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str::<Self>(&content).map_err(Into::into));

        match parsed {
            Ok(catalog) => {
                debug!(
                    "Loaded {} projects from {}",
                    catalog.projects.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                warn!("Error loading projects from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Whether a question asks about projects
    #[inline]
    pub fn is_relevant(question: &str) -> bool {
        question.to_lowercase().contains("project")
    }

    /// Context with a `Project Information:` section appended
    #[inline]
    pub fn append_to_context(&self, context: &str) -> String {
        let mut extended = format!("{}\n\nProject Information:\n", context);
        for project in &self.projects {
            let _ = writeln!(
                extended,
                "{}: {} GitHub: {}",
                project.name, project.description, project.github_link
            );
        }
        extended
    }
}
