//! CLI command handlers.
//!
//! Handlers are invoked by `main.rs` and return `anyhow::Result`; each one
//! loads the project file, performs a single operation and saves it back.

mod compute;
mod export;
mod project;

pub use compute::run_compute;
pub use export::run_export;
pub use project::{
    run_assign, run_component_add, run_delivery_add, run_delivery_list, run_delivery_remove,
    run_init, run_plugins,
};

use crate::plugins::PluginRegistry;
use crate::project::Project;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default project file name
pub const PROJECT_FILE: &str = "delivery-project.xml";

/// Location of a project file and the directory strategies run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub project_file: PathBuf,
    pub project_root: PathBuf,
}

impl ProjectPaths {
    /// Paths for `project_file`; the project root defaults to its directory
    pub fn new(project_file: impl Into<PathBuf>, project_root: Option<PathBuf>) -> Self {
        let project_file = project_file.into();
        let project_root = project_root.unwrap_or_else(|| {
            project_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        Self {
            project_file,
            project_root,
        }
    }

    pub fn load(&self, registry: &PluginRegistry) -> Result<Project> {
        Project::load(&self.project_file, registry).with_context(|| {
            format!(
                "failed to open project {} (run `delivery-docs init` first?)",
                self.project_file.display()
            )
        })
    }

    pub fn save(&self, project: &Project) -> Result<()> {
        project
            .save(&self.project_file)
            .with_context(|| format!("failed to save {}", self.project_file.display()))
    }
}
