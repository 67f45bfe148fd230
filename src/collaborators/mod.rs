//! Service contracts for external collaborators.
//!
//! Version-control and ALM (issue tracker) adapters register factories in
//! the [`PluginRegistry`](crate::plugins::PluginRegistry). Strategies never
//! keep a handle across calls: they open a session, use it and let it drop,
//! which releases the handle on every exit path.

mod git;

pub use git::{register, SystemGit, GIT_ADAPTER};

use crate::error::Result;
use crate::model::{Commit, Delivery};
use std::path::Path;
use std::sync::Arc;

/// Description of a tag in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    /// Object id of the tag itself
    pub hash: String,
    /// Commit the tag points to
    pub target: String,
    /// `annotated` or `lightweight`
    pub kind: String,
}

/// Version-control utility.
pub trait VersionControl: Send {
    /// Adapter name used in diagnostics
    fn name(&self) -> &str;

    /// Bind the handle to a working-tree path
    fn initialize(&mut self, path: &Path) -> Result<()>;

    /// Commits reachable from HEAD but not from `since`, newest first.
    /// `None` lists the whole history of the path.
    fn commits_since(&self, since: Option<&str>) -> Result<Vec<Commit>>;

    /// Whether HEAD points at the commit the tag resolves to
    fn is_head_synced(&self, tag: &str) -> Result<bool>;

    /// Tag marking `delivery` for a component, if one exists
    fn former_tag(&self, component: &str, delivery: &Delivery) -> Result<Option<String>>;

    /// `branch@shorthash` style summary of the checked-out state
    fn branch_summary(&self) -> Result<String>;

    /// Details of a tag
    fn tag_summary(&self, tag: &str) -> Result<TagInfo>;

    /// Release any resources held by the handle
    fn release(&mut self) {}
}

/// ALM (issue tracker) utility.
pub trait AlmService: Send {
    /// Adapter name used in diagnostics
    fn name(&self) -> &str;

    /// Whether the tracker knows the item
    fn item_exists(&self, id: &str) -> Result<bool>;

    /// Workflow status of an item
    fn item_status(&self, id: &str) -> Result<Option<String>>;

    /// Drop items unknown to the tracker and order the rest.
    ///
    /// The default keeps the incoming order and drops items without a
    /// tracker id or whose id does not exist.
    fn filter_and_sort(&self, items: Vec<Commit>) -> Result<Vec<Commit>> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            let known = match item.alm_id.as_deref() {
                Some(id) => self.item_exists(id)?,
                None => false,
            };
            if known {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Release any resources held by the handle
    fn release(&mut self) {}
}

/// Creates version-control handles.
pub type VcsFactory = Arc<dyn Fn() -> Box<dyn VersionControl> + Send + Sync>;

/// Creates ALM handles.
pub type AlmFactory = Arc<dyn Fn() -> Box<dyn AlmService> + Send + Sync>;

/// A version-control handle scoped to one computation.
pub struct VcsSession {
    handle: Box<dyn VersionControl>,
}

impl VcsSession {
    /// Acquire a handle and bind it to `path`.
    ///
    /// If initialization fails the handle is released before returning.
    pub fn open(factory: &VcsFactory, path: &Path) -> Result<Self> {
        let mut session = Self { handle: factory() };
        session.handle.initialize(path)?;
        tracing::debug!(adapter = session.handle.name(), path = %path.display(), "VCS session opened");
        Ok(session)
    }
}

impl std::ops::Deref for VcsSession {
    type Target = dyn VersionControl;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl Drop for VcsSession {
    fn drop(&mut self) {
        self.handle.release();
        tracing::debug!(adapter = self.handle.name(), "VCS session released");
    }
}

/// An ALM handle scoped to one call.
pub struct AlmSession {
    handle: Box<dyn AlmService>,
}

impl AlmSession {
    #[must_use]
    pub fn open(factory: &AlmFactory) -> Self {
        Self { handle: factory() }
    }
}

impl std::ops::Deref for AlmSession {
    type Target = dyn AlmService;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl Drop for AlmSession {
    fn drop(&mut self) {
        self.handle.release();
    }
}
