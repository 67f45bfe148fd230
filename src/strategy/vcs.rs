//! Strategies backed by a version-control adapter.

use super::{Arity, AssignmentStrategy, ComputeRequest};
use crate::collaborators::VcsSession;
use crate::error::{DeliveryError, Result};
use crate::model::{Element, BRANCH_TAG, CONTENT_TAG, STRING_TAG, TAG_TAG};
use std::path::PathBuf;

/// Settings key selecting the adapter; the first registered one otherwise.
pub const VCS_SETTING: &str = "vcs";

fn open_session(request: &ComputeRequest<'_>) -> Result<VcsSession> {
    let adapter = match request.settings.value(VCS_SETTING) {
        Some(name) => name,
        None => request
            .registry
            .default_vcs()
            .ok_or_else(|| DeliveryError::not_found("version control adapter", "<default>"))?,
    };
    let factory = request.registry.vcs(adapter)?;
    VcsSession::open(factory, &working_path(request))
}

fn working_path(request: &ComputeRequest<'_>) -> PathBuf {
    match request.parameter(0) {
        "" | "." => request.project_root.to_path_buf(),
        relative => request.project_root.join(relative),
    }
}

/// Commits touching a path since the tag of the former delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct VcsCommitsStrategy;

impl AssignmentStrategy for VcsCommitsStrategy {
    fn name(&self) -> &str {
        "vcs-commits"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &str {
        "<path relative to the project root>"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let session = open_session(request)?;
        let component = request.component.name();

        let since = match request.former {
            Some(former) => {
                let tag = session.former_tag(component, former)?;
                if tag.is_none() {
                    tracing::warn!(
                        component = %request.component.full_name(),
                        former = %former.id(),
                        "No tag found for the former delivery, listing the whole history"
                    );
                }
                tag
            }
            None => None,
        };

        let commits = session.commits_since(since.as_deref())?;
        tracing::debug!(
            component = %request.component.full_name(),
            count = commits.len(),
            "Collected commits"
        );
        let mut content = Element::new(CONTENT_TAG);
        for commit in &commits {
            content.push(commit.to_element());
        }
        Ok(content)
    }
}

/// The tag marking the delivery, or the branch state when untagged.
#[derive(Debug, Default, Clone, Copy)]
pub struct VcsTagStrategy;

impl AssignmentStrategy for VcsTagStrategy {
    fn name(&self) -> &str {
        "vcs-tag"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &str {
        "<path relative to the project root>"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let session = open_session(request)?;
        let mut content = Element::new(CONTENT_TAG);

        match session.former_tag(request.component.name(), request.delivery)? {
            Some(tag) => {
                let info = session.tag_summary(&tag)?;
                let synced = session.is_head_synced(&tag)?;
                content.push(Element::new(STRING_TAG).with_text(&info.name));
                content.push(
                    Element::new(TAG_TAG)
                        .with_attr("name", &info.name)
                        .with_attr("hash", &info.hash)
                        .with_attr("target", &info.target)
                        .with_attr("type", &info.kind)
                        .with_attr("head-synced", synced.to_string()),
                );
            }
            None => {
                let branch = session.branch_summary()?;
                content.push(Element::new(STRING_TAG).with_text(&branch));
                content.push(Element::new(BRANCH_TAG).with_attr("name", branch));
            }
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{TagInfo, VersionControl};
    use crate::config::PluginSettings;
    use crate::model::{Commit, Component, Delivery, DeliveryInformation, InformationKind};
    use crate::plugins::PluginRegistry;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Records the `since` argument and knows one tag, `app-1.0`.
    struct ScriptedVcs {
        since: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl VersionControl for ScriptedVcs {
        fn name(&self) -> &str {
            "scripted"
        }
        fn initialize(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
        fn commits_since(&self, since: Option<&str>) -> Result<Vec<Commit>> {
            self.since.lock().unwrap().push(since.map(str::to_string));
            Ok(vec![Commit::new("c2", "second").with_time(20), Commit::new("c1", "first").with_time(10)])
        }
        fn is_head_synced(&self, _tag: &str) -> Result<bool> {
            Ok(false)
        }
        fn former_tag(&self, component: &str, delivery: &Delivery) -> Result<Option<String>> {
            let tag = format!("{component}-{}", delivery.id());
            Ok((tag == "app-1.0").then_some(tag))
        }
        fn branch_summary(&self) -> Result<String> {
            Ok("main@abc1234".into())
        }
        fn tag_summary(&self, tag: &str) -> Result<TagInfo> {
            Ok(TagInfo {
                name: tag.into(),
                hash: "t0".into(),
                target: "c1".into(),
                kind: "annotated".into(),
            })
        }
    }

    fn registry(since: &Arc<Mutex<Vec<Option<String>>>>) -> PluginRegistry {
        let since = Arc::clone(since);
        let mut builder = PluginRegistry::builder();
        builder.register_builtins();
        builder.register_vcs(
            "scripted",
            Arc::new(move || Box::new(ScriptedVcs { since: Arc::clone(&since) })),
        );
        builder.build()
    }

    fn compute(
        strategy: &dyn AssignmentStrategy,
        source: &str,
        delivery: &Delivery,
        former: Option<&Delivery>,
        since: &Arc<Mutex<Vec<Option<String>>>>,
    ) -> Element {
        let registry = registry(since);
        let mut settings = PluginSettings::default();
        settings.values.insert(VCS_SETTING.into(), "scripted".into());
        let component = Component::new("app");
        let parameters = vec![".".to_string()];
        let request = ComputeRequest {
            parameters: &parameters,
            component: &component,
            delivery,
            former,
            import: registry.import(source).unwrap(),
            project_root: Path::new("."),
            settings: &settings,
            registry: &registry,
        };
        strategy.compute(&request).unwrap()
    }

    #[test]
    fn test_commits_since_former_tag() {
        let since = Arc::new(Mutex::new(Vec::new()));
        let content = compute(
            &VcsCommitsStrategy,
            "commits",
            &Delivery::new("1.1"),
            Some(&Delivery::new("1.0")),
            &since,
        );
        assert_eq!(since.lock().unwrap().as_slice(), &[Some("app-1.0".to_string())]);
        let info = DeliveryInformation::with_content("commits", InformationKind::Commits, content);
        assert_eq!(info.commits().len(), 2);
    }

    #[test]
    fn test_missing_former_tag_falls_back_to_full_history() {
        let since = Arc::new(Mutex::new(Vec::new()));
        compute(
            &VcsCommitsStrategy,
            "commits",
            &Delivery::new("0.9"),
            Some(&Delivery::new("0.8")),
            &since,
        );
        assert_eq!(since.lock().unwrap().as_slice(), &[None]);
    }

    #[test]
    fn test_tag_or_branch_summary() {
        let since = Arc::new(Mutex::new(Vec::new()));
        let tagged = compute(&VcsTagStrategy, "version", &Delivery::new("1.0"), None, &since);
        assert_eq!(tagged.child(TAG_TAG).and_then(|t| t.attr("type")), Some("annotated"));
        assert_eq!(tagged.child(STRING_TAG).map(Element::text).as_deref(), Some("app-1.0"));

        let untagged = compute(&VcsTagStrategy, "version", &Delivery::new("2.0"), None, &since);
        assert_eq!(
            untagged.child(BRANCH_TAG).and_then(|b| b.attr("name")),
            Some("main@abc1234")
        );
    }
}
