//! Version-control adapter backed by the system `git` binary.

use super::{TagInfo, VersionControl};
use crate::error::{DeliveryError, Result};
use crate::model::{Commit, Delivery};
use crate::plugins::PluginRegistryBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, LazyLock};

/// Registry name of this adapter.
pub const GIT_ADAPTER: &str = "git";

/// Field separator used in `git log` output.
const FIELD_SEP: char = '\u{1f}';
/// Record separator used in `git log` output.
const RECORD_SEP: char = '\u{1e}';

static ALM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9]+-[0-9]+)\b").expect("static regex"));

/// Register the adapter with a registry builder.
pub fn register(builder: &mut PluginRegistryBuilder) {
    builder.register_vcs(GIT_ADAPTER, Arc::new(|| Box::new(SystemGit::default())));
}

/// Git handle driving the `git` command line.
#[derive(Debug, Default)]
pub struct SystemGit {
    /// Path the handle was initialized on (restricts history queries)
    path: Option<PathBuf>,
    /// Working tree root
    work_tree: Option<PathBuf>,
}

impl SystemGit {
    fn path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| DeliveryError::vcs(GIT_ADAPTER, "handle used before initialize"))
    }

    /// Create a git command with an isolated environment
    fn git_cmd(&self) -> Result<Command> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(self.path()?);
        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }
        cmd.arg("-c").arg("core.quotePath=false");
        Ok(cmd)
    }

    /// Run git and return trimmed stdout; non-zero exit is an error
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self
            .git_cmd()?
            .args(args)
            .output()
            .map_err(|e| DeliveryError::vcs(GIT_ADAPTER, format!("failed to execute git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeliveryError::vcs(
                GIT_ADAPTER,
                format!("git {} failed: {}", args.join(" "), stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git and report only whether it succeeded
    fn succeeds(&self, args: &[&str]) -> Result<bool> {
        let status = self
            .git_cmd()?
            .args(args)
            .output()
            .map_err(|e| DeliveryError::vcs(GIT_ADAPTER, format!("failed to execute git: {e}")))?
            .status;
        Ok(status.success())
    }

    fn resolve(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", rev])
    }
}

impl VersionControl for SystemGit {
    fn name(&self) -> &str {
        GIT_ADAPTER
    }

    fn initialize(&mut self, path: &Path) -> Result<()> {
        self.path = Some(path.to_path_buf());
        let top = self.run(&["rev-parse", "--show-toplevel"]).map_err(|e| {
            self.path = None;
            e
        })?;
        self.work_tree = Some(PathBuf::from(top));
        Ok(())
    }

    fn commits_since(&self, since: Option<&str>) -> Result<Vec<Commit>> {
        let format = format!("--format=%H{FIELD_SEP}%ct{FIELD_SEP}%s{RECORD_SEP}");
        let range = since.map(|tag| format!("{tag}..HEAD"));
        let mut args = vec!["log", format.as_str()];
        if let Some(range) = range.as_deref() {
            args.push(range);
        }
        args.extend(["--", "."]);
        let output = self.run(&args)?;
        Ok(parse_log(&output))
    }

    fn is_head_synced(&self, tag: &str) -> Result<bool> {
        let head = self.resolve("HEAD")?;
        let target = self.resolve(&format!("{tag}^{{commit}}"))?;
        Ok(head == target)
    }

    fn former_tag(&self, component: &str, delivery: &Delivery) -> Result<Option<String>> {
        let id = delivery.id();
        let candidates = [
            format!("{component}-{id}"),
            format!("{component}_{id}"),
            format!("{component}/{id}"),
            format!("v{id}"),
            id.to_string(),
        ];
        for candidate in candidates {
            if self.succeeds(&["rev-parse", "-q", "--verify", &format!("refs/tags/{candidate}")])? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn branch_summary(&self) -> Result<String> {
        let branch = self
            .run(&["rev-parse", "--abbrev-ref", "HEAD"])
            .unwrap_or_else(|_| "HEAD".to_string());
        let short = self.run(&["rev-parse", "--short", "HEAD"])?;
        Ok(format!("{branch}@{short}"))
    }

    fn tag_summary(&self, tag: &str) -> Result<TagInfo> {
        let reference = format!("refs/tags/{tag}");
        let object_type = self.run(&["cat-file", "-t", &reference])?;
        Ok(TagInfo {
            name: tag.to_string(),
            hash: self.resolve(&reference)?,
            target: self.resolve(&format!("{reference}^{{commit}}"))?,
            kind: if object_type == "tag" {
                "annotated".to_string()
            } else {
                "lightweight".to_string()
            },
        })
    }

    fn release(&mut self) {
        self.path = None;
        self.work_tree = None;
    }
}

/// Parse `git log` output produced with the record/field separators.
fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEP)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut fields = record.splitn(3, FIELD_SEP);
            let hash = fields.next()?.trim();
            let time = fields.next().and_then(|t| t.trim().parse::<i64>().ok());
            let synopsis = fields.next().unwrap_or_default().trim();
            let mut commit = Commit::new(hash, synopsis);
            commit.time = time;
            commit.alm_id = ALM_ID
                .captures(synopsis)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            Some(commit)
        })
        .collect()
}
