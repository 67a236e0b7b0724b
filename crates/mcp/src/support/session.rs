#![forbid(unsafe_code)]

use crate::support::time::today_yyyymmdd;
use rwm_core::ids::{SessionId, sanitize_segment};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolves raw session strings into canonical `<base>@<suffix>` ids.
/// Branch lookups shell out to git once per root; the result is memoized for
/// the process lifetime (`reset` clears it for tests).
pub(crate) struct SessionResolver {
    branch_cache: HashMap<PathBuf, Option<String>>,
}

impl SessionResolver {
    pub(crate) fn new() -> Self {
        Self {
            branch_cache: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn reset(&mut self) {
        self.branch_cache.clear();
    }

    /// Canonicalize a raw session id. Suffix resolution order: the supplied
    /// suffix, the current git branch of `root` (`detached-<short>` for a
    /// detached HEAD), today's date.
    pub(crate) fn normalize(&mut self, raw: &str, root: &Path) -> SessionId {
        let (raw_base, raw_suffix) = split_raw(raw);

        let base = if raw_base.trim().is_empty() {
            basename(root).unwrap_or_else(|| "workspace".to_string())
        } else {
            raw_base.to_string()
        };

        let mut suffix = non_alias_suffix(raw_suffix);
        if suffix.is_none() {
            suffix = self.git_branch(root);
        }
        let suffix = suffix.unwrap_or_else(today_yyyymmdd);

        SessionId::from_parts(&base, &suffix)
    }

    /// Alias-folding variant: same shape, no git subprocess, suffix defaults
    /// to `main`. For hosts that fold persisted aliases without a repo
    /// checkout.
    #[allow(dead_code)]
    pub(crate) fn canonicalize_alias(&self, raw: &str, root: &Path) -> SessionId {
        let (raw_base, raw_suffix) = split_raw(raw);
        let base = if raw_base.trim().is_empty() {
            basename(root).unwrap_or_else(|| "workspace".to_string())
        } else {
            raw_base.to_string()
        };
        let suffix = non_alias_suffix(raw_suffix).unwrap_or_else(|| "main".to_string());
        SessionId::from_parts(&base, &suffix)
    }

    fn git_branch(&mut self, root: &Path) -> Option<String> {
        let key = root.to_path_buf();
        if let Some(cached) = self.branch_cache.get(&key) {
            return cached.clone();
        }
        let looked_up = lookup_git_branch(root);
        self.branch_cache.insert(key, looked_up.clone());
        looked_up
    }
}

/// True when the raw input carries no usable suffix and resolution had to
/// invent one; persisted rows under such aliases get folded.
pub(crate) fn raw_suffix_is_alias(raw: &str) -> bool {
    let (_, raw_suffix) = split_raw(raw);
    non_alias_suffix(raw_suffix).is_none()
}

fn split_raw(raw: &str) -> (&str, &str) {
    match raw.split_once('@') {
        Some((base, suffix)) => (base, suffix),
        None => (raw, ""),
    }
}

fn non_alias_suffix(raw_suffix: &str) -> Option<String> {
    if raw_suffix.trim().is_empty() {
        return None;
    }
    let sanitized = sanitize_segment(raw_suffix);
    if sanitized == "unknown" {
        return None;
    }
    Some(sanitized)
}

fn basename(root: &Path) -> Option<String> {
    root.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .filter(|name| !name.is_empty())
}

fn lookup_git_branch(root: &Path) -> Option<String> {
    let head = git_output(root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    if head != "HEAD" {
        return Some(sanitize_segment(&head));
    }
    // Detached HEAD: name the session after the short commit hash.
    let short = git_output(root, &["rev-parse", "--short", "HEAD"])?;
    Some(format!("detached-{}", sanitize_segment(&short)))
}

fn git_output(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
