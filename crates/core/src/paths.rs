#![forbid(unsafe_code)]

use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathGuardError {
    NotRelative,
    Traversal,
    Escapes,
}

impl std::fmt::Display for PathGuardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRelative => write!(f, "path must be relative to the workspace root"),
            Self::Traversal => write!(f, "path must not contain '..'"),
            Self::Escapes => write!(f, "path escapes the workspace root"),
        }
    }
}

impl std::error::Error for PathGuardError {}

/// Join `rel` under `root` and fail unless the result stays equal to, or
/// strictly inside, the root. Every workspace-reading code path goes through
/// here.
pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf, PathGuardError> {
    let rel = rel.trim();
    let rel = rel.strip_prefix("./").unwrap_or(rel);
    let rel = rel.replace('\\', "/");
    let rel_path = Path::new(&rel);

    for component in rel_path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(PathGuardError::NotRelative);
            }
            Component::ParentDir => return Err(PathGuardError::Traversal),
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    let resolved_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let joined = resolved_root.join(rel_path);
    // Symlinked files can still point outside; resolve when possible and
    // re-check the prefix.
    let resolved = std::fs::canonicalize(&joined).unwrap_or(joined);
    if resolved != resolved_root && !resolved.starts_with(&resolved_root) {
        return Err(PathGuardError::Escapes);
    }
    Ok(resolved)
}
