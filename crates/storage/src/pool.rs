#![forbid(unsafe_code)]

use crate::error::StoreError;
use rwm_core::hash::sha256_hex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Content-addressed body pool: each file is named by the lowercase hex
/// SHA-256 of its bytes, which makes writes idempotent and dedup automatic.
#[derive(Debug)]
pub struct ArtifactPool {
    dir: PathBuf,
}

impl ArtifactPool {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store bytes and return their hash. A body that already exists is left
    /// untouched.
    pub fn write_body(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let hash = sha256_hex(bytes);
        let path = self.dir.join(&hash);
        if !path.exists() {
            std::fs::write(&path, bytes)?;
        }
        Ok(hash)
    }

    pub fn has_body(&self, hash: &str) -> bool {
        valid_hash(hash) && self.dir.join(hash).is_file()
    }

    pub fn read_body(&self, hash: &str) -> Result<Vec<u8>, StoreError> {
        if !valid_hash(hash) {
            return Err(StoreError::InvalidInput("artifact hash must be 64 hex chars"));
        }
        let path = self.dir.join(hash);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                entity: "artifact body",
                id: hash.to_string(),
            });
        }
        Ok(std::fs::read(path)?)
    }

    /// All file names in the pool. Anything that is not a referenced hash is
    /// an orphan by the pool invariant.
    pub fn list_bodies(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                out.push(name.to_string());
            }
        }
        Ok(out)
    }

    /// Unlink every body whose hash is not in `referenced`. Best-effort: a
    /// file that cannot be removed stays for the next sweep.
    pub fn prune(&self, referenced: &HashSet<String>) -> usize {
        let Ok(bodies) = self.list_bodies() else {
            return 0;
        };
        let mut removed = 0usize;
        for hash in bodies {
            if referenced.contains(&hash) {
                continue;
            }
            if std::fs::remove_file(self.dir.join(&hash)).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

fn valid_hash(raw: &str) -> bool {
    raw.len() == 64
        && raw
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
