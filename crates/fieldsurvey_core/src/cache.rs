//! Local copies of campaign icons.
//!
//! Icons are referenced by URL from `campaigns.campaign_icon`. The store
//! asks the cache to evict an icon once no campaign refers to it anymore.

use log::debug;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Cache of downloaded icon files.
pub trait IconCache: Send + Sync {
    /// Removes the cached copy of `icon`. Returns `Ok(false)` when nothing
    /// was cached.
    fn evict(&self, icon: &str) -> io::Result<bool>;
}

/// Icon cache rooted in one directory.
///
/// A reference that is already a path inside the root maps to itself; any
/// other reference (usually a URL, or a path climbing out through `..`) maps
/// to a file named by its v5 UUID.
#[derive(Debug, Clone)]
pub struct FileIconCache {
    root: PathBuf,
}

impl FileIconCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location where `icon` is (or would be) cached.
    pub fn path_for(&self, icon: &str) -> PathBuf {
        let candidate = Path::new(icon);
        let contained = candidate
            .components()
            .all(|part| !matches!(part, Component::ParentDir));
        if candidate.is_absolute() && contained && candidate.starts_with(&self.root) {
            return candidate.to_path_buf();
        }
        let name = Uuid::new_v5(&Uuid::NAMESPACE_URL, icon.as_bytes());
        self.root.join(name.simple().to_string())
    }
}

impl IconCache for FileIconCache {
    fn evict(&self, icon: &str) -> io::Result<bool> {
        let path = self.path_for(icon);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("event=icon_evicted module=cache status=ok");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledIconCache;

impl IconCache for DisabledIconCache {
    fn evict(&self, _icon: &str) -> io::Result<bool> {
        Ok(false)
    }
}
