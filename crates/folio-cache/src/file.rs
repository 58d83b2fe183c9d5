//! File-based cache shared between processes.
//!
//! Each bucket is a directory under the cache root and each entry one file
//! named after its key. Entries are written to a temporary file first and
//! renamed into place, so a concurrent reader sees either the old or the new
//! value, never a torn one.
//!
//! A `VERSION` file in the root records what produced the entries. When the
//! stored version differs from the one given to [`FileCache::new`], the whole
//! root is discarded. Callers fold anything that changes the meaning of
//! cached values (tool version, seed modification time) into that string.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Cache, CacheBucket};

const VERSION_FILE: &str = "VERSION";

/// Distinguishes temporary files of concurrent writers in one process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-based [`Cache`] rooted at a directory on disk.
///
/// ```text
/// {root}/
/// +-- VERSION
/// +-- pages/
///     +-- page_4
///     +-- page_4_url
///     +-- first_root_id
/// ```
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, discarding it if `version` changed.
    ///
    /// Filesystem errors are logged; a cache that cannot be prepared simply
    /// misses on every read.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        if reset_if_stale(&root, version) {
            tracing::info!(root = %root.display(), version, "Reset file cache");
        }
        Self { root }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileBucket {
            dir: self.root.join(name),
        })
    }
}

struct FileBucket {
    dir: PathBuf,
}

impl FileBucket {
    /// File holding `key`, or `None` if the key cannot name a single file.
    fn entry(&self, key: &str) -> Option<PathBuf> {
        let usable = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.starts_with(".tmp-");
        if !usable {
            tracing::debug!(key, "Refusing cache key that is not a plain file name");
            return None;
        }
        Some(self.dir.join(key))
    }
}

impl CacheBucket for FileBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.entry(key)?).ok()
    }

    fn set(&self, key: &str, value: &[u8]) {
        let Some(path) = self.entry(key) else {
            return;
        };
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::debug!(dir = %self.dir.display(), error = %e, "Cannot create cache bucket");
            return;
        }

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .dir
            .join(format!(".tmp-{}-{seq}-{key}", std::process::id()));
        let written = fs::write(&staging, value).and_then(|()| fs::rename(&staging, &path));
        if let Err(e) = written {
            tracing::debug!(key, error = %e, "Cannot write cache entry");
            let _ = fs::remove_file(&staging);
        }
    }

    fn delete(&self, key: &str) {
        let Some(path) = self.entry(key) else {
            return;
        };
        if let Err(e) = fs::remove_file(path)
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!(key, error = %e, "Cannot delete cache entry");
        }
    }
}

/// Make sure `root` holds entries of `version`. Returns `true` if the
/// directory was (re)initialized.
fn reset_if_stale(root: &Path, version: &str) -> bool {
    let version_file = root.join(VERSION_FILE);
    let stored = fs::read_to_string(&version_file).ok();
    if stored.as_deref() == Some(version) {
        return false;
    }
    tracing::debug!(stored = ?stored, version, "File cache version changed");

    match fs::remove_dir_all(root) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(root = %root.display(), error = %e, "Cannot clear file cache"),
    }
    let prepared = fs::create_dir_all(root).and_then(|()| fs::write(&version_file, version));
    if let Err(e) = prepared {
        tracing::warn!(root = %root.display(), error = %e, "Cannot initialize file cache");
    }
    true
}
