//! Local file store rooted at the configured output directory.
//!
//! Generated files are addressed by [`AssetRef`]s relative to the root, so callers never
//! see absolute paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::slide::AssetRef;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the named sub-directory, created on first use.
    pub fn dir(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        if !path.exists() {
            fs::create_dir_all(&path)?;
            tracing::debug!(path = %path.display(), "Created output directory");
        }
        Ok(path)
    }

    /// Whether the named sub-directory already exists (no side effects).
    pub fn has_dir(&self, name: &str) -> bool {
        self.root.join(name).is_dir()
    }

    pub fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    pub fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    pub fn read(&self, asset: &AssetRef) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(asset))
    }

    /// Reference to `file_name` inside the named sub-directory.
    pub fn asset_ref(&self, dir: &str, file_name: &str) -> AssetRef {
        AssetRef::new(dir, file_name)
    }

    /// Absolute (root-joined) location of an asset.
    pub fn resolve(&self, asset: &AssetRef) -> PathBuf {
        asset
            .as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dir_is_created_once_and_assets_resolve_under_root() {
        let tmp = tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        assert!(!store.has_dir("images"));

        let dir = store.dir("images").unwrap();
        assert!(dir.is_dir());
        assert!(store.has_dir("images"));

        let path = dir.join("a.png");
        store.write(&path, b"abc").unwrap();
        let asset = store.asset_ref("images", "a.png");
        assert_eq!(store.resolve(&asset), path);
        assert!(store.exists(&path));
        assert_eq!(store.size(&path).unwrap(), 3);
        assert_eq!(store.read(&asset).unwrap(), b"abc");
    }
}
