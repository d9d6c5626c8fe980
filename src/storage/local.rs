//! Local filesystem snapshot store.
//!
//! The whole document is read once and rewritten once per operation. Writes
//! go to a temporary file that is renamed over the target, so a crash never
//! leaves a half-written store behind.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Course, Item};
use crate::pipeline::overlay;
use crate::storage::{SnapshotStore, Snapshots};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file_name: String,
}

impl LocalStorage {
    /// Default snapshot file name.
    pub const DEFAULT_FILE: &'static str = "snapshots.json";

    /// Create a LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_file(root_dir, Self::DEFAULT_FILE)
    }

    /// Create a LocalStorage with a custom snapshot file name.
    pub fn with_file(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path of the snapshot document.
    pub fn path(&self) -> PathBuf {
        self.root_dir.join(&self.file_name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path();
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read the stored document.
    async fn read_snapshots(&self) -> Result<Snapshots> {
        match self.read_bytes().await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::storage(format!("{} is not a valid snapshot file: {e}", self.path().display()))
            }),
            None => Ok(Snapshots::new()),
        }
    }

    /// Read the stored document, treating any failure as an empty store.
    async fn read_snapshots_or_empty(&self) -> Snapshots {
        self.read_snapshots().await.unwrap_or_else(|e| {
            log::warn!("Failed to read snapshots, starting empty: {}", e);
            Snapshots::new()
        })
    }

    async fn write_snapshots(&self, snapshots: &Snapshots) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshots)?;
        self.write_bytes(&bytes).await
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load(&self, course: &Course) -> Result<Item> {
        let mut snapshots = self.read_snapshots_or_empty().await;
        if let Some(tree) = snapshots.get(&course.key()) {
            return Ok(tree.clone());
        }

        log::info!("No snapshot for {} yet, creating placeholder", course.name);
        let placeholder = course.root_folder();
        snapshots.insert(course.key(), placeholder.clone());
        if let Err(e) = self.write_snapshots(&snapshots).await {
            log::warn!("Failed to persist placeholder for {}: {}", course.name, e);
        }
        Ok(placeholder)
    }

    async fn save(&self, course: &Course, tree: Item) -> Result<Item> {
        // An unreadable document is never rewritten.
        let mut snapshots = self.read_snapshots().await?;

        let merged = match snapshots.get(&course.key()) {
            Some(old) => overlay(tree, old),
            None => tree,
        };
        snapshots.insert(course.key(), merged.clone());
        self.write_snapshots(&snapshots).await?;

        log::debug!(
            "Saved snapshot for {} ({} nodes)",
            course.name,
            merged.node_count()
        );
        Ok(merged)
    }

    async fn snapshots(&self) -> Result<Snapshots> {
        self.read_snapshots().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = "https://moodle.example.org/course/view.php?id={id}";

    fn course(id: u64) -> Course {
        Course::new(id, format!("Course {id}"), TEMPLATE)
    }

    fn tree(course: &Course, files: &[&str]) -> Item {
        course.root_folder().with_children(
            files
                .iter()
                .map(|name| Item::leaf(*name, "pdf"))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_load_creates_placeholder() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let c = course(7);

        let loaded = storage.load(&c).await.unwrap();
        assert_eq!(loaded, c.root_folder());

        let stored = storage.snapshots().await.unwrap();
        assert!(stored.contains_key("7"));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let c = course(7);

        let merged = storage.save(&c, tree(&c, &["x.pdf", "y.pdf"])).await.unwrap();
        let loaded = storage.load(&c).await.unwrap();
        assert!(loaded.full_eq(&merged));
        assert_eq!(loaded.children.len(), 2);
    }

    #[tokio::test]
    async fn test_save_keeps_old_data_in_gaps() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let c = course(7);

        let mut first = tree(&c, &[]);
        first.push(Item::folder("resources").with_children(vec![Item::leaf("x.pdf", "pdf")]));
        storage.save(&c, first).await.unwrap();

        // Resources came back empty.
        let mut second = tree(&c, &[]);
        second.push(Item::folder("resources"));
        storage.save(&c, second).await.unwrap();

        let loaded = storage.load(&c).await.unwrap();
        assert_eq!(loaded.children[0].children[0].name, "x.pdf");
    }

    #[tokio::test]
    async fn test_save_leaves_other_courses_untouched() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let (a, b) = (course(1), course(2));

        storage.save(&a, tree(&a, &["a.pdf"])).await.unwrap();
        storage.save(&b, tree(&b, &["b.pdf"])).await.unwrap();
        storage.save(&b, tree(&b, &["b2.pdf"])).await.unwrap();

        let loaded = storage.load(&a).await.unwrap();
        assert_eq!(loaded, tree(&a, &["a.pdf"]));
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.path(), b"{ not json").unwrap();

        let c = course(3);
        let loaded = storage.load(&c).await.unwrap();
        assert_eq!(loaded, c.root_folder());
        assert!(storage.snapshots().await.unwrap().contains_key("3"));
    }

    #[tokio::test]
    async fn test_save_refuses_to_overwrite_unreadable_store() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.path(), b"{ \"1\": { not json").unwrap();

        let c = course(2);
        let err = storage.save(&c, tree(&c, &["x.pdf"])).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let raw = std::fs::read(storage.path()).unwrap();
        assert_eq!(raw, b"{ \"1\": { not json");
    }

    #[tokio::test]
    async fn test_document_layout_keyed_by_id() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::with_file(tmp.path().join("nested"), "files.json");
        let c = course(41470);

        storage.save(&c, tree(&c, &["x.pdf"])).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("nested/files.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["41470"]["type"], "folder");
        assert_eq!(json["41470"]["description"], "41470");
        assert_eq!(json["41470"]["children"][0]["name"], "x.pdf");
    }
}
