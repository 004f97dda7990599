use crate::source::SnapshotLocation;
use crate::types::{Result, UpdateError};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the data root that holds one sub-directory per source kind.
pub const MODULES_DIR: &str = "Modules";

/// Reads and writes the last pulled item list of each source as JSON.
///
/// Every source owns exactly one file, and only that source's module writes
/// it, so no locking happens here.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/Modules/<kind>/<file_name>.json`
    pub fn path_for(&self, kind: &str, file_name: &str) -> PathBuf {
        self.root
            .join(MODULES_DIR)
            .join(kind)
            .join(format!("{}.json", file_name))
    }

    pub fn locate(&self, location: &SnapshotLocation) -> PathBuf {
        self.path_for(&location.kind, &location.file_name)
    }

    /// Load a snapshot. `Ok(None)` means no snapshot has been written yet.
    pub async fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<Vec<T>>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(snapshot_error(path, "read", e.into())),
        };

        let items: Vec<T> =
            serde_json::from_slice(&bytes).map_err(|e| snapshot_error(path, "decoded", e.into()))?;
        debug!("Loaded {} items from {}", items.len(), path.display());
        Ok(Some(items))
    }

    /// Replace the snapshot at `path`, creating parent directories as needed.
    ///
    /// The JSON is written next to the target and renamed over it, so an
    /// interrupted save leaves the previous snapshot readable.
    pub async fn save<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| snapshot_error(path, "written", e.into()))?;
        }

        let json =
            serde_json::to_vec_pretty(items).map_err(|e| snapshot_error(path, "encoded", e.into()))?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| snapshot_error(path, "written", e.into()))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| snapshot_error(path, "written", e.into()))?;

        debug!("Saved {} items to {}", items.len(), path.display());
        Ok(())
    }
}

fn snapshot_error(path: &Path, action: &'static str, source: UpdateError) -> UpdateError {
    UpdateError::Snapshot {
        path: path.to_path_buf(),
        action,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        title: String,
    }

    #[test]
    fn path_layout() {
        let store = SnapshotStore::new("data");
        assert_eq!(
            store.path_for("RSS", "kernel.org_feeds_kdist.xml"),
            Path::new("data/Modules/RSS/kernel.org_feeds_kdist.xml.json")
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let loaded: Option<Vec<Entry>> = store.load(&store.path_for("RSS", "absent")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.path_for("RSS", "example.com_feed");
        let items = vec![
            Entry { title: "A".to_owned() },
            Entry { title: "B".to_owned() },
        ];

        store.save(&path, &items).await.unwrap();
        let loaded: Vec<Entry> = store.load(&path).await.unwrap().unwrap();

        assert_eq!(loaded, items);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"), "indented JSON array: {text}");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.path_for("RSS", "broken");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let err = store.load::<Entry>(&path).await.unwrap_err();
        assert!(matches!(err, UpdateError::Snapshot { action: "decoded", .. }));
    }
}
