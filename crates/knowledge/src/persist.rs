//! Durable storage for the (index, store) pair.
//!
//! Two independent JSON blobs under the state directory. Either may be
//! absent (fresh install, defaults to empty), but a present blob that fails
//! to parse is an error, never silently replaced.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{
    error::{KnowledgeError, Result},
    index::FlatIndex,
    store::DocumentStore,
};

const INDEX_FILE: &str = "index.json";
const DOCUMENTS_FILE: &str = "documents.json";

/// Locations of the two persisted blobs.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub index: PathBuf,
    pub documents: PathBuf,
}

impl StatePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            index: dir.join(INDEX_FILE),
            documents: dir.join(DOCUMENTS_FILE),
        }
    }
}

/// Load the persisted pair, defaulting each absent blob to empty.
///
/// A stored index whose dimension differs from `dimensions` cannot serve
/// the configured embedder and is rejected outright.
pub async fn load(paths: &StatePaths, dimensions: usize) -> Result<(FlatIndex, DocumentStore)> {
    let index = match read_blob::<FlatIndex>(&paths.index).await? {
        Some(index) if index.dimension() != dimensions => {
            return Err(KnowledgeError::DimensionMismatch {
                expected: dimensions,
                actual: index.dimension(),
            });
        },
        Some(index) => index,
        None => FlatIndex::new(dimensions),
    };
    let store = read_blob::<DocumentStore>(&paths.documents)
        .await?
        .unwrap_or_default();
    Ok((index, store))
}

/// Flush both blobs, index first.
///
/// Callers treat any failure as fatal for the triggering request: the
/// in-memory pair stays mutated and the persisted copy is stale until the
/// next successful save.
pub async fn save(paths: &StatePaths, index: &FlatIndex, store: &DocumentStore) -> Result<()> {
    for parent in [paths.index.parent(), paths.documents.parent()]
        .into_iter()
        .flatten()
    {
        fs::create_dir_all(parent).await?;
    }
    write_blob(&paths.index, index).await?;
    write_blob(&paths.documents, store).await?;
    Ok(())
}

async fn read_blob<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).map_err(|source| KnowledgeError::CorruptState {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

/// Write via a sibling temp file and rename so a blob is never torn.
async fn write_blob<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn load_from_empty_dir_yields_empty_state() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::in_dir(tmp.path());
        let (index, store) = load(&paths, 8).await.unwrap();
        assert_eq!(index.dimension(), 8);
        assert!(index.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::in_dir(tmp.path());

        let mut index = FlatIndex::new(2);
        index.add(&[1.0, 2.0]).unwrap();
        let mut store = DocumentStore::new();
        let id = store.insert(
            "hello".into(),
            HashMap::from([("filename".to_string(), "hi.txt".to_string())]),
        );

        save(&paths, &index, &store).await.unwrap();
        let (loaded_index, loaded_store) = load(&paths, 2).await.unwrap();

        assert_eq!(loaded_index.len(), 1);
        let doc = loaded_store.get(&id).unwrap();
        assert_eq!(doc.content, "hello");
        assert_eq!(
            doc.metadata.get("filename").map(String::as_str),
            Some("hi.txt")
        );
    }

    #[tokio::test]
    async fn load_rejects_dimension_drift() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::in_dir(tmp.path());
        save(&paths, &FlatIndex::new(4), &DocumentStore::new())
            .await
            .unwrap();

        let err = load(&paths, 8).await.unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn corrupt_blob_is_surfaced_not_reset() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::in_dir(tmp.path());
        fs::write(&paths.index, b"not json").await.unwrap();

        let err = load(&paths, 8).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn save_leaves_no_temp_files_behind() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::in_dir(tmp.path());
        save(&paths, &FlatIndex::new(2), &DocumentStore::new())
            .await
            .unwrap();

        let mut entries = fs::read_dir(tmp.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        assert_eq!(names, vec!["documents.json", "index.json"]);
    }
}
