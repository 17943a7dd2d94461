use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::utils::now_millis;

/// Flat-file document store: every collection is one JSON array on disk at
/// `<data_dir>/<collection>.json`, always read and written whole.
#[derive(Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
    /// Serialises load -> mutate -> save sequences of mutating operations
    write_lock: Arc<Mutex<()>>,
    /// Last id handed out, so timestamp ids never repeat within a process
    last_id: Arc<AtomicI64>,
}

/// A fully encoded collection waiting to be written by [`DocumentStore::commit`].
pub struct PendingWrite {
    collection: String,
    body: Vec<u8>,
}

impl PendingWrite {
    pub fn new<T: Serialize>(collection: &str, records: &[T]) -> Result<Self, StoreError> {
        let body = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            source,
        })?;
        Ok(Self {
            collection: collection.to_string(),
            body,
        })
    }
}

struct Snapshot {
    collection: String,
    path: PathBuf,
    previous: Option<Vec<u8>>,
}

impl DocumentStore {
    /// Opens (and creates if needed) the data directory.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::Write {
                collection: data_dir.display().to_string(),
                source,
            })?;

        Ok(Self {
            data_dir,
            write_lock: Arc::new(Mutex::new(())),
            last_id: Arc::new(AtomicI64::new(0)),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }

    /// Acquire before loading any collection you intend to save.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Millisecond timestamp id, bumped past the previous one when the clock
    /// has not moved (or moved backwards).
    pub fn next_id(&self) -> i64 {
        let now = now_millis();
        let mut last = self.last_id.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last_id.compare_exchange_weak(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Returns the stored collection. A collection that was never created is
    /// persisted as `[]` on first access.
    pub async fn load<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let path = self.path_for(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.create_empty(collection, &path).await?;
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    collection: collection.to_string(),
                    source,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            collection: collection.to_string(),
            source,
        })
    }

    async fn create_empty(&self, collection: &str, path: &Path) -> Result<(), StoreError> {
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await;

        let mut file = match created {
            Ok(file) => file,
            // Someone else created it in the meantime; theirs wins.
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(source) => {
                return Err(StoreError::Write {
                    collection: collection.to_string(),
                    source,
                });
            }
        };

        file.write_all(b"[]")
            .await
            .map_err(|source| StoreError::Write {
                collection: collection.to_string(),
                source,
            })?;
        tracing::debug!(collection, "created empty collection");
        Ok(())
    }

    /// Overwrites one collection with `records`.
    pub async fn save<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<(), StoreError> {
        self.commit(vec![PendingWrite::new(collection, records)?])
            .await
    }

    /// Writes several collections in order. If any write fails, the ones
    /// already written are put back to their previous contents before the
    /// error is returned.
    pub async fn commit(&self, writes: Vec<PendingWrite>) -> Result<(), StoreError> {
        let mut snapshots = Vec::with_capacity(writes.len());
        for write in &writes {
            let path = self.path_for(&write.collection);
            let previous = match tokio::fs::read(&path).await {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(source) => {
                    return Err(StoreError::Read {
                        collection: write.collection.clone(),
                        source,
                    });
                }
            };
            snapshots.push(Snapshot {
                collection: write.collection.clone(),
                path,
                previous,
            });
        }

        for (index, write) in writes.iter().enumerate() {
            if let Err(source) = write_atomic(&snapshots[index].path, &write.body).await {
                let error = StoreError::Write {
                    collection: write.collection.clone(),
                    source,
                };
                if index > 0 {
                    tracing::warn!(
                        failed = %write.collection,
                        "multi-collection write failed, restoring earlier collections"
                    );
                    restore(&snapshots[..index]).await;
                }
                return Err(error);
            }
        }

        Ok(())
    }
}

async fn restore(written: &[Snapshot]) {
    for snapshot in written.iter().rev() {
        let result = match &snapshot.previous {
            Some(bytes) => write_atomic(&snapshot.path, bytes).await,
            None => tokio::fs::remove_file(&snapshot.path).await,
        };
        if let Err(e) = result {
            tracing::error!(
                collection = %snapshot.collection,
                error = %e,
                "failed to restore collection; data may be inconsistent"
            );
        }
    }
}

/// Temp file + rename so readers never observe a half-written collection.
async fn write_atomic(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, body).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    async fn temp_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::open(dir.path()).await.expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn missing_collection_loads_empty_and_is_persisted() {
        let (dir, store) = temp_store().await;

        let records: Vec<Value> = store.load("teachers").await.unwrap();
        assert!(records.is_empty());

        let on_disk = std::fs::read_to_string(dir.path().join("teachers.json")).unwrap();
        assert_eq!(on_disk, "[]");
    }

    #[tokio::test]
    async fn save_overwrites_whole_collection() {
        let (_dir, store) = temp_store().await;

        store
            .save("students", &[json!({"id": 1}), json!({"id": 2})])
            .await
            .unwrap();
        store.save("students", &[json!({"id": 3})]).await.unwrap();

        let records: Vec<Value> = store.load("students").await.unwrap();
        assert_eq!(records, vec![json!({"id": 3})]);
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let (dir, store) = temp_store().await;
        std::fs::write(dir.path().join("groups.json"), "{not json").unwrap();

        let err = store.load::<Value>("groups").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn failed_commit_restores_earlier_writes() {
        let (_dir, store) = temp_store().await;
        store.save("students", &[json!({"id": 1, "balance": 10})]).await.unwrap();

        let writes = vec![
            PendingWrite::new("students", &[json!({"id": 1, "balance": 0})]).unwrap(),
            // Parent directory does not exist, so this write fails.
            PendingWrite::new("missing/payments", &[json!({"id": 9})]).unwrap(),
        ];
        let err = store.commit(writes).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        let students: Vec<Value> = store.load("students").await.unwrap();
        assert_eq!(students, vec![json!({"id": 1, "balance": 10})]);
    }

    #[tokio::test]
    async fn ids_are_strictly_increasing() {
        let (_dir, store) = temp_store().await;
        let mut previous = store.next_id();
        for _ in 0..1000 {
            let next = store.next_id();
            assert!(next > previous);
            previous = next;
        }
    }
}
