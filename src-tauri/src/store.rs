use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A typed JSON document persisted to a single file.
///
/// Every mutation goes through [`JsonStore::update`], which applies the change
/// to a copy, writes it out, and only then replaces the in-memory value. A
/// store built with [`JsonStore::in_memory`] skips the disk entirely.
pub struct JsonStore<T> {
    path: Option<PathBuf>,
    doc: Mutex<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send,
{
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => T::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => T::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path: Some(path),
            doc: Mutex::new(doc),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(T::default()),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.doc.lock().await;
        f(&guard)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let mut guard = self.doc.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    pub async fn close(self) -> Result<(), StoreError> {
        let doc = self.doc.into_inner();
        if let Some(path) = &self.path {
            write_atomic(path, &doc).await?;
        }
        Ok(())
    }

    async fn persist(&self, doc: &T) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_atomic(path, doc).await,
            None => Ok(()),
        }
    }
}

async fn write_atomic<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
