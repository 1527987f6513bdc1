//! Local filesystem mirror store.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use keystock_core::error::{AppError, ErrorKind};
use keystock_core::result::AppResult;
use keystock_core::traits::MirrorStore;
use keystock_core::types::PoolKey;

/// Mirror store writing one `<program>_<duration>.txt` file per pool under a
/// root directory.
///
/// Every operation on a pool file runs under that file's lock, so
/// concurrent removals never lose each other's edits. Rewrites go to a
/// temporary file that is renamed over the original.
#[derive(Debug, Clone)]
pub struct LocalMirrorStore {
    /// Directory holding the mirror files.
    root: PathBuf,
    /// One lock per mirror file.
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LocalMirrorStore {
    /// Create a mirror store rooted at the given directory, creating it if
    /// missing.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create mirror directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            locks: Arc::new(DashMap::new()),
        })
    }

    /// The directory holding the mirror files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a pool's mirror file.
    pub fn path_for(&self, pool: &PoolKey) -> PathBuf {
        self.root.join(pool.mirror_file_name())
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read the raw file, treating a missing file as empty.
    async fn read_raw(&self, path: &Path) -> AppResult<String> {
        match fs::read(path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read mirror: {}", path.display()),
                e,
            )),
        }
    }

    /// Replace the file contents via a temporary file and rename.
    async fn replace(&self, path: &Path, contents: &str) -> AppResult<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self
            .root
            .join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp, contents.as_bytes()).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write mirror: {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace mirror: {}", path.display()),
                e,
            ));
        }
        Ok(())
    }
}

/// Render values as newline-terminated lines.
fn render(values: &[String]) -> String {
    let mut out = String::with_capacity(values.iter().map(|v| v.len() + 1).sum());
    for value in values {
        out.push_str(value);
        out.push('\n');
    }
    out
}

#[async_trait]
impl MirrorStore for LocalMirrorStore {
    async fn append(&self, pool: &PoolKey, values: &[String]) -> AppResult<()> {
        if values.is_empty() {
            return Ok(());
        }

        let path = self.path_for(pool);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let storage_err = |e: std::io::Error| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to append to mirror: {}", path.display()),
                e,
            )
        };

        let mut file = fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(storage_err)?;

        // A hand-edited file may lack a trailing newline.
        let len = file.metadata().await.map_err(storage_err)?.len();
        let mut contents = String::new();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).await.map_err(storage_err)?;
            file.read_exact(&mut last).await.map_err(storage_err)?;
            if last[0] != b'\n' {
                contents.push('\n');
            }
        }
        contents.push_str(&render(values));

        file.write_all(contents.as_bytes())
            .await
            .map_err(storage_err)?;
        file.flush().await.map_err(storage_err)?;

        debug!(pool = %pool, lines = values.len(), "Appended to mirror");
        Ok(())
    }

    async fn remove_one(&self, pool: &PoolKey, value: &str) -> AppResult<bool> {
        let path = self.path_for(pool);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let raw = self.read_raw(&path).await?;
        let wanted = value.trim();
        let mut removed = false;
        let mut kept = String::with_capacity(raw.len());
        // Segments keep their own terminators, so untouched lines are
        // written back byte for byte.
        for segment in raw.split_inclusive('\n') {
            if !removed && segment.trim() == wanted {
                removed = true;
                continue;
            }
            kept.push_str(segment);
        }

        if !removed {
            return Ok(false);
        }

        self.replace(&path, &kept).await?;
        debug!(pool = %pool, "Removed line from mirror");
        Ok(true)
    }

    async fn wipe(&self, pool: &PoolKey) -> AppResult<()> {
        let path = self.path_for(pool);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        self.replace(&path, "").await?;
        debug!(pool = %pool, "Wiped mirror");
        Ok(())
    }

    async fn read(&self, pool: &PoolKey) -> AppResult<Vec<String>> {
        let path = self.path_for(pool);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let raw = self.read_raw(&path).await?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn rebuild(&self, pool: &PoolKey, values: &[String]) -> AppResult<()> {
        let path = self.path_for(pool);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        self.replace(&path, &render(values)).await?;
        debug!(pool = %pool, lines = values.len(), "Rebuilt mirror");
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir() && !meta.permissions().readonly()),
            Err(_) => Ok(false),
        }
    }
}
