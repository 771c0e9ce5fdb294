use std::{
    io,
    path::{Component, Path, PathBuf},
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::error::ApplicationError;

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Owns the scratch directory for the lifetime of the process.
///
/// The directory is created on construction and removed, with everything in
/// it, when the value is dropped.
#[derive(Debug)]
pub struct ScratchStorage {
    root: PathBuf,
    fallback: Option<TempDir>,
}

impl ScratchStorage {
    /// Creates `dir`, falling back to a fresh temporary directory when that
    /// is not possible.
    pub fn create(dir: &Path) -> io::Result<Self> {
        match std::fs::create_dir_all(dir) {
            Ok(()) => Ok(Self {
                root: dir.to_path_buf(),
                fallback: None,
            }),
            Err(e) => {
                warn!(
                    "Cannot create scratch directory {}: {}, using a temporary one",
                    dir.display(),
                    e
                );
                let temp = tempfile::Builder::new()
                    .prefix("bg_remover_uploads")
                    .tempdir()?;
                Ok(Self {
                    root: temp.path().to_path_buf(),
                    fallback: Some(temp),
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Maps a served filename to its location. Only a single plain path
    /// component is accepted.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.contains('\\') {
            return None;
        }
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.root.join(name)),
            _ => None,
        }
    }

    pub async fn write(&self, filename: &str, content: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.join(filename);
        tokio::fs::write(&path, content).await?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    pub async fn copy_from(&self, source: &Path, filename: &str) -> io::Result<PathBuf> {
        let path = self.root.join(filename);
        let copied = tokio::fs::copy(source, &path).await?;
        debug!(
            "Copied {} bytes from {} to {}",
            copied,
            source.display(),
            path.display()
        );
        Ok(path)
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, ApplicationError> {
        let path = self.resolve(filename).ok_or_else(|| {
            warn!("Rejected scratch filename: {}", filename);
            ApplicationError::NotFound
        })?;

        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() != io::ErrorKind::NotFound {
                error!("Cannot read {}: {}", path.display(), e);
            }
            ApplicationError::NotFound
        })
    }

    /// Removes regular files last modified more than `ttl` ago. Returns the
    /// number of files removed.
    pub async fn evict_older_than(&self, ttl: Duration) -> io::Result<usize> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now().checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(t) => t.into(),
                Err(_) => continue,
            };
            if modified < cutoff {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Cannot evict {}: {}", entry.path().display(), e),
                }
            }
        }
        Ok(removed)
    }
}

impl Drop for ScratchStorage {
    fn drop(&mut self) {
        let result = match self.fallback.take() {
            Some(temp) => temp.close(),
            None => std::fs::remove_dir_all(&self.root),
        };
        match result {
            Ok(()) => info!("Removed scratch directory {}", self.root.display()),
            Err(e) => error!(
                "Failed to remove scratch directory {}: {}",
                self.root.display(),
                e
            ),
        }
    }
}

/// Periodically evicts scratch files older than `ttl`. The task ends once the
/// storage has been dropped.
pub fn spawn_eviction(storage: &Arc<ScratchStorage>, ttl: Duration) -> JoinHandle<()> {
    let storage: Weak<ScratchStorage> = Arc::downgrade(storage);
    let period = sweep_period(ttl);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let Some(storage) = storage.upgrade() else {
                break;
            };
            match storage.evict_older_than(ttl).await {
                Ok(0) => {}
                Ok(n) => info!("Evicted {} expired scratch files", n),
                Err(e) => error!("Scratch eviction failed: {}", e),
            }
        }
    })
}

fn sweep_period(ttl: Duration) -> Duration {
    ttl.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
}
