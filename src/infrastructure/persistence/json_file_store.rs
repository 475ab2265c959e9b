//! JSON data file implementation of the link store.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::LinkSnapshot;
use crate::domain::repositories::LinkStore;
use crate::error::AppError;

/// Link store backed by a single pretty-printed JSON file.
///
/// Every save rewrites the whole document: the new content is written to a
/// sibling `.tmp` file, synced, and renamed over the data file, so a crash
/// never leaves a half-written store behind. Reads take a shared lock and
/// writes an exclusive lock on a sibling `.lock` file; both are held only for
/// the duration of one call.
pub struct JsonFileLinkStore {
    path: PathBuf,
    lock_path: PathBuf,
    tmp_path: PathBuf,
}

impl JsonFileLinkStore {
    /// Opens the store at `dir/file_name`, creating `dir` if needed.
    ///
    /// The data file itself is created lazily on the first save.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            AppError::storage(
                "Failed to create storage directory",
                json!({ "dir": dir.display().to_string(), "reason": e.to_string() }),
            )
        })?;

        let path = dir.join(file_name);
        Ok(Self {
            lock_path: sibling(&path, ".lock"),
            tmp_path: sibling(&path, ".tmp"),
            path,
        })
    }

    /// Location of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LinkStore for JsonFileLinkStore {
    async fn load(&self) -> Result<LinkSnapshot, AppError> {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        let snapshot = tokio::task::spawn_blocking(move || read_snapshot(&path, &lock_path))
            .await
            .map_err(|e| AppError::internal("Link store read task failed", json!({ "reason": e.to_string() })))??;

        debug!(
            links = snapshot.len(),
            owners = snapshot.owner_count(),
            path = %self.path.display(),
            "Loaded link snapshot"
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &LinkSnapshot) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            AppError::internal("Failed to serialize link snapshot", json!({ "reason": e.to_string() }))
        })?;
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let tmp_path = self.tmp_path.clone();

        tokio::task::spawn_blocking(move || write_snapshot(&path, &lock_path, &tmp_path, &bytes))
            .await
            .map_err(|e| AppError::internal("Link store write task failed", json!({ "reason": e.to_string() })))??;

        debug!(
            links = snapshot.len(),
            path = %self.path.display(),
            "Saved link snapshot"
        );
        Ok(())
    }
}

fn read_snapshot(path: &Path, lock_path: &Path) -> Result<LinkSnapshot, AppError> {
    let lock = open_lock_file(lock_path)?;
    lock.lock_shared()?;

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LinkSnapshot::new()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(LinkSnapshot::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        AppError::corrupt_store(
            "Link store file is malformed",
            json!({
                "path": path.display().to_string(),
                "line": e.line(),
                "column": e.column(),
                "reason": e.to_string(),
            }),
        )
    })
}

fn write_snapshot(
    path: &Path,
    lock_path: &Path,
    tmp_path: &Path,
    bytes: &[u8],
) -> Result<(), AppError> {
    let lock = open_lock_file(lock_path)?;
    lock.lock()?;

    let written = File::create(tmp_path).and_then(|mut tmp| {
        tmp.write_all(bytes)?;
        tmp.sync_all()
    });

    if let Err(e) = written.and_then(|()| fs::rename(tmp_path, path)) {
        if let Err(cleanup) = fs::remove_file(tmp_path)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary store file");
        }
        return Err(e.into());
    }

    Ok(())
}

fn open_lock_file(lock_path: &Path) -> Result<File, AppError> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?)
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
