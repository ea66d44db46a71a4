//! The user's uploaded files and the per-file sharing controls.
//!
//! [`FileLibrary`] keeps a display copy of the server's list for one view.
//! The copy is never treated as authoritative: [`FileLibrary::refresh`]
//! replaces it wholesale.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{RemoteFileRecord, SwiftShareApi};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};

/// Number of entries the dashboard's recent-files panel shows.
pub const RECENT_FILES: usize = 10;

/// Totals shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibrarySummary {
    pub total_files: usize,
    pub public_files: usize,
    pub total_bytes: u64,
}

/// Builds the shareable link for a file: `{origin}/file/{id}`.
#[must_use]
pub fn share_link(public_base_url: &str, id: &str) -> String {
    format!("{}/file/{id}", public_base_url.trim_end_matches('/'))
}

/// Strips path components from a server-provided name before saving it locally.
fn safe_file_name(name: &str, id: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "..")
        .unwrap_or_else(|| id.to_string())
}

/// Display copy of the user's files plus the operations on them.
pub struct FileLibrary {
    api: Arc<dyn SwiftShareApi>,
    fs: Arc<dyn FileSystem>,
    files: Vec<RemoteFileRecord>,
}

impl FileLibrary {
    /// Creates an empty library. Call [`refresh`](Self::refresh) to load it.
    #[must_use]
    pub fn new(api: Arc<dyn SwiftShareApi>) -> Self {
        Self::with_fs(api, Arc::new(TokioFileSystem::new()))
    }

    /// Creates a library saving downloads through a custom file system.
    #[must_use]
    pub fn with_fs(api: Arc<dyn SwiftShareApi>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            api,
            fs,
            files: Vec::new(),
        }
    }

    /// Replaces the display copy with the server's list.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error; the previous copy is kept.
    pub async fn refresh(&mut self) -> Result<&[RemoteFileRecord]> {
        self.files = self.api.list_files().await?;
        log::debug!("Loaded {} file(s)", self.files.len());
        Ok(&self.files)
    }

    /// The current display copy.
    #[must_use]
    pub fn files(&self) -> &[RemoteFileRecord] {
        &self.files
    }

    /// Looks up a file in the display copy.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RemoteFileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    /// The `n` most recently uploaded files, newest first.
    ///
    /// Files without an upload time sort last.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<&RemoteFileRecord> {
        let mut sorted: Vec<_> = self.files.iter().collect();
        sorted.sort_by(|a, b| b.upload_at.cmp(&a.upload_at));
        sorted.truncate(n);
        sorted
    }

    /// Counts and sizes across the display copy.
    #[must_use]
    pub fn summary(&self) -> LibrarySummary {
        LibrarySummary {
            total_files: self.files.len(),
            public_files: self.files.iter().filter(|f| f.is_public).count(),
            total_bytes: self.files.iter().map(|f| f.size).sum(),
        }
    }

    /// Flips a file between public and private.
    ///
    /// The local copy flips immediately. If the server refuses, the flip is
    /// rolled back before the error is returned; if it accepts and echoes the
    /// record, the echoed record replaces the local one.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after rolling back.
    pub async fn toggle_visibility(&mut self, id: &str) -> Result<&RemoteFileRecord> {
        let index = self.index_of(id)?;
        let previous = self.files[index].is_public;
        self.files[index].is_public = !previous;

        match self.api.toggle_public(id).await {
            Ok(response) => {
                if let Some(record) = response.file.filter(|r| r.id == id) {
                    self.files[index] = record;
                }
                let file = &self.files[index];
                log::info!(
                    "{} is now {}",
                    file.name,
                    if file.is_public { "public" } else { "private" }
                );
                Ok(file)
            }
            Err(e) => {
                log::warn!("Toggle failed for {id}, rolling back: {e}");
                self.files[index].is_public = previous;
                Err(e)
            }
        }
    }

    /// Deletes a file on the server, then drops it from the display copy.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error; the display copy is unchanged.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.api.delete_file(id).await?;
        self.files.retain(|f| f.id != id);
        log::info!("Deleted {id}");
        Ok(())
    }

    /// Downloads one of the user's files into `dest_dir`.
    ///
    /// The saved name comes from the display copy when known, otherwise from
    /// the server's metadata.
    ///
    /// # Errors
    ///
    /// Returns the transport, server, or I/O error.
    pub async fn download(&self, id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let name = match self.get(id) {
            Some(file) => file.name.clone(),
            None => self.api.get_file(id).await?.name,
        };
        let bytes = self.api.download(id, false).await?;
        self.save(dest_dir, &safe_file_name(&name, id), &bytes).await
    }

    /// Fetches the metadata of a shared file without signing in.
    ///
    /// # Errors
    ///
    /// Returns the server error, e.g. when the file is private.
    pub async fn public_file(&self, id: &str) -> Result<RemoteFileRecord> {
        self.api.public_file(id).await
    }

    /// Downloads a shared file without signing in.
    ///
    /// # Errors
    ///
    /// Returns the transport, server, or I/O error.
    pub async fn download_public(&self, id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let record = self.api.public_file(id).await?;
        let bytes = self.api.download(id, true).await?;
        self.save(dest_dir, &safe_file_name(&record.name, id), &bytes)
            .await
    }

    async fn save(&self, dest_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.fs.create_dir_all(dest_dir).await?;
        let path = dest_dir.join(name);
        self.fs.write(&path, bytes).await?;
        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
