//! Upload staging: the bounded batch of files picked before a submission.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::admission::Rejection;
use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// Batch size limits used by the two upload surfaces.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimit;

impl BatchLimit {
    /// Limit on the dedicated upload page.
    pub const UPLOAD_PAGE: usize = 5;
    /// Limit on the dashboard quick-upload panel.
    pub const DASHBOARD: usize = 10;
}

/// Where the bytes of a staged file live until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file on the local disk, read when the batch is sent.
    Path(PathBuf),
    /// Contents already held in memory.
    Memory(Bytes),
}

/// A file selected for upload but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// File name sent as the multipart filename.
    pub name: String,
    /// Size in bytes at selection time.
    pub size: u64,
    /// Reference to the content.
    pub source: FileSource,
}

impl StagedFile {
    /// Stages an in-memory buffer under `name`.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let contents = contents.into();
        Self {
            name: name.into(),
            size: contents.len() as u64,
            source: FileSource::Memory(contents),
        }
    }

    /// Stages a file on disk. The content is not read until submission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `path` is not a regular file.
    pub async fn from_path(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let size = fs
            .file_size(path)
            .await
            .ok_or_else(|| Error::NotFound(path.display().to_string()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            name,
            size,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Loads the staged content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a path-backed file can no longer be read.
    pub async fn contents(&self, fs: &dyn FileSystem) -> Result<Bytes> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => Ok(Bytes::from(fs.read(path).await?)),
        }
    }
}

/// An ordered batch of staged files that never grows past its limit.
///
/// Files are identified by position; duplicate names are allowed.
#[derive(Debug, Clone)]
pub struct StagedBatch {
    files: Vec<StagedFile>,
    max_batch: usize,
}

impl StagedBatch {
    /// Creates an empty batch holding at most `max_batch` files.
    #[must_use]
    pub const fn new(max_batch: usize) -> Self {
        Self {
            files: Vec::new(),
            max_batch,
        }
    }

    /// Builds a batch without enforcing the limit.
    #[cfg(test)]
    pub(crate) const fn unchecked(files: Vec<StagedFile>, max_batch: usize) -> Self {
        Self { files, max_batch }
    }

    /// Appends a selection to the batch.
    ///
    /// The whole selection is refused if it would push the batch past its
    /// limit; the batch is left untouched in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::TooManyFiles`] on overflow.
    pub fn add_files(&mut self, selection: Vec<StagedFile>) -> std::result::Result<(), Rejection> {
        if self.files.len() + selection.len() > self.max_batch {
            log::debug!(
                "Refusing {} file(s): batch holds {} of {}",
                selection.len(),
                self.files.len(),
                self.max_batch
            );
            return Err(Rejection::TooManyFiles {
                max: self.max_batch,
            });
        }
        self.files.extend(selection);
        Ok(())
    }

    /// Removes the file at `index`, or does nothing if out of range.
    pub fn remove_file(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Empties the batch.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Number of staged files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The batch limit.
    #[must_use]
    pub const fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Total size of the staged files in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// The staged files in selection order.
    #[must_use]
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    /// Iterates over the staged files.
    pub fn iter(&self) -> std::slice::Iter<'_, StagedFile> {
        self.files.iter()
    }
}
