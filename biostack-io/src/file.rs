//! Scoped ownership of one backing HDF5 file.

use crate::{Error, Result};
use biostack_core::OpenMode;
use hdf5::file::FileCloseDegree;
use hdf5::File;
use std::path::{Path, PathBuf};

/// Exclusive owner of the HDF5 file behind a stack.
///
/// The file is opened eagerly and released by [`StackFile::close`] or, on
/// any other exit path, when the value is dropped.
#[derive(Debug)]
pub struct StackFile {
    path: PathBuf,
    mode: OpenMode,
    file: Option<File>,
}

impl StackFile {
    /// Opens `path` with the given mode.
    ///
    /// Closing the file also invalidates every dataset and attribute handle
    /// obtained through it.
    ///
    /// # Errors
    /// Returns [`Error::Access`] if the path cannot be opened in `mode`,
    /// e.g. a missing file in [`OpenMode::Read`].
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut builder = File::with_options();
        builder.with_fapl(|fapl| fapl.fclose_degree(FileCloseDegree::Strong));
        let opened = match mode {
            OpenMode::Read => builder.open(&path),
            OpenMode::ReadWrite => builder.open_rw(&path),
            OpenMode::Append => builder.append(&path),
        };
        let file = opened.map_err(|source| Error::Access {
            path: path.clone(),
            mode,
            source,
        })?;
        log::debug!("opened {} (mode {mode})", path.display());
        Ok(Self {
            path,
            mode,
            file: Some(file),
        })
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the file was opened with.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns true until the file is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Live file handle.
    ///
    /// # Errors
    /// Returns [`Error::Closed`] after [`StackFile::close`].
    pub fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| Error::Closed {
            path: self.path.clone(),
        })
    }

    /// Flushes pending writes and releases the file. No-op if already closed.
    ///
    /// # Errors
    /// Returns an error if flushing fails; the handle is released regardless.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let flushed = if self.mode.is_writable() {
            file.flush()
        } else {
            Ok(())
        };
        let closed = file.close();
        log::debug!("closed {}", self.path.display());
        flushed.and(closed).map_err(Error::from)
    }
}

impl Drop for StackFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("failed to close {}: {e}", self.path.display());
        }
    }
}
