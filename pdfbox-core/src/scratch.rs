//! Scoped temporary files and directories
//!
//! Every toolkit call that needs a file on disk goes through here: create,
//! fill, hand out the path, remove. Removal happens exactly once, either
//! explicitly (so failures can be reported) or on drop as a fallback.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::{Builder, TempDir, TempPath};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Copy `reader` into `writer`, checking `cancel` between chunks
pub(crate) fn copy_with_cancel(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    cancel: &CancelToken,
    context: &str,
) -> Result<u64> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;

    loop {
        cancel.check()?;
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(format!("failed to read {context}"), e)),
        };
        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| Error::io(format!("failed to write {context}"), e))?;
        copied += bytes_read as u64;
    }

    writer
        .flush()
        .map_err(|e| Error::io(format!("failed to flush {context}"), e))?;
    Ok(copied)
}

/// A closed temporary file that is deleted when released
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    /// Create an empty temporary file in `dir`
    pub fn create(dir: &Path, prefix: &str, suffix: &str) -> Result<Self> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| Error::io(format!("failed to create tempfile in {}", dir.display()), e))?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Create a temporary file in `dir` holding the full contents of `reader`
    pub fn from_reader(
        dir: &Path,
        prefix: &str,
        suffix: &str,
        reader: &mut dyn Read,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let mut file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| Error::io(format!("failed to create tempfile in {}", dir.display()), e))?;

        let context = format!("tempfile {}", file.path().display());
        let copied = copy_with_cancel(reader, &mut file, cancel, &context);

        // Closing the handle here; the path stays until released
        let scratch = Self {
            path: file.into_temp_path(),
        };
        match copied {
            Ok(bytes) => {
                log::trace!("📝 wrote {} bytes to {}", bytes, scratch.path().display());
                Ok(scratch)
            }
            Err(e) => Err(e.and_cleanup(scratch.remove())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file, reporting failure as [`Error::Cleanup`]
    pub fn remove(self) -> Result<()> {
        let path = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|source| Error::Cleanup { path, source })
    }
}

/// A temporary directory removed recursively when released
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn create(parent: &Path, prefix: &str) -> Result<Self> {
        let dir = Builder::new().prefix(prefix).tempdir_in(parent).map_err(|e| {
            Error::io(
                format!("failed to create tempdir in {}", parent.display()),
                e,
            )
        })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Recursively delete the directory, reporting failure as [`Error::Cleanup`]
    pub fn remove(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| Error::Cleanup { path, source })
    }
}

/// Run `f` with the path of a temp file filled from `reader`, then remove it.
///
/// The file is removed on every exit path. A failed removal is reported
/// without masking an error returned by `f`.
pub fn with_input_file<T>(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    reader: &mut dyn Read,
    cancel: &CancelToken,
    f: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let file = ScratchFile::from_reader(dir, prefix, suffix, reader, cancel)?;
    let result = f(file.path());
    Error::with_cleanup(result, file.remove())
}

/// Run `f` with the path of a fresh, empty temp file, then remove it
pub fn with_empty_file<T>(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    f: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let file = ScratchFile::create(dir, prefix, suffix)?;
    let result = f(file.path());
    Error::with_cleanup(result, file.remove())
}

/// Run `f` with a fresh temp directory, then remove it recursively
pub fn with_dir<T>(parent: &Path, prefix: &str, f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let dir = ScratchDir::create(parent, prefix)?;
    let result = f(dir.path());
    Error::with_cleanup(result, dir.remove())
}
