//! Archive providers
//!
//! The toolkit ships as a single jar. Where that jar comes from is the
//! caller's business: a directory on disk, an explicit file, or bytes
//! compiled into the binary. Providers only hand out a fresh reader per
//! `open` call; materializing it is [`crate::ToolkitHandle`]'s job.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Version-pinned file name of the bundled PDFBox application jar
pub const ARCHIVE_NAME: &str = "pdfbox-app-2.0.26.jar";

/// Source of the bundled archive, addressed by name
pub trait ArchiveProvider: Send + Sync {
    /// Open the archive called `name`.
    ///
    /// Unknown names fail with [`io::ErrorKind::NotFound`].
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Provider identifier for logging
    fn describe(&self) -> String;
}

fn not_found(name: &str, location: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("archive '{name}' not found in {location}"),
    )
}

/// Serves archives from a directory, one file per name
pub struct DirectoryArchiveProvider {
    dir: PathBuf,
}

impl DirectoryArchiveProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArchiveProvider for DirectoryArchiveProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        // Names are plain file names, never paths
        if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(not_found(name, &self.dir.display().to_string()));
        }
        let path = self.dir.join(name);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(not_found(name, &self.dir.display().to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

/// Serves a single jar on disk under a fixed archive name
pub struct FileArchiveProvider {
    name: String,
    path: PathBuf,
}

impl FileArchiveProvider {
    /// Serve `path` under the pinned [`ARCHIVE_NAME`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_name(ARCHIVE_NAME, path)
    }

    pub fn with_name(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl ArchiveProvider for FileArchiveProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        if name != self.name {
            return Err(not_found(name, &self.path.display().to_string()));
        }
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Serves an in-memory archive, e.g. one pulled in with `include_bytes!`
#[derive(Clone)]
pub struct BytesArchiveProvider {
    name: String,
    bytes: Arc<[u8]>,
}

impl BytesArchiveProvider {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Wrap a static byte slice under the pinned [`ARCHIVE_NAME`]
    pub fn embedded(bytes: &'static [u8]) -> Self {
        Self::new(ARCHIVE_NAME, bytes)
    }
}

/// Cursor over a shared byte buffer
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ArchiveProvider for BytesArchiveProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        if name != self.name {
            return Err(not_found(name, "embedded archives"));
        }
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&self.bytes)))))
    }

    fn describe(&self) -> String {
        format!("embedded {} ({} bytes)", self.name, self.bytes.len())
    }
}
