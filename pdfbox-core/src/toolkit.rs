//! Toolkit handle: one materialized jar plus the interpreter that runs it
//!
//! # Lifecycle
//! `create` copies the archive from an [`ArchiveProvider`] into a fresh temp
//! file and resolves the interpreter. The copy lives exactly as long as the
//! handle: `close` removes it and reports failure, dropping the handle
//! removes it best-effort.
//!
//! # Concurrency
//! Handles are independent of each other and hold only immutable paths, so a
//! handle can be shared across threads. Every call creates its own private
//! temp files and its own subprocess.

use crate::cancel::CancelToken;
use crate::config::ToolkitConfig;
use crate::error::{Error, Result};
use crate::provider::{ArchiveProvider, ARCHIVE_NAME};
use crate::resolver::InterpreterResolver;
use crate::scratch::ScratchFile;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for every temp file and directory the toolkit creates
pub(crate) const SCRATCH_PREFIX: &str = "pdfbox";

/// A live, disk-resident toolkit instance
#[derive(Debug)]
pub struct ToolkitHandle {
    interpreter: PathBuf,
    archive: ScratchFile,
    scratch_dir: PathBuf,
    default_timeout: Option<Duration>,
}

impl ToolkitHandle {
    /// Materialize the pinned archive and resolve the interpreter with default settings
    pub fn create(
        provider: &dyn ArchiveProvider,
        resolver: &dyn InterpreterResolver,
    ) -> Result<Self> {
        Self::create_with_config(provider, resolver, &ToolkitConfig::default())
    }

    /// Materialize the archive using the scratch directory and timeout from `config`
    ///
    /// # Errors
    /// [`Error::Setup`] when the interpreter cannot be resolved, the archive
    /// cannot be opened, or its temp copy cannot be created, written or closed.
    pub fn create_with_config(
        provider: &dyn ArchiveProvider,
        resolver: &dyn InterpreterResolver,
        config: &ToolkitConfig,
    ) -> Result<Self> {
        let interpreter = resolver
            .resolve()
            .map_err(|e| Error::setup("failed to locate java", e))?;

        let archive_name = config.archive_name.as_deref().unwrap_or(ARCHIVE_NAME);
        let mut reader = provider.open(archive_name).map_err(|e| {
            Error::setup(
                format!("failed to open {} from {}", archive_name, provider.describe()),
                e,
            )
        })?;

        let scratch_dir = config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        // Materialization is not cancellable: the archive is the toolkit itself
        let archive = ScratchFile::from_reader(
            &scratch_dir,
            SCRATCH_PREFIX,
            ".jar",
            &mut reader,
            &CancelToken::new(),
        )
        .map_err(|e| match e {
            Error::Io { context, source } => {
                Error::setup(format!("failed to materialize {archive_name}: {context}"), source)
            }
            other => other,
        })?;

        log::info!(
            "🚀 PDFBox toolkit ready (java: {}, jar: {})",
            interpreter.display(),
            archive.path().display()
        );

        Ok(Self {
            interpreter,
            archive,
            scratch_dir,
            default_timeout: config.timeout(),
        })
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Filesystem path of the materialized archive
    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    /// Directory in which per-call temp files are created
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Apply the configured default timeout, if any, to `cancel`
    pub(crate) fn effective_token(&self, cancel: &CancelToken) -> CancelToken {
        match self.default_timeout {
            Some(timeout) => cancel.child_with_timeout(timeout),
            None => cancel.clone(),
        }
    }

    /// Remove the materialized archive.
    ///
    /// # Errors
    /// [`Error::Cleanup`] if the file is already gone or cannot be deleted.
    pub fn close(self) -> Result<()> {
        log::debug!("🧹 removing {}", self.archive.path().display());
        self.archive.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::BytesArchiveProvider;
    use crate::resolver::FixedInterpreter;
    use std::io::{self, Read};

    struct MissingArchive;

    impl ArchiveProvider for MissingArchive {
        fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
            Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }

        fn describe(&self) -> String {
            "nowhere".to_string()
        }
    }

    fn fake_java(dir: &Path) -> FixedInterpreter {
        let java = dir.join("java");
        std::fs::write(&java, b"").unwrap();
        FixedInterpreter::new(java)
    }

    fn config_in(dir: &Path) -> ToolkitConfig {
        ToolkitConfig {
            scratch_dir: Some(dir.to_path_buf()),
            ..ToolkitConfig::default()
        }
    }

    #[test]
    fn test_archive_copied_byte_for_byte() {
        let root = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
        let provider = BytesArchiveProvider::new(ARCHIVE_NAME, bytes.clone());

        let handle =
            ToolkitHandle::create_with_config(&provider, &fake_java(root.path()), &config_in(root.path()))
                .unwrap();

        assert_eq!(std::fs::read(handle.archive_path()).unwrap(), bytes);
        assert!(handle.archive_path().starts_with(root.path()));
        handle.close().unwrap();
    }

    #[test]
    fn test_create_then_close_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        let provider = BytesArchiveProvider::embedded(b"PK fake jar");

        let handle =
            ToolkitHandle::create_with_config(&provider, &fake_java(root.path()), &config_in(&scratch))
                .unwrap();
        let path = handle.archive_path().to_path_buf();
        assert!(path.is_file());

        handle.close().unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_close_after_external_removal_fails() {
        let root = tempfile::tempdir().unwrap();
        let provider = BytesArchiveProvider::embedded(b"jar");
        let handle =
            ToolkitHandle::create_with_config(&provider, &fake_java(root.path()), &config_in(root.path()))
                .unwrap();

        std::fs::remove_file(handle.archive_path()).unwrap();
        assert!(matches!(handle.close(), Err(Error::Cleanup { .. })));
    }

    #[test]
    fn test_drop_removes_archive() {
        let root = tempfile::tempdir().unwrap();
        let provider = BytesArchiveProvider::embedded(b"jar");
        let handle =
            ToolkitHandle::create_with_config(&provider, &fake_java(root.path()), &config_in(root.path()))
                .unwrap();
        let path = handle.archive_path().to_path_buf();

        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_interpreter_is_setup_error() {
        let root = tempfile::tempdir().unwrap();
        let provider = BytesArchiveProvider::embedded(b"jar");
        let resolver = FixedInterpreter::new(root.path().join("no-java"));

        let err = ToolkitHandle::create(&provider, &resolver).unwrap_err();
        assert!(matches!(err, Error::Setup { .. }));
    }

    #[test]
    fn test_missing_archive_is_setup_error() {
        let root = tempfile::tempdir().unwrap();
        let err = ToolkitHandle::create_with_config(
            &MissingArchive,
            &fake_java(root.path()),
            &config_in(root.path()),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Setup { .. }));
        // Only the fake java binary remains
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_scratch_dir_is_setup_error() {
        let root = tempfile::tempdir().unwrap();
        let provider = BytesArchiveProvider::embedded(b"jar");
        let err = ToolkitHandle::create_with_config(
            &provider,
            &fake_java(root.path()),
            &config_in(&root.path().join("does-not-exist")),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Setup { .. }));
    }
}
