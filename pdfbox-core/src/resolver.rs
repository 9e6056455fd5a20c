//! Interpreter resolution
//!
//! The toolkit is a jar, so every call needs a `java` executable. Resolution
//! is injected through [`InterpreterResolver`] so the core never probes the
//! host on its own; tests substitute a script for the real runtime.

use std::io;
use std::path::{Path, PathBuf};

/// Locates the runtime used to run the archive
pub trait InterpreterResolver: Send + Sync {
    /// Path of an executable interpreter.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] when nothing suitable exists.
    fn resolve(&self) -> io::Result<PathBuf>;
}

fn java_binary_name() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

fn ensure_file(path: &Path) -> io::Result<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("interpreter not found at {}: {e}", path.display()),
        )
    })?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("interpreter at {} is not a file", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// A caller-chosen interpreter path, validated on resolve
#[derive(Debug, Clone)]
pub struct FixedInterpreter {
    path: PathBuf,
}

impl FixedInterpreter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InterpreterResolver for FixedInterpreter {
    fn resolve(&self) -> io::Result<PathBuf> {
        ensure_file(&self.path)
    }
}

/// Finds `java` the usual ways: explicit path, `JAVA_HOME`, then `PATH`
#[derive(Debug, Clone, Default)]
pub struct JavaResolver {
    explicit: Option<PathBuf>,
    java_home: Option<PathBuf>,
    search_path: bool,
}

impl JavaResolver {
    /// Resolver reading `JAVA_HOME` from the environment and falling back to `PATH`
    pub fn from_env() -> Self {
        let java_home = std::env::var_os("JAVA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            explicit: None,
            java_home,
            search_path: true,
        }
    }

    /// Prefer this interpreter over anything found in the environment
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_java_home(mut self, java_home: impl Into<PathBuf>) -> Self {
        self.java_home = Some(java_home.into());
        self
    }

    pub fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }
}

impl InterpreterResolver for JavaResolver {
    fn resolve(&self) -> io::Result<PathBuf> {
        // An explicit choice is never silently replaced
        if let Some(explicit) = &self.explicit {
            return ensure_file(explicit);
        }

        if let Some(home) = &self.java_home {
            let candidate = home.join("bin").join(java_binary_name());
            if candidate.is_file() {
                return Ok(candidate);
            }
            log::debug!("JAVA_HOME set but {} missing", candidate.display());
        }

        if self.search_path {
            if let Ok(found) = which::which("java") {
                return Ok(found);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "could not locate a java executable (set JAVA_HOME or add java to PATH)",
        ))
    }
}
