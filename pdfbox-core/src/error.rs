//! Error taxonomy for toolkit operations
//!
//! Every public operation returns [`Result`]. Variants map one-to-one onto the
//! failure classes a caller may want to react to differently; anything that
//! is just "an I/O step failed" lands in [`Error::Io`] with a context string
//! naming the step.

use std::io;
use std::path::PathBuf;

/// Boxed error returned by caller-supplied callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Interpreter or archive could not be made ready
    #[error("setup failed: {context}")]
    Setup {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A temporary file or directory could not be removed
    #[error("failed to remove {}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Caller misuse: missing slot, forbidden slot or empty argument list
    #[error("invalid arguments for {command}: {reason}")]
    Argument { command: String, reason: String },

    /// Subprocess could not be spawned or exited unsuccessfully
    #[error("failed to execute {command}: {source} ({})", output.trim())]
    Execution {
        command: String,
        #[source]
        source: io::Error,
        /// Interleaved stdout and stderr of the child
        output: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// The per-file extraction callback failed
    #[error("image callback for {relative_path} failed")]
    Callback {
        relative_path: String,
        #[source]
        source: BoxError,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A failure followed by a failed cleanup; the primary error comes first
    #[error("{primary}; cleanup also failed: {cleanup}")]
    WithCleanup {
        primary: Box<Error>,
        cleanup: Box<Error>,
    },
}

impl Error {
    pub(crate) fn setup(context: impl Into<String>, source: io::Error) -> Self {
        Error::Setup {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn argument(command: &str, reason: impl Into<String>) -> Self {
        Error::Argument {
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// The error that caused the call to fail, unwrapping cleanup failures
    pub fn primary(&self) -> &Error {
        match self {
            Error::WithCleanup { primary, .. } => primary.primary(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.primary(), Error::Cancelled)
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.primary(), Error::Argument { .. })
    }

    /// Attach a cleanup outcome to an operation outcome.
    ///
    /// A cleanup failure never hides the primary error: it becomes
    /// [`Error::WithCleanup`] when the operation already failed, and is
    /// returned on its own only when the operation succeeded.
    pub fn with_cleanup<T>(primary: Result<T>, cleanup: Result<()>) -> Result<T> {
        match primary {
            Ok(value) => cleanup.map(|()| value),
            Err(primary) => Err(primary.and_cleanup(cleanup)),
        }
    }

    /// Fold a cleanup outcome into an error that is already being returned
    pub fn and_cleanup(self, cleanup: Result<()>) -> Error {
        match cleanup {
            Ok(()) => self,
            Err(cleanup) => Error::WithCleanup {
                primary: Box::new(self),
                cleanup: Box::new(cleanup),
            },
        }
    }
}
