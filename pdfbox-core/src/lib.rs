// PDFBox Core Library
//
// Runs Apache PDFBox subcommands as subprocesses against a materialized copy
// of the bundled jar. Streams are bridged through temp files because the
// toolkit only accepts file paths.

pub mod args;
pub mod bridge;
pub mod cancel;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod provider;
pub mod resolver;
pub mod scratch;
pub mod toolkit;
pub mod tools;

// Re-export main types for easy use
pub use args::{parse_tokens, Arg, READER, WRITER};
pub use cancel::CancelToken;
pub use config::ToolkitConfig;
pub use error::{BoxError, Error, Result};
pub use extract::{ExtractOptions, PageRange};
pub use provider::{
    ArchiveProvider, BytesArchiveProvider, DirectoryArchiveProvider, FileArchiveProvider,
    ARCHIVE_NAME,
};
pub use resolver::{FixedInterpreter, InterpreterResolver, JavaResolver};
pub use toolkit::ToolkitHandle;
