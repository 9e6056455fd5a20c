// All toolkit functionality is in pdfbox-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod archive_manager;

// Re-export core types for convenience
pub use pdfbox_core::*;

// Re-export CLI utilities
pub use archive_manager::{verify_archive, ArchiveManager};
