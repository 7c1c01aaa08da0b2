// Public modules
pub mod defaults;
pub mod error;
pub mod local_files;
pub mod scoring;
pub mod token_audit;
pub mod tokens;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
