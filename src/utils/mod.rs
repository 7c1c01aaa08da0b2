//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - File I/O with consistent error handling
//! - `parser` - Line-oriented text extraction

pub mod io;
pub mod parser;
