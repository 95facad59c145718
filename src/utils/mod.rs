//! Utility modules for encoding and file I/O.

pub mod encoding;
pub mod file_helper;
