//! Compression framing selected from a file path
//!
//! A `.gz` suffix (any letter case) means the document is gzip-framed on
//! disk; anything else is read and written as plain bytes. The choice has no
//! effect on the parsed tree.

use std::path::Path;

/// On-disk framing of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain XML bytes
    Plain,
    /// gzip-compressed XML
    Gzip,
}

impl Compression {
    /// Select framing from the path's final extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            _ => Compression::Plain,
        }
    }

    /// Check if this is gzip framing
    pub fn is_gzip(&self) -> bool {
        matches!(self, Compression::Gzip)
    }
}
