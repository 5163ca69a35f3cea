//! Document loading and saving
//!
//! This module moves documents between disk and memory. Paths ending in
//! `.gz` are gzip-framed transparently; file handles are scoped to a single
//! call and closed on every exit path.

use crate::compression::Compression;
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Resource loader for inventory documents
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Read the decompressed bytes of a document
    pub fn load_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| {
            Error::Resource(format!("failed to open '{}': {}", path.display(), e))
        })?;

        // Every gzip member is decoded, so concatenated and bgzip files load whole.
        let mut reader: Box<dyn Read> = match Compression::from_path(path) {
            Compression::Gzip => Box::new(MultiGzDecoder::new(file)),
            Compression::Plain => Box::new(file),
        };

        // With a cap, read one byte past it so oversized payloads are
        // detected without decompressing them completely.
        let mut content = Vec::new();
        let read = match self.limits.max_xml_size {
            Some(max) => reader.take(max as u64 + 1).read_to_end(&mut content),
            None => reader.read_to_end(&mut content),
        };
        read.map_err(|e| {
            Error::Resource(format!("failed to read '{}': {}", path.display(), e))
        })?;

        self.limits.check_xml_size(content.len())?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "read document");
        Ok(content)
    }

    /// Load and parse a document
    pub fn load(&self, path: &Path) -> Result<Document> {
        let content = self.load_bytes(path)?;
        let doc = Document::parse_with_limits(&content, &self.limits)?;
        tracing::info!(path = %path.display(), "loaded document");
        Ok(doc)
    }

    /// Serialize a document to `path`, gzip-framed for `.gz` paths
    pub fn save(&self, path: &Path, doc: &Document) -> Result<()> {
        let bytes = doc.to_bytes()?;

        let file = File::create(path).map_err(|e| {
            Error::Resource(format!("failed to create '{}': {}", path.display(), e))
        })?;
        let writer = BufWriter::new(file);

        let written = match Compression::from_path(path) {
            Compression::Gzip => write_gzip(writer, &bytes),
            Compression::Plain => write_plain(writer, &bytes),
        };
        written.map_err(|e| {
            Error::Resource(format!("failed to write '{}': {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }
}

fn write_gzip<W: Write>(writer: W, bytes: &[u8]) -> std::io::Result<()> {
    let mut encoder = GzEncoder::new(writer, flate2::Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()?.flush()
}

fn write_plain<W: Write>(mut writer: W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes)?;
    writer.flush()
}

/// Load a document with default limits
pub fn load(path: impl AsRef<Path>) -> Result<Document> {
    Loader::new().load(path.as_ref())
}

/// Save a document with default settings
pub fn save(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    Loader::new().save(path.as_ref(), doc)
}
