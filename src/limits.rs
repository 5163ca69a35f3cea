//! Resource limits for loading inventory documents
//!
//! Inventory exports can be large, and they are parsed fully into memory.
//! By default a document is bounded only by available memory; a size cap can
//! be configured so a corrupt or hostile file fails early instead.

use crate::error::{Error, Result};

/// Limits applied while loading and parsing a document
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum decompressed document size in bytes (None for unbounded)
    pub max_xml_size: Option<usize>,

    /// Maximum number of attributes on a single element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: None,
            max_attributes: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: Some(10 * 1024 * 1024), // 10 MB
            max_attributes: 100,
        }
    }

    /// Create permissive limits for very large national inventories
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10000,
            max_xml_size: None,
            max_attributes: 10000,
        }
    }

    /// Cap the decompressed document size
    pub fn with_max_xml_size(mut self, max: Option<usize>) -> Self {
        self.max_xml_size = max;
        self
    }

    /// Check if element depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if document size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        match self.max_xml_size {
            Some(max) if size > max => Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, max
            ))),
            _ => Ok(()),
        }
    }

    /// Check if the attribute count of one element is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "Attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }
}
