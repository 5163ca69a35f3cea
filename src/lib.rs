//! # sc3ml-repair
//!
//! Repair SC3ML seismic inventory documents so that strict consumers can
//! read them.
//!
//! Exports from inventory databases sometimes carry station coordinates as
//! child elements instead of attributes, as placeholder text such as `N/A`,
//! or not at all. Streams may lack orientation values or give their sample
//! rate only as a numerator/denominator pair. This crate rewrites such a
//! document so that:
//!
//! - every `station` under a `network` has numeric `latitude`, `longitude`
//!   and `elevation` attributes (mirrored into child elements);
//! - optionally, every `stream` has numeric `azimuth`, `dip` and
//!   `sampleRate` children;
//! - `code` values that only exist as child text are promoted to attributes.
//!
//! Elements are matched by local name, ignoring namespace and letter case.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sc3ml_repair::{loaders::Loader, normalize::NormalizeOptions, verify::repair};
//! use std::path::Path;
//!
//! let options = NormalizeOptions::default().with_fix_channels(true);
//! let report = repair(&Loader::new(), Path::new("inventory.xml.gz"), Path::new("fixed.xml"), options)?;
//! println!("{}", report);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Document model and I/O
pub mod namespaces;
pub mod compression;
pub mod documents;
pub mod loaders;

// Repair pass
pub mod numeric;
pub mod normalize;
pub mod verify;

// Consumer side
pub mod inventory;

// Re-exports for convenience
pub use documents::{Document, Element};
pub use error::{Error, Result};
pub use loaders::Loader;
pub use normalize::{normalize_document, NormalizeOptions, NormalizeStats};
pub use verify::{repair, RepairReport, StationExample, VerifyReport};

/// Version of the sc3ml-repair library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
