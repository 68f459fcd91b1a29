//! Loader for per-image SIFT keypoint datasets (`<name>.key`).
//!
//! A dataset starts with a `<count> 128` header, followed by one
//! `<row> <col> <scale> <orientation>` record per keypoint, each followed by
//! its descriptor split over 20- and 8-value chunks. Descriptors are
//! normalized to unit length while loading.

pub mod error;
pub mod parser;
pub mod loader;
pub mod writer;

pub use error::{LoadError, LoadResult};
pub use loader::{KeyFileLoader, KEY_EXTENSION};
pub use parser::{KeyFileParser, ParseState};
pub use writer::write_key_file;
