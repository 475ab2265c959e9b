//! File-backed repository implementations.
//!
//! # Repositories
//!
//! - [`JsonFileLinkStore`] - Link snapshot stored as one JSON document

pub mod json_file_store;

pub use json_file_store::JsonFileLinkStore;
