//! Utility functions for code generation and URL processing.
//!
//! - [`code_generator`] - Short code generation with collision handling
//! - [`url_normalizer`] - URL normalization and sanitization

pub mod code_generator;
pub mod url_normalizer;
