//! # Linkvault
//!
//! A personal URL shortener that keeps every link in one JSON file.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Link entities, the snapshot model and the store trait
//! - **Application Layer** ([`application`]) - Link lifecycle service and expiry sweeper
//! - **Infrastructure Layer** ([`infrastructure`]) - JSON file persistence
//! - **Utilities** ([`utils`]) - Short code generation and URL normalization
//!
//! ## Features
//!
//! - Per-owner links, deduplicated by normalized URL
//! - Optional click limits and a fixed time to live
//! - Atomic, lock-protected saves of the data file
//! - Background sweep of expired links
//!
//! ## Quick Start
//!
//! ```bash
//! export STORAGE_DIR="data"
//!
//! cargo run -- create example.com --owner alice --limit 5
//! cargo run -- open <CODE>
//! cargo run -- run   # sweep expired links until Ctrl-C
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod runtime;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::expiry_sweeper::{ExpirySweeper, SweeperHandle};
    pub use crate::application::services::{CreatedLink, LinkService};
    pub use crate::config::Config;
    pub use crate::domain::entities::{Link, LinkSnapshot, LinkStatus, NewLink};
    pub use crate::domain::repositories::LinkStore;
    pub use crate::error::AppError;
    pub use crate::infrastructure::persistence::JsonFileLinkStore;
    pub use crate::state::AppState;
    pub use crate::utils::code_generator::CodeGenerator;
}
