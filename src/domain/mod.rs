//! Domain layer containing business entities and storage contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Links and the owner-grouped snapshot that holds them
//! - [`repositories`] - Storage trait definitions
//!
//! The domain layer has no dependency on the file format or on the services
//! built on top of it (see [`crate::application::services`]).

pub mod entities;
pub mod repositories;
