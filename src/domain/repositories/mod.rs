//! Repository trait definitions for the domain layer.
//!
//! Traits define the storage contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for service unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkStore`] - Whole-snapshot load and save of all links

pub mod link_store;

pub use link_store::LinkStore;

#[cfg(test)]
pub use link_store::MockLinkStore;
