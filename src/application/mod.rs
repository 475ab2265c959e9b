//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations on top of the [`LinkStore`]
//! trait and exposes a clean API to the command line front end.
//!
//! # Components
//!
//! - [`services::link_service::LinkService`] - Link creation, resolution and removal
//! - [`expiry_sweeper::ExpirySweeper`] - Periodic background removal of expired links
//!
//! [`LinkStore`]: crate::domain::repositories::LinkStore

pub mod expiry_sweeper;
pub mod services;
