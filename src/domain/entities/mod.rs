//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL owned by one identity
//! - [`LinkSnapshot`] - The whole store: owner → original URL → link
//!
//! `NewLink` carries the inputs for creating a link; [`LinkStatus`] reports
//! whether a link can still be resolved.

pub mod link;
pub mod snapshot;

pub use link::{Link, LinkStatus, NewLink};
pub use snapshot::LinkSnapshot;
