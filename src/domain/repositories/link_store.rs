//! Repository trait for whole-snapshot link persistence.

use crate::domain::entities::LinkSnapshot;
use crate::error::AppError;
use async_trait::async_trait;

/// Storage interface for the link snapshot.
///
/// The store is read and written as a unit: callers load the full snapshot,
/// mutate it in memory and save it back. Each call is atomic on its own, but
/// nothing is held between a `load` and the following `save`; serializing the
/// whole sequence is the caller's job (see
/// [`crate::application::services::LinkService`]).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::JsonFileLinkStore`] - JSON data file
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/json_file_store.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Reads the current snapshot.
    ///
    /// A store that has never been written yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CorruptStore`] if the stored data cannot be parsed.
    /// Returns [`AppError::Storage`] on I/O errors.
    async fn load(&self) -> Result<LinkSnapshot, AppError>;

    /// Replaces the stored snapshot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on I/O errors. A failed save leaves the
    /// previously stored snapshot intact.
    async fn save(&self, snapshot: &LinkSnapshot) -> Result<(), AppError>;
}
