use std::sync::Arc;

use crate::application::services::LinkService;
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::persistence::JsonFileLinkStore;

/// Shared handles built once from [`Config`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub link_service: Arc<LinkService<JsonFileLinkStore>>,
}

impl AppState {
    /// Opens the JSON link store and wires the link service on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the storage directory cannot be
    /// created, or [`AppError::Validation`] for an unusable code alphabet.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let store = Arc::new(JsonFileLinkStore::new(
            &config.storage_dir,
            &config.links_file,
        )?);
        let link_service = Arc::new(LinkService::from_config(store, &config)?);

        Ok(Self {
            config: Arc::new(config),
            link_service,
        })
    }
}
