#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use linkvault::application::services::LinkService;
use linkvault::domain::entities::{Link, NewLink};
use linkvault::domain::repositories::LinkStore;
use linkvault::infrastructure::persistence::JsonFileLinkStore;
use linkvault::utils::code_generator::CodeGenerator;

pub const BASE_URL: &str = "clck.ru/";
pub const LINKS_FILE: &str = "user_links.json";

/// Store and service sharing one data file in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<JsonFileLinkStore>,
    pub service: Arc<LinkService<JsonFileLinkStore>>,
}

impl TestEnv {
    pub fn data_file(&self) -> std::path::PathBuf {
        self.dir.path().join(LINKS_FILE)
    }
}

pub fn create_test_env() -> TestEnv {
    create_test_env_with(CodeGenerator::default())
}

pub fn create_test_env_with(generator: CodeGenerator) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileLinkStore::new(dir.path(), LINKS_FILE).unwrap());
    let service = Arc::new(LinkService::new(
        store.clone(),
        generator,
        BASE_URL,
        Duration::hours(24),
    ));

    TestEnv { dir, store, service }
}

/// A link whose TTL ran out an hour ago.
pub fn expired_link(code: &str, url: &str, owner: &str) -> Link {
    Link::new(NewLink {
        short_code: code.to_string(),
        original_url: url.to_string(),
        owner_id: owner.to_string(),
        click_limit: None,
        created_at: Utc::now() - Duration::hours(25),
        ttl: Duration::hours(24),
    })
}

/// Writes `link` straight into the data file, bypassing the service.
pub async fn insert_link(store: &JsonFileLinkStore, link: Link) {
    let mut snapshot = store.load().await.unwrap();
    snapshot.insert(link);
    store.save(&snapshot).await.unwrap();
}
