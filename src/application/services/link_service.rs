//! Link lifecycle service: create, resolve, list, delete and expire.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::entities::{Link, LinkStatus, NewLink};
use crate::domain::repositories::LinkStore;
use crate::error::AppError;
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_normalizer::normalize_url;

/// Result of [`LinkService::create`].
#[derive(Debug, Clone)]
pub struct CreatedLink {
    /// Public form: base URL followed by the code.
    pub short_url: String,
    pub link: Link,
    /// False when the owner already had a link for this URL.
    pub created: bool,
}

impl CreatedLink {
    pub fn code(&self) -> &str {
        &self.link.short_code
    }
}

/// Outcome of the mutation step of a resolve transaction.
enum Resolution {
    Resolved { url: String, clicks: u32 },
    Expired { deactivated: bool },
    LimitExceeded { deactivated: bool, clicks: u32 },
}

/// Service owning every read-modify-write of the link store.
///
/// Each mutating operation is one transaction: load the full snapshot, change
/// it in memory, save it back. Transactions are serialized by an internal
/// mutex, so concurrent callers sharing one service never overwrite each
/// other's changes.
pub struct LinkService<S: LinkStore> {
    store: Arc<S>,
    generator: CodeGenerator,
    base_url: String,
    ttl: Duration,
    transaction_lock: Mutex<()>,
}

impl<S: LinkStore> LinkService<S> {
    /// Creates a new link service.
    pub fn new(
        store: Arc<S>,
        generator: CodeGenerator,
        base_url: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            base_url: base_url.into(),
            ttl,
            transaction_lock: Mutex::new(()),
        }
    }

    /// Creates a service with generator, base URL and TTL taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the configured alphabet or code
    /// length cannot build a [`CodeGenerator`].
    pub fn from_config(store: Arc<S>, config: &Config) -> Result<Self, AppError> {
        let generator = CodeGenerator::new(&config.code_alphabet, config.code_length)?;
        Ok(Self::new(
            store,
            generator,
            config.base_url.clone(),
            config.default_ttl(),
        ))
    }

    /// Shortens `url` for `owner_id`.
    ///
    /// A URL without a scheme gets `https://`. If the owner already has a
    /// link for the same normalized URL, that link is returned unchanged and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - URL is empty or malformed
    /// - owner is empty
    /// - `click_limit` is zero
    ///
    /// Returns [`AppError::CapacityExceeded`] if no free code is left, and
    /// store errors from loading or saving.
    pub async fn create(
        &self,
        url: &str,
        owner_id: &str,
        click_limit: Option<u32>,
    ) -> Result<CreatedLink, AppError> {
        let owner_id = normalize_owner(owner_id)?;
        if click_limit == Some(0) {
            return Err(AppError::bad_request(
                "Click limit must be a positive number",
                json!({ "click_limit": 0 }),
            ));
        }

        let original_url = normalize_url(url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let _transaction = self.transaction_lock.lock().await;
        let mut snapshot = self.store.load().await?;

        if let Some(existing) = snapshot.find_by_url(owner_id, &original_url) {
            debug!(code = %existing.short_code, owner = owner_id, "Reusing existing short link");
            return Ok(CreatedLink {
                short_url: self.short_url(&existing.short_code),
                link: existing.clone(),
                created: false,
            });
        }

        let code = self
            .generator
            .generate(owner_id, &original_url, &snapshot.all_codes())?;

        let link = Link::new(NewLink {
            short_code: code,
            original_url,
            owner_id: owner_id.to_string(),
            click_limit,
            created_at: Utc::now(),
            ttl: self.ttl,
        });
        snapshot.insert(link.clone());
        self.store.save(&snapshot).await?;

        info!(
            code = %link.short_code,
            owner = owner_id,
            expires_at = %link.expires_at,
            "Created short link"
        );

        Ok(CreatedLink {
            short_url: self.short_url(&link.short_code),
            link,
            created: true,
        })
    }

    /// Resolves `code` to its original URL and counts one click.
    ///
    /// Expiry is checked before the click limit. Resolving an expired link
    /// deactivates it; a successful resolve that uses up the limit also
    /// deactivates it. Every state change is persisted before returning.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no link has this code
    /// - [`AppError::Expired`] if the link's TTL has elapsed
    /// - [`AppError::LimitExceeded`] if the click limit was already reached
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let _transaction = self.transaction_lock.lock().await;
        let mut snapshot = self.store.load().await?;
        let now = Utc::now();

        let resolution = match snapshot.find_by_code_mut(code) {
            None => {
                return Err(AppError::not_found(
                    "Short link not found",
                    json!({ "code": code }),
                ));
            }
            Some(link) if link.is_expired_at(now) => Resolution::Expired {
                deactivated: std::mem::replace(&mut link.active, false),
            },
            Some(link) if link.is_click_limit_reached() => Resolution::LimitExceeded {
                deactivated: std::mem::replace(&mut link.active, false),
                clicks: link.click_count,
            },
            Some(link) => {
                link.record_click();
                Resolution::Resolved {
                    url: link.original_url.clone(),
                    clicks: link.click_count,
                }
            }
        };

        match resolution {
            Resolution::Resolved { url, clicks } => {
                self.store.save(&snapshot).await?;
                debug!(code, clicks, "Resolved short link");
                Ok(url)
            }
            Resolution::Expired { deactivated } => {
                if deactivated {
                    self.store.save(&snapshot).await?;
                    info!(code, "Deactivated expired short link");
                }
                Err(AppError::expired(
                    "Short link has expired",
                    json!({ "code": code }),
                ))
            }
            Resolution::LimitExceeded {
                deactivated,
                clicks,
            } => {
                if deactivated {
                    self.store.save(&snapshot).await?;
                }
                Err(AppError::limit_exceeded(
                    "Short link click limit reached",
                    json!({ "code": code, "clicks": clicks }),
                ))
            }
        }
    }

    /// Lists the owner's links, oldest first. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `owner_id` is blank.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Link>, AppError> {
        let owner_id = normalize_owner(owner_id)?;
        let snapshot = self.store.load().await?;
        let mut links = snapshot.owner_links(owner_id);
        links.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.short_code.cmp(&b.short_code))
        });
        Ok(links)
    }

    /// Looks up a link without counting a click.
    pub async fn get_link(&self, code: &str) -> Result<Option<Link>, AppError> {
        let snapshot = self.store.load().await?;
        Ok(snapshot.find_by_code(code).cloned())
    }

    /// Reports whether `code` would resolve right now, without counting a click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    pub async fn link_status(&self, code: &str) -> Result<LinkStatus, AppError> {
        self.get_link(code)
            .await?
            .map(|link| link.status_at(Utc::now()))
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }

    /// Deletes `code` if `requester_id` owns it.
    ///
    /// Returns `Ok(false)` both when the code does not exist and when it
    /// belongs to someone else; use [`Self::get_link`] to tell them apart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `requester_id` is blank.
    pub async fn delete(&self, code: &str, requester_id: &str) -> Result<bool, AppError> {
        let requester_id = normalize_owner(requester_id)?;
        let _transaction = self.transaction_lock.lock().await;
        let mut snapshot = self.store.load().await?;

        let Some((owner_id, url)) = snapshot.locate(code) else {
            debug!(code, "Delete requested for unknown short link");
            return Ok(false);
        };

        if owner_id != requester_id {
            info!(code, requester = requester_id, "Refused to delete link owned by another user");
            return Ok(false);
        }

        snapshot.remove(&owner_id, &url);
        self.store.save(&snapshot).await?;

        info!(code, owner = %owner_id, "Deleted short link");
        Ok(true)
    }

    /// Removes every expired link and returns how many were removed.
    ///
    /// Writes only when at least one link was removed.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let _transaction = self.transaction_lock.lock().await;
        let mut snapshot = self.store.load().await?;

        let removed = snapshot.remove_expired(Utc::now());
        if removed == 0 {
            debug!("No expired links to sweep");
            return Ok(0);
        }

        self.store.save(&snapshot).await?;
        info!(removed, remaining = snapshot.len(), "Swept expired links");
        Ok(removed)
    }

    /// Constructs the public short link for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}{}", self.base_url, code)
    }
}

/// Owner identities are compared with surrounding whitespace removed.
fn normalize_owner(owner_id: &str) -> Result<&str, AppError> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::bad_request("Owner must not be empty", json!({})));
    }
    Ok(owner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LinkSnapshot;
    use crate::domain::repositories::MockLinkStore;

    const BASE_URL: &str = "https://clck.ru/";

    fn service(store: MockLinkStore) -> LinkService<MockLinkStore> {
        LinkService::new(
            Arc::new(store),
            CodeGenerator::default(),
            BASE_URL,
            Duration::hours(24),
        )
    }

    fn create_test_link(code: &str, url: &str, owner: &str, limit: Option<u32>) -> Link {
        Link::new(NewLink {
            short_code: code.to_string(),
            original_url: url.to_string(),
            owner_id: owner.to_string(),
            click_limit: limit,
            created_at: Utc::now(),
            ttl: Duration::hours(24),
        })
    }

    fn snapshot_with(links: Vec<Link>) -> LinkSnapshot {
        let mut snapshot = LinkSnapshot::new();
        for link in links {
            snapshot.insert(link);
        }
        snapshot
    }

    fn expect_load(store: &mut MockLinkStore, snapshot: LinkSnapshot) {
        store
            .expect_load()
            .returning(move || Ok(snapshot.clone()));
    }

    #[tokio::test]
    async fn test_create_short_link_success() {
        let mut store = MockLinkStore::new();
        expect_load(&mut store, LinkSnapshot::new());
        store
            .expect_save()
            .withf(|snapshot| {
                snapshot.len() == 1 && snapshot.find_by_url("alice", "https://example.com/").is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        let result = service(store)
            .create("example.com", "alice", None)
            .await
            .unwrap();

        assert!(result.created);
        assert_eq!(result.link.original_url, "https://example.com/");
        assert_eq!(result.short_url, format!("{BASE_URL}{}", result.code()));
        assert_eq!(result.code().len(), 6);
    }

    #[tokio::test]
    async fn test_create_short_link_deduplication() {
        let mut store = MockLinkStore::new();
        let existing = create_test_link("exists", "https://example.com/", "alice", None);
        expect_load(&mut store, snapshot_with(vec![existing]));
        store.expect_save().times(0);

        let result = service(store)
            .create("https://EXAMPLE.com", "alice", Some(3))
            .await
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.code(), "exists");
        assert_eq!(result.short_url, "https://clck.ru/exists");
    }

    #[tokio::test]
    async fn test_create_same_url_other_owner_gets_new_link() {
        let mut store = MockLinkStore::new();
        let existing = create_test_link("exists", "https://example.com/", "alice", None);
        expect_load(&mut store, snapshot_with(vec![existing]));
        store
            .expect_save()
            .withf(|snapshot| snapshot.len() == 2 && snapshot.owner_count() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let result = service(store)
            .create("https://example.com/", "bob", None)
            .await
            .unwrap();

        assert!(result.created);
        assert_ne!(result.code(), "exists");
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_url() {
        let mut store = MockLinkStore::new();
        store.expect_load().times(0);

        let result = service(store).create("ftp://example.com", "alice", None).await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_empty_url() {
        let mut store = MockLinkStore::new();
        store.expect_load().times(0);

        let result = service(store).create("   ", "alice", None).await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_limit_and_empty_owner() {
        let mut store = MockLinkStore::new();
        store.expect_load().times(0);
        let service = service(store);

        let zero = service.create("example.com", "alice", Some(0)).await;
        assert!(matches!(zero.unwrap_err(), AppError::Validation { .. }));

        let anonymous = service.create("example.com", " ", None).await;
        assert!(matches!(anonymous.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_propagates_corrupt_store() {
        let mut store = MockLinkStore::new();
        store
            .expect_load()
            .returning(|| Err(AppError::corrupt_store("bad file", json!({}))));
        store.expect_save().times(0);

        let result = service(store).create("example.com", "alice", None).await;

        assert!(matches!(result.unwrap_err(), AppError::CorruptStore { .. }));
    }

    #[tokio::test]
    async fn test_resolve_counts_click() {
        let mut store = MockLinkStore::new();
        let link = create_test_link("abc123", "https://example.com/", "alice", Some(2));
        expect_load(&mut store, snapshot_with(vec![link]));
        store
            .expect_save()
            .withf(|snapshot| {
                snapshot
                    .find_by_code("abc123")
                    .is_some_and(|l| l.click_count == 1 && l.active)
            })
            .times(1)
            .returning(|_| Ok(()));

        let url = service(store).resolve("abc123").await.unwrap();

        assert_eq!(url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_resolve_last_click_deactivates() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("abc123", "https://example.com/", "alice", Some(2));
        link.click_count = 1;
        expect_load(&mut store, snapshot_with(vec![link]));
        store
            .expect_save()
            .withf(|snapshot| {
                snapshot
                    .find_by_code("abc123")
                    .is_some_and(|l| l.click_count == 2 && !l.active)
            })
            .times(1)
            .returning(|_| Ok(()));

        let url = service(store).resolve("abc123").await.unwrap();

        assert_eq!(url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let mut store = MockLinkStore::new();
        expect_load(&mut store, LinkSnapshot::new());
        store.expect_save().times(0);

        let result = service(store).resolve("missing").await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_deactivates_and_persists() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("old123", "https://example.com/", "alice", None);
        link.expires_at = Utc::now() - Duration::minutes(1);
        expect_load(&mut store, snapshot_with(vec![link]));
        store
            .expect_save()
            .withf(|snapshot| snapshot.find_by_code("old123").is_some_and(|l| !l.active))
            .times(1)
            .returning(|_| Ok(()));

        let result = service(store).resolve("old123").await;

        assert!(matches!(result.unwrap_err(), AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_inactive_link_skips_write() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("old123", "https://example.com/", "alice", None);
        link.expires_at = Utc::now() - Duration::minutes(1);
        link.active = false;
        expect_load(&mut store, snapshot_with(vec![link]));
        store.expect_save().times(0);

        let result = service(store).resolve("old123").await;

        assert!(matches!(result.unwrap_err(), AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_wins_over_limit() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("both", "https://example.com/", "alice", Some(1));
        link.click_count = 1;
        link.active = false;
        link.expires_at = Utc::now() - Duration::minutes(1);
        expect_load(&mut store, snapshot_with(vec![link]));
        store.expect_save().times(0);

        let result = service(store).resolve("both").await;

        assert!(matches!(result.unwrap_err(), AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_resolve_limit_exceeded_does_not_increment() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("used", "https://example.com/", "alice", Some(2));
        link.click_count = 2;
        link.active = false;
        expect_load(&mut store, snapshot_with(vec![link]));
        store.expect_save().times(0);

        let result = service(store).resolve("used").await.unwrap_err();

        assert!(matches!(result, AppError::LimitExceeded { .. }));
        assert_eq!(result.details()["clicks"], 2);
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let mut store = MockLinkStore::new();
        let link = create_test_link("abc123", "https://example.com/", "alice", None);
        expect_load(&mut store, snapshot_with(vec![link]));
        store
            .expect_save()
            .withf(|snapshot| snapshot.is_empty() && snapshot.owner_count() == 0)
            .times(1)
            .returning(|_| Ok(()));

        assert!(service(store).delete("abc123", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_other_owner_is_refused() {
        let mut store = MockLinkStore::new();
        let link = create_test_link("abc123", "https://example.com/", "alice", None);
        expect_load(&mut store, snapshot_with(vec![link]));
        store.expect_save().times(0);

        assert!(!service(store).delete("abc123", "mallory").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_list_reject_blank_owner() {
        let mut store = MockLinkStore::new();
        store.expect_load().times(0);
        store.expect_save().times(0);
        let service = service(store);

        let delete = service.delete("abc123", "  ").await;
        assert!(matches!(delete.unwrap_err(), AppError::Validation { .. }));

        let list = service.list_by_owner("").await;
        assert!(matches!(list.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_code() {
        let mut store = MockLinkStore::new();
        expect_load(&mut store, LinkSnapshot::new());
        store.expect_save().times(0);

        assert!(!service(store).delete("nothing", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_without_expired_links_skips_write() {
        let mut store = MockLinkStore::new();
        let link = create_test_link("fresh", "https://example.com/", "alice", None);
        expect_load(&mut store, snapshot_with(vec![link]));
        store.expect_save().times(0);

        assert_eq!(service(store).sweep_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_links() {
        let mut store = MockLinkStore::new();
        let mut old = create_test_link("old", "https://old.com/", "alice", None);
        old.expires_at = Utc::now() - Duration::hours(1);
        let fresh = create_test_link("fresh", "https://new.com/", "bob", None);
        expect_load(&mut store, snapshot_with(vec![old, fresh]));
        store
            .expect_save()
            .withf(|snapshot| {
                snapshot.len() == 1
                    && snapshot.owner_count() == 1
                    && snapshot.find_by_code("fresh").is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        assert_eq!(service(store).sweep_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_owner_is_read_only() {
        let mut store = MockLinkStore::new();
        let mut first = create_test_link("one", "https://one.com/", "alice", None);
        first.created_at -= Duration::minutes(5);
        let second = create_test_link("two", "https://two.com/", "alice", None);
        let other = create_test_link("three", "https://three.com/", "bob", None);
        expect_load(&mut store, snapshot_with(vec![second, other, first]));
        store.expect_save().times(0);

        let links = service(store).list_by_owner("alice").await.unwrap();

        let codes: Vec<&str> = links.iter().map(|l| l.short_code.as_str()).collect();
        assert_eq!(codes, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_link_status() {
        let mut store = MockLinkStore::new();
        let mut link = create_test_link("abc123", "https://example.com/", "alice", Some(5));
        link.click_count = 3;
        expect_load(&mut store, snapshot_with(vec![link]));
        let service = service(store);

        assert_eq!(
            service.link_status("abc123").await.unwrap(),
            LinkStatus::Active {
                clicks: 3,
                limit: Some(5)
            }
        );
        assert!(matches!(
            service.link_status("nope").await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }
}
