//! Link entity representing a shortened URL owned by one identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL with its usage counters and lifetime.
///
/// Serialized with camelCase keys; this is the leaf record of the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: String,
    pub click_count: u32,
    pub click_limit: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

/// Resolution state of a link at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Active { clicks: u32, limit: Option<u32> },
    Expired,
    LimitExceeded,
}

impl Link {
    /// Builds a fresh, active link with no clicks recorded.
    pub fn new(new_link: NewLink) -> Self {
        Self {
            short_code: new_link.short_code,
            original_url: new_link.original_url,
            owner_id: new_link.owner_id,
            click_count: 0,
            click_limit: new_link.click_limit,
            created_at: new_link.created_at,
            expires_at: new_link.created_at + new_link.ttl,
            active: true,
        }
    }

    /// Returns true once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true when a limit is set and the counter has reached it.
    pub fn is_click_limit_reached(&self) -> bool {
        self.click_limit
            .is_some_and(|limit| self.click_count >= limit)
    }

    pub fn can_be_accessed(&self) -> bool {
        self.active && !self.is_expired() && !self.is_click_limit_reached()
    }

    /// Expiry wins over the click limit when both apply.
    pub fn status_at(&self, now: DateTime<Utc>) -> LinkStatus {
        if self.is_expired_at(now) {
            LinkStatus::Expired
        } else if self.is_click_limit_reached() {
            LinkStatus::LimitExceeded
        } else {
            LinkStatus::Active {
                clicks: self.click_count,
                limit: self.click_limit,
            }
        }
    }

    /// Counts one click and deactivates the link when that click uses up the limit.
    ///
    /// Callers must check [`Self::is_click_limit_reached`] first; the counter
    /// never passes the limit.
    pub fn record_click(&mut self) {
        self.click_count = self.click_count.saturating_add(1);
        if self.is_click_limit_reached() {
            self.active = false;
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: String,
    pub click_limit: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}
