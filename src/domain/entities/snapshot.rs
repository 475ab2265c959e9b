//! In-memory image of the whole link store.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::link::Link;

/// Links grouped by owner, then by original URL.
///
/// Serializes transparently as `{ owner: { url: Link } }`. One owner holds at
/// most one link per URL, and owners with no links are pruned before save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSnapshot {
    owners: BTreeMap<String, BTreeMap<String, Link>>,
}

impl LinkSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of links across all owners.
    pub fn len(&self) -> usize {
        self.owners.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.values().all(BTreeMap::is_empty)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Every short code currently stored.
    pub fn all_codes(&self) -> HashSet<String> {
        self.links().map(|link| link.short_code.clone()).collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.owners.values().flat_map(BTreeMap::values)
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Link> {
        self.links().find(|link| link.short_code == code)
    }

    pub fn find_by_code_mut(&mut self, code: &str) -> Option<&mut Link> {
        self.owners
            .values_mut()
            .flat_map(BTreeMap::values_mut)
            .find(|link| link.short_code == code)
    }

    /// Owner and URL keys under which `code` is stored.
    pub fn locate(&self, code: &str) -> Option<(String, String)> {
        self.owners.iter().find_map(|(owner, links)| {
            links
                .iter()
                .find(|(_, link)| link.short_code == code)
                .map(|(url, _)| (owner.clone(), url.clone()))
        })
    }

    pub fn find_by_url(&self, owner_id: &str, url: &str) -> Option<&Link> {
        self.owners.get(owner_id).and_then(|links| links.get(url))
    }

    pub fn owner_links(&self, owner_id: &str) -> Vec<Link> {
        self.owners
            .get(owner_id)
            .map(|links| links.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Stores `link` under its owner and URL, replacing any previous entry.
    pub fn insert(&mut self, link: Link) -> Option<Link> {
        self.owners
            .entry(link.owner_id.clone())
            .or_default()
            .insert(link.original_url.clone(), link)
    }

    /// Removes the link stored under `owner_id` / `url`, pruning the owner if emptied.
    pub fn remove(&mut self, owner_id: &str, url: &str) -> Option<Link> {
        let links = self.owners.get_mut(owner_id)?;
        let removed = links.remove(url);
        if links.is_empty() {
            self.owners.remove(owner_id);
        }
        removed
    }

    /// Drops every link expired at `now` and returns how many were removed.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for links in self.owners.values_mut() {
            let before = links.len();
            links.retain(|_, link| !link.is_expired_at(now));
            removed += before - links.len();
        }
        self.prune_empty_owners();
        removed
    }

    pub fn prune_empty_owners(&mut self) {
        self.owners.retain(|_, links| !links.is_empty());
    }
}
