//! Contributor aggregation.
//!
//! Walks every record with a GitHub repository in identifier order, loads or
//! fetches its contributor snapshot, and folds the snapshots into one
//! [`ContributorIndex`] mapping each login to the records they contributed
//! to.
//!
//! # Caching
//!
//! Two caches sit in front of GitHub:
//!
//! | Cache | Key | File |
//! |-------|-----|------|
//! | per-record snapshot | record id | `contributors/{id}_contributors.json` |
//! | per-user profile | lower-cased login | `github/user/{login}.json` |
//!
//! When a record's snapshot exists the client is not called at all for that
//! record. Profiles are only fetched for contributors seen in a record whose
//! snapshot is missing and who have no cached profile yet.

use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{CacheOutcome, KeyStyle, KeyedCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::github::CodeHost;
use crate::models::{Contributor, ContributorSnapshot, RecordContributors};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Every contributor seen across the registry, keyed by login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorIndex {
    contributors: BTreeMap<String, Contributor>,
}

impl ContributorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record's snapshot into the index.
    ///
    /// Profile fields take the values from the most recently absorbed
    /// snapshot; contribution counts and record sets accumulate.
    pub fn absorb(&mut self, record: &str, snapshot: &RecordContributors) {
        for (login, snap) in snapshot {
            let entry = self
                .contributors
                .entry(login.clone())
                .or_insert_with(|| Contributor {
                    login: login.clone(),
                    ..Contributor::default()
                });
            entry.name = snap.name.clone();
            entry.email = snap.email.clone();
            entry.bio = snap.bio.clone();
            entry.blog = snap.blog.clone();
            entry.company = snap.company.clone();
            entry.twitter_username = snap.twitter_username.clone();
            entry.contributions.insert(record.to_string(), snap.contributions);
            entry.records.insert(record.to_string());
        }
    }

    pub fn get(&self, login: &str) -> Option<&Contributor> {
        self.contributors.get(login)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contributor> {
        self.contributors.values()
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Inverse view: record id → logins of its contributors.
    pub fn record_to_logins(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for contributor in self.contributors.values() {
            for record in &contributor.records {
                out.entry(record.clone())
                    .or_default()
                    .insert(contributor.login.clone());
            }
        }
        out
    }

    pub fn as_map(&self) -> &BTreeMap<String, Contributor> {
        &self.contributors
    }
}

/// Summary of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub records: u64,
    pub cached: u64,
    pub fetched: u64,
}

pub struct Aggregator<'a> {
    host: &'a dyn CodeHost,
    snapshots: KeyedCache,
    users: KeyedCache,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        host: &'a dyn CodeHost,
        cache: &CacheConfig,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            host,
            snapshots: KeyedCache::json(cache.contributors_dir(), KeyStyle::Verbatim, "_contributors"),
            users: KeyedCache::json(cache.users_dir(), KeyStyle::Lowercase, ""),
            progress,
        }
    }

    /// Public profile of `login`, from the per-user cache when present.
    pub async fn user_profile(&self, login: &str) -> Result<serde_json::Value> {
        let (profile, _) = self
            .users
            .get_or_fetch(login, move || self.host.user(login))
            .await?;
        Ok(profile)
    }

    /// Contributor snapshot for one record, from the per-record cache when
    /// present. A fetched snapshot is written before it is returned.
    pub async fn record_contributors(
        &self,
        record: &str,
        owner: &str,
        name: &str,
    ) -> Result<(RecordContributors, CacheOutcome)> {
        self.snapshots
            .get_or_fetch(record, move || async move {
                let listed = self.host.contributors(owner, name).await?;
                let mut snapshot = RecordContributors::new();
                for entry in listed {
                    let profile = self.user_profile(&entry.login).await?;
                    snapshot.insert(
                        entry.login.clone(),
                        ContributorSnapshot::from_profile(entry.contributions, &profile),
                    );
                }
                Ok::<_, crate::error::Error>(snapshot)
            })
            .await
    }

    /// Aggregate every repository into a [`ContributorIndex`].
    ///
    /// `repositories` maps record id → `(owner, name)`; iteration follows
    /// its sorted key order, so reruns create cache files in the same order
    /// and an interrupted run picks up where it stopped.
    pub async fn run(
        &self,
        repositories: &BTreeMap<String, (String, String)>,
    ) -> Result<(ContributorIndex, AggregateStats)> {
        let mut index = ContributorIndex::new();
        let mut stats = AggregateStats::default();
        let total = repositories.len() as u64;

        for (record, (owner, name)) in repositories {
            let (snapshot, outcome) = self.record_contributors(record, owner, name).await?;
            let cached = outcome == CacheOutcome::Hit;

            stats.records += 1;
            if cached {
                stats.cached += 1;
            } else {
                stats.fetched += 1;
            }
            self.progress.report(ProgressEvent::Record {
                record: record.clone(),
                n: stats.records,
                total,
                cached,
            });

            index.absorb(record, &snapshot);
        }

        Ok((index, stats))
    }
}
