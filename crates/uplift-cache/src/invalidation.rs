//! Invalidation fan-out coordinator.
//!
//! A domain write (review updated, goal completed, team reorganized, ...)
//! must delete every cache entry that could hold derived data for the
//! changed entity and its relations. Each method here expands the entity's
//! identifiers into a fixed list of glob patterns covering every namespace
//! that can embed the identifier anywhere in a key, then bulk-deletes the
//! matches. Over-invalidation is acceptable; under-invalidation is a
//! correctness bug.
//!
//! Fan-out is best-effort per pattern: a failed pattern logs and counts
//! zero without aborting its peers. A skipped invalidation leaves stale
//! data visible for at most the entry's remaining TTL.

use crate::keys::{CacheDomain, KeySpace};
use crate::store::StoreBackend;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Domains that aggregate per-team data.
const TEAM_SCOPE: &[CacheDomain] = &[
    CacheDomain::TeamMetrics,
    CacheDomain::Dashboard,
    CacheDomain::Leaderboard,
    CacheDomain::Report,
];

/// Domains that aggregate per-department data.
const DEPARTMENT_SCOPE: &[CacheDomain] = &[
    CacheDomain::DepartmentStats,
    CacheDomain::TeamMetrics,
    CacheDomain::Dashboard,
    CacheDomain::Leaderboard,
    CacheDomain::Report,
];

/// Domains that aggregate tenant-wide data.
const ORGANIZATION_SCOPE: &[CacheDomain] = &[
    CacheDomain::OrgStats,
    CacheDomain::DepartmentStats,
    CacheDomain::TeamMetrics,
    CacheDomain::Dashboard,
    CacheDomain::Leaderboard,
    CacheDomain::Report,
];

/// Coordinates multi-key cache invalidation for domain entities.
pub struct Invalidator {
    store: Arc<dyn StoreBackend>,
    keys: KeySpace,
    broadcast_channel: Option<String>,
}

impl Invalidator {
    /// Create a coordinator over the given store and key space.
    pub fn new(store: Arc<dyn StoreBackend>, keys: KeySpace) -> Self {
        Self {
            store,
            keys,
            broadcast_channel: None,
        }
    }

    /// Additionally publish an invalidation event on `channel` after each
    /// fan-out, so other processes can drop their local copies.
    #[must_use]
    pub fn with_broadcast(mut self, channel: impl Into<String>) -> Self {
        self.broadcast_channel = Some(channel.into());
        self
    }

    /// Invalidate everything derived from a user: profile, permissions,
    /// sessions, dashboards, scores, recommendations, and any other key
    /// that embeds the user id anywhere. Returns the number of keys
    /// deleted.
    pub async fn invalidate_user(&self, user_id: &str) -> u64 {
        let deleted = self.fan_out(self.user_patterns(user_id)).await;
        self.broadcast("user", user_id).await;
        deleted
    }

    /// Invalidate team-scoped aggregates.
    pub async fn invalidate_team(&self, team_id: &str) -> u64 {
        let deleted = self.fan_out(self.scope_patterns(TEAM_SCOPE, team_id)).await;
        self.broadcast("team", team_id).await;
        deleted
    }

    /// Invalidate department-scoped aggregates.
    pub async fn invalidate_department(&self, department_id: &str) -> u64 {
        let deleted = self
            .fan_out(self.scope_patterns(DEPARTMENT_SCOPE, department_id))
            .await;
        self.broadcast("department", department_id).await;
        deleted
    }

    /// Invalidate tenant-wide aggregates.
    pub async fn invalidate_organization(&self, org_id: &str) -> u64 {
        let deleted = self
            .fan_out(self.scope_patterns(ORGANIZATION_SCOPE, org_id))
            .await;
        self.broadcast("organization", org_id).await;
        deleted
    }

    /// Invalidate a review and everything downstream of it. A review feeds
    /// the owner's dashboard, which in turn may be referenced by any
    /// user-scoped key, so the full user scope is included.
    pub async fn invalidate_review(&self, review_id: &str, user_id: &str) -> u64 {
        let mut patterns = vec![self.keys.containing(CacheDomain::Review, review_id)];
        patterns.extend(self.user_patterns(user_id));
        let deleted = self.fan_out(patterns).await;
        self.broadcast("review", review_id).await;
        deleted
    }

    /// Invalidate a goal and everything downstream of it.
    pub async fn invalidate_goal(&self, goal_id: &str, owner_id: &str) -> u64 {
        let mut patterns = vec![self.keys.containing(CacheDomain::Goal, goal_id)];
        patterns.extend(self.user_patterns(owner_id));
        let deleted = self.fan_out(patterns).await;
        self.broadcast("goal", goal_id).await;
        deleted
    }

    /// A user id can surface in any namespace, canonical position or not,
    /// so the user sweep is the single catch-all pattern over the whole
    /// prefix. This also clears rate-limit counters and verification codes
    /// that embed the id; acceptable over-invalidation.
    fn user_patterns(&self, user_id: &str) -> Vec<String> {
        vec![self.keys.anywhere(user_id)]
    }

    fn scope_patterns(&self, scope: &[CacheDomain], id: &str) -> Vec<String> {
        scope
            .iter()
            .map(|domain| self.keys.containing(*domain, id))
            .collect()
    }

    /// Run every pattern delete concurrently and sum the counts. The call
    /// resolves only once every pattern has completed; a failed pattern
    /// logs and contributes zero.
    async fn fan_out(&self, patterns: Vec<String>) -> u64 {
        let deletes = patterns.iter().map(|pattern| {
            let store = Arc::clone(&self.store);
            async move {
                match store.delete_pattern(pattern).await {
                    Ok(count) => count,
                    Err(e) => {
                        warn!(pattern = %pattern, error = %e, "pattern invalidation failed");
                        0
                    }
                }
            }
        });

        let total: u64 = join_all(deletes).await.into_iter().sum();
        debug!(patterns = patterns.len(), deleted = total, "invalidation fan-out complete");
        total
    }

    /// Fire-and-forget cross-process notification.
    async fn broadcast(&self, scope: &str, id: &str) {
        let Some(channel) = &self.broadcast_channel else {
            return;
        };
        let event = json!({ "scope": scope, "id": id }).to_string();
        if let Err(e) = self.store.publish(channel, &event).await {
            warn!(channel = %channel, error = %e, "invalidation broadcast failed");
        }
    }
}
