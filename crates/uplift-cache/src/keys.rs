//! Cache key taxonomy.
//!
//! Every cache key the subsystem reads or writes is produced here. A key is
//! `{prefix}:{domain segment}:{id}[:{id}...]`, a deterministic function of
//! the domain and its identifiers, which is what makes exact deletes and
//! glob-pattern bulk deletes possible. New cache domains are registered in
//! this module and nowhere else; other components never format keys by hand.
//!
//! Identifiers must not contain the `:` separator. Callers use UUIDs and
//! other collision-free ids, so this is not validated here.

use std::time::Duration;

/// Separator between key segments.
const SEPARATOR: char = ':';

/// Logical cache domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDomain {
    Session,
    UserProfile,
    UserPermissions,
    UserPreferences,
    Review,
    Goal,
    Feedback,
    Dashboard,
    Leaderboard,
    TeamMetrics,
    Report,
    MlRecommendation,
    EngagementScore,
    SentimentScore,
    HealthMetrics,
    ProductivityPrediction,
    DepartmentStats,
    OrgStats,
    RateLimit,
    VerificationCode,
    TempData,
}

impl CacheDomain {
    /// All domains, used by tests and the invalidation coordinator.
    pub const ALL: [CacheDomain; 21] = [
        CacheDomain::Session,
        CacheDomain::UserProfile,
        CacheDomain::UserPermissions,
        CacheDomain::UserPreferences,
        CacheDomain::Review,
        CacheDomain::Goal,
        CacheDomain::Feedback,
        CacheDomain::Dashboard,
        CacheDomain::Leaderboard,
        CacheDomain::TeamMetrics,
        CacheDomain::Report,
        CacheDomain::MlRecommendation,
        CacheDomain::EngagementScore,
        CacheDomain::SentimentScore,
        CacheDomain::HealthMetrics,
        CacheDomain::ProductivityPrediction,
        CacheDomain::DepartmentStats,
        CacheDomain::OrgStats,
        CacheDomain::RateLimit,
        CacheDomain::VerificationCode,
        CacheDomain::TempData,
    ];

    /// The key segment identifying this domain.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            CacheDomain::Session => "session",
            CacheDomain::UserProfile => "profile",
            CacheDomain::UserPermissions => "permissions",
            CacheDomain::UserPreferences => "preferences",
            CacheDomain::Review => "review",
            CacheDomain::Goal => "goal",
            CacheDomain::Feedback => "feedback",
            CacheDomain::Dashboard => "dashboard",
            CacheDomain::Leaderboard => "leaderboard",
            CacheDomain::TeamMetrics => "team-metrics",
            CacheDomain::Report => "report",
            CacheDomain::MlRecommendation => "ml-rec",
            CacheDomain::EngagementScore => "engagement",
            CacheDomain::SentimentScore => "sentiment",
            CacheDomain::HealthMetrics => "health",
            CacheDomain::ProductivityPrediction => "productivity",
            CacheDomain::DepartmentStats => "dept-stats",
            CacheDomain::OrgStats => "org-stats",
            CacheDomain::RateLimit => "rate-limit",
            CacheDomain::VerificationCode => "verify",
            CacheDomain::TempData => "temp",
        }
    }

    /// Canonical TTL for entries in this domain.
    ///
    /// Exactly one TTL per domain; the only override is the explicit `ttl`
    /// parameter on the cache-aside path, which takes precedence when given.
    #[must_use]
    pub const fn ttl(self) -> Duration {
        let secs = match self {
            CacheDomain::Session => 3600,
            CacheDomain::UserProfile => 1800,
            CacheDomain::UserPermissions => 900,
            CacheDomain::UserPreferences => 3600,
            CacheDomain::Review => 600,
            CacheDomain::Goal => 900,
            CacheDomain::Feedback => 600,
            CacheDomain::Dashboard => 300,
            CacheDomain::Leaderboard => 300,
            CacheDomain::TeamMetrics => 900,
            CacheDomain::Report => 3600,
            CacheDomain::MlRecommendation => 7200,
            CacheDomain::EngagementScore => 3600,
            CacheDomain::SentimentScore => 3600,
            CacheDomain::HealthMetrics => 1800,
            CacheDomain::ProductivityPrediction => 7200,
            CacheDomain::DepartmentStats => 1800,
            CacheDomain::OrgStats => 3600,
            CacheDomain::RateLimit => 60,
            CacheDomain::VerificationCode => 300,
            CacheDomain::TempData => 600,
        };
        Duration::from_secs(secs)
    }
}

/// Key builder carrying the installation-wide prefix.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Create a key space with the given global prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The global prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a fully-qualified key for a domain and its identifiers.
    #[must_use]
    pub fn key(&self, domain: CacheDomain, ids: &[&str]) -> String {
        let mut key = String::with_capacity(
            self.prefix.len()
                + domain.segment().len()
                + ids.iter().map(|id| id.len() + 1).sum::<usize>()
                + 1,
        );
        key.push_str(&self.prefix);
        key.push(SEPARATOR);
        key.push_str(domain.segment());
        for id in ids {
            key.push(SEPARATOR);
            key.push_str(id);
        }
        key
    }

    /// Session key for a user.
    #[must_use]
    pub fn session(&self, session_id: &str) -> String {
        self.key(CacheDomain::Session, &[session_id])
    }

    /// Profile key for a user.
    #[must_use]
    pub fn user_profile(&self, user_id: &str) -> String {
        self.key(CacheDomain::UserProfile, &[user_id])
    }

    /// Review key.
    #[must_use]
    pub fn review(&self, review_id: &str) -> String {
        self.key(CacheDomain::Review, &[review_id])
    }

    /// Goal key.
    #[must_use]
    pub fn goal(&self, goal_id: &str) -> String {
        self.key(CacheDomain::Goal, &[goal_id])
    }

    /// Dashboard key for a user.
    #[must_use]
    pub fn dashboard(&self, user_id: &str) -> String {
        self.key(CacheDomain::Dashboard, &[user_id])
    }

    /// Leaderboard key for a tenant-wide board.
    #[must_use]
    pub fn leaderboard(&self, org_id: &str, board: &str) -> String {
        self.key(CacheDomain::Leaderboard, &[org_id, board])
    }

    /// Rate-limit counter key for a bucket.
    #[must_use]
    pub fn rate_limit(&self, bucket: &str) -> String {
        self.key(CacheDomain::RateLimit, &[bucket])
    }

    /// Pattern matching keys in a domain that contain `id` anywhere after
    /// the domain segment. Derived and aggregate keys compose several
    /// identifiers, so the id is not necessarily in canonical position.
    #[must_use]
    pub fn containing(&self, domain: CacheDomain, id: &str) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}*{id}*",
            self.prefix,
            domain.segment()
        )
    }

    /// Pattern matching any key under the prefix that contains `id`.
    #[must_use]
    pub fn anywhere(&self, id: &str) -> String {
        format!("{}{SEPARATOR}*{id}*", self.prefix)
    }

    /// Pattern matching every key under the prefix.
    #[must_use]
    pub fn all(&self) -> String {
        format!("{}{SEPARATOR}*", self.prefix)
    }
}
