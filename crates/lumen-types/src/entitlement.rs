//! Subscription plan and entitlement types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Subscription plan levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free plan
    Free,
    /// Pro plan
    Pro,
    /// Enterprise plan
    Enterprise,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(PlanParseError(s.to_string())),
        }
    }
}

/// Error parsing a plan string
#[derive(Debug, Clone)]
pub struct PlanParseError(pub String);

impl std::fmt::Display for PlanParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid plan: {}", self.0)
    }
}

impl std::error::Error for PlanParseError {}

/// Lifecycle status of an entitlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    /// Paid up (or free plan)
    Active,
    /// Payment lapsed, access retained during the grace window
    Grace,
    /// Explicitly canceled by the user
    Canceled,
    /// Renewal date passed without payment
    Expired,
}

impl std::fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Grace => write!(f, "grace"),
            Self::Canceled => write!(f, "canceled"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Purchase platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ios => write!(f, "ios"),
            Self::Android => write!(f, "android"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// One entitlement record per user identity
///
/// Records are upserted (latest write wins, `id` and `created_at`
/// preserved) and never hard-deleted; a lapsed subscription transitions
/// to `Canceled` or `Expired` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Record ID, stable across upserts
    pub id: Uuid,
    /// Owning user
    pub user_id: UserId,
    /// Granted plan
    pub plan: Plan,
    /// Lifecycle status
    pub status: EntitlementStatus,
    /// Platform the current plan was purchased on
    pub platform: Platform,
    /// Store product identifier, when purchased
    pub product_id: Option<String>,
    /// Next renewal instant, when subscribed
    pub renew_at: Option<DateTime<Utc>>,
    /// Creation time, stable across upserts
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl EntitlementRecord {
    /// Create the default record for a user who has never purchased
    pub fn free(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            plan: Plan::Free,
            status: EntitlementStatus::Active,
            platform: Platform::Web,
            product_id: None,
            renew_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the plan currently grants paid access
    pub fn is_entitled(&self) -> bool {
        self.plan != Plan::Free
            && matches!(
                self.status,
                EntitlementStatus::Active | EntitlementStatus::Grace
            )
    }
}
