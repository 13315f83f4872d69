//! Entitlement registry
//!
//! One record per user identity with upsert semantics: latest write
//! wins, `id` and `created_at` survive every update. The registry
//! never invents defaults; the calling flow upserts `free/active`
//! explicitly on first query so that creation is auditable.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use lumen_store::{KvStore, StoreError};
use lumen_types::{Clock, EntitlementRecord, EntitlementStatus, Plan, Platform, UserId};

use crate::error::AuthError;

/// Partial update merged onto a record by `upsert`
#[derive(Debug, Clone, Default)]
pub struct EntitlementChange {
    pub plan: Option<Plan>,
    pub status: Option<EntitlementStatus>,
    pub platform: Option<Platform>,
    pub product_id: Option<String>,
    pub renew_at: Option<DateTime<Utc>>,
}

impl EntitlementChange {
    /// Change describing a verified purchase
    pub fn purchase(
        plan: Plan,
        platform: Platform,
        product_id: impl Into<String>,
        renew_at: DateTime<Utc>,
    ) -> Self {
        Self {
            plan: Some(plan),
            status: Some(EntitlementStatus::Active),
            platform: Some(platform),
            product_id: Some(product_id.into()),
            renew_at: Some(renew_at),
        }
    }
}

/// Per-identity subscription records over a key-value store
pub struct EntitlementRegistry<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore> EntitlementRegistry<S> {
    /// Create the registry
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Fetch the record for a user, if any
    pub async fn get(&self, user_id: UserId) -> Result<Option<EntitlementRecord>, AuthError> {
        let Some(raw) = self.store.get(&Self::key(user_id)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw).map_err(|_| StoreError::Corrupt {
            key: Self::key(user_id),
        })?;
        Ok(Some(record))
    }

    /// Merge a change onto the user's record, creating it when absent.
    ///
    /// `id` and `created_at` are preserved across updates; `updated_at`
    /// is always stamped from the clock. Records are never deleted
    /// here, only transitioned via `status`.
    pub async fn upsert(
        &self,
        user_id: UserId,
        change: EntitlementChange,
    ) -> Result<EntitlementRecord, AuthError> {
        let now = self.clock.now();
        let mut record = self
            .get(user_id)
            .await?
            .unwrap_or_else(|| EntitlementRecord::free(user_id, now));

        if let Some(plan) = change.plan {
            record.plan = plan;
        }
        if let Some(status) = change.status {
            record.status = status;
        }
        if let Some(platform) = change.platform {
            record.platform = platform;
        }
        if let Some(product_id) = change.product_id {
            record.product_id = Some(product_id);
        }
        if let Some(renew_at) = change.renew_at {
            record.renew_at = Some(renew_at);
        }
        record.updated_at = now;

        let value = serde_json::to_string(&record)
            .map_err(|e| AuthError::Internal(format!("entitlement serialization: {e}")))?;
        self.store.put(&Self::key(user_id), value, None).await?;

        tracing::debug!(user_id = %user_id, plan = %record.plan, "entitlement upserted");
        Ok(record)
    }

    fn key(user_id: UserId) -> String {
        format!("ent:{user_id}")
    }
}

impl<S> std::fmt::Debug for EntitlementRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementRegistry").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lumen_store::MemoryStore;
    use lumen_types::ManualClock;

    fn registry() -> (EntitlementRegistry<MemoryStore>, ManualClock) {
        let clock = ManualClock::from_system();
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        (
            EntitlementRegistry::new(store, Arc::new(clock.clone())),
            clock,
        )
    }

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let (registry, _) = registry();
        assert!(registry.get(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_free_base() {
        let (registry, _) = registry();
        let user_id = UserId::new();

        let record = registry
            .upsert(user_id, EntitlementChange::default())
            .await
            .unwrap();
        assert_eq!(record.plan, Plan::Free);
        assert_eq!(record.status, EntitlementStatus::Active);
        assert_eq!(record.user_id, user_id);
    }

    #[tokio::test]
    async fn test_upsert_preserves_id_and_created_at() {
        let (registry, clock) = registry();
        let user_id = UserId::new();

        let first = registry
            .upsert(
                user_id,
                EntitlementChange {
                    plan: Some(Plan::Pro),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        clock.advance(Duration::seconds(5));
        let second = registry
            .upsert(
                user_id,
                EntitlementChange {
                    plan: Some(Plan::Pro),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_corrupt_record_surfaces_store_error() {
        let clock = ManualClock::from_system();
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        let registry = EntitlementRegistry::new(store.clone(), Arc::new(clock));
        let user_id = UserId::new();

        store
            .put(&format!("ent:{user_id}"), "not json".to_string(), None)
            .await
            .unwrap();

        assert!(matches!(
            registry.get(user_id).await,
            Err(AuthError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_purchase_then_cancel() {
        let (registry, clock) = registry();
        let user_id = UserId::new();

        let purchased = registry
            .upsert(
                user_id,
                EntitlementChange::purchase(
                    Plan::Pro,
                    Platform::Ios,
                    "com.lumen.pro.monthly",
                    clock.now() + Duration::days(30),
                ),
            )
            .await
            .unwrap();
        assert!(purchased.is_entitled());
        assert_eq!(purchased.platform, Platform::Ios);

        let canceled = registry
            .upsert(
                user_id,
                EntitlementChange {
                    status: Some(EntitlementStatus::Canceled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // Plan survives, access does not
        assert_eq!(canceled.plan, Plan::Pro);
        assert!(!canceled.is_entitled());
    }
}
