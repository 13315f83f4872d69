//! Identity directory
//!
//! Lookup-or-create-by-normalized-email collaborator used by the
//! magic-link verifier and the OAuth callback flow.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use lumen_types::{AuthProvider, Identity, UserId};

use crate::error::StoreResult;

/// Directory of user identities keyed by normalized email
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Find an identity by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Find an identity by ID
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>>;

    /// Find the identity for a normalized email, creating it on first
    /// sight with the given origin provider
    async fn lookup_or_create(
        &self,
        email: &str,
        provider: AuthProvider,
    ) -> StoreResult<Identity>;
}

/// In-memory identity directory
#[derive(Default, Clone)]
pub struct MemoryIdentityDirectory {
    identities: Arc<DashMap<UserId, Identity>>,
    by_email: Arc<DashMap<String, UserId>>,
}

impl MemoryIdentityDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity directly (test setup)
    pub fn insert(&self, identity: Identity) {
        self.by_email.insert(identity.email.clone(), identity.id);
        self.identities.insert(identity.id, identity);
    }
}

#[async_trait]
impl IdentityDirectory for MemoryIdentityDirectory {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.identities.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>> {
        Ok(self.identities.get(&id).map(|r| r.value().clone()))
    }

    async fn lookup_or_create(
        &self,
        email: &str,
        provider: AuthProvider,
    ) -> StoreResult<Identity> {
        // entry() keeps concurrent first-sign-ins from racing to two IDs
        let id = *self
            .by_email
            .entry(email.to_string())
            .or_insert_with(UserId::new);

        let identity = self
            .identities
            .entry(id)
            .or_insert_with(|| {
                let mut identity = Identity::new(email, provider);
                identity.id = id;
                identity
            })
            .clone();

        Ok(identity)
    }
}

impl std::fmt::Debug for MemoryIdentityDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityDirectory")
            .field("identities", &self.identities.len())
            .finish_non_exhaustive()
    }
}
