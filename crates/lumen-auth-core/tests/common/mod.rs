//! Shared test harness: an auth service over in-memory backings with
//! a hand-driven clock.

use std::sync::Arc;

use lumen_auth_core::{AuthConfig, AuthService, Environment};
use lumen_store::{MemoryIdentityDirectory, MemoryStore};
use lumen_types::ManualClock;

pub const TEST_SECRET: &str = "integration-test-secret-integration!";

pub struct Harness {
    pub service: AuthService<MemoryIdentityDirectory, MemoryStore>,
    pub clock: ManualClock,
}

pub fn harness() -> Harness {
    harness_with(AuthConfig::new(Environment::Development, vec![TEST_SECRET.to_string()]).unwrap())
}

pub fn harness_with(config: AuthConfig) -> Harness {
    let clock = ManualClock::from_system();
    let directory = Arc::new(MemoryIdentityDirectory::new());
    let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
    let service = AuthService::new(config, directory, store, Arc::new(clock.clone()))
        .expect("service construction");
    Harness { service, clock }
}
