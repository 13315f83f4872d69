//! Lumen Store - Injectable registry backends
//!
//! The auth core keeps all of its mutable state (pending magic links,
//! entitlements, rate buckets) behind the interfaces in this crate.
//! Production deployments back them with a durable, horizontally-shared
//! store; the in-memory implementations here are per-process and are
//! what tests and single-instance deployments use.

pub mod directory;
pub mod error;
pub mod kv;
pub mod memory;

pub use directory::*;
pub use error::*;
pub use kv::*;
pub use memory::*;
