//! Lumen Auth Core - Authentication business logic
//!
//! Token minting and verification, magic-link login, OAuth state
//! protection, session management, rate limiting, and entitlements.

pub mod config;
pub mod crypto;
pub mod entitlement;
pub mod error;
pub mod magic_link;
pub mod oauth_state;
pub mod rate_limit;
pub mod service;
pub mod session;
pub mod token;

pub use config::*;
pub use crypto::*;
pub use entitlement::*;
pub use error::*;
pub use magic_link::*;
pub use oauth_state::*;
pub use rate_limit::*;
pub use service::*;
pub use session::*;
pub use token::*;
