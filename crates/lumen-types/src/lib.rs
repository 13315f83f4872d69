//! Lumen Types - Shared domain types
//!
//! This crate contains domain types used across Lumen services:
//! - User identity and authentication providers
//! - Subscription plans and entitlement records
//! - The injectable clock used for all expiry decisions

pub mod clock;
pub mod entitlement;
pub mod user;

pub use clock::*;
pub use entitlement::*;
pub use user::*;
