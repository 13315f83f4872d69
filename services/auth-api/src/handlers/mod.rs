//! HTTP handlers

mod entitlement;
mod health;
mod magic_link;
mod oauth;
mod session;

pub use entitlement::get_entitlement;
pub use health::{health, ready};
pub use magic_link::{request_magic_link, verify_magic_link};
pub use oauth::{oauth_callback, oauth_start};
pub use session::{logout, me};
