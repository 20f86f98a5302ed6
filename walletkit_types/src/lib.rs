//! Domain types shared by the WalletKit client and its tooling: project and
//! client identifiers, the relay auth token, and the app metadata record.

pub mod auth;
pub mod domain;
pub mod jwt;
pub mod metadata;
mod serde_helpers;
