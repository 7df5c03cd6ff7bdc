//! authkeep core - client-side session management around a bearer token.
//!
//! This crate provides:
//! - `auth`: token claims decoding and the `SessionStore` holding the signed-in identity
//! - `storage`: the `TokenStorage` capability and its local, secure and in-memory backends
//! - `config`: backend selection and file locations

pub mod auth;
pub mod config;
pub mod storage;

pub use auth::{decode, SessionError, SessionIdentity, SessionStore, TokenClaims, TokenError};
pub use config::{Config, StorageBackend};
pub use storage::{StorageError, StorageKey, TokenStorage};
