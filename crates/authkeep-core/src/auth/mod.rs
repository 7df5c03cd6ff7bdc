//! Authentication module for decoding tokens and tracking the signed-in user.
//!
//! This module provides:
//! - `decode`: extracts `TokenClaims` from the payload segment of a token
//! - `SessionStore`: sign in, sign out and read the current `SessionIdentity`
//!
//! Token signatures are never verified and expiry is never enforced here.

pub mod claims;
pub mod error;
pub mod session;

pub use claims::{decode, Group, Identity, TokenClaims, TokenType};
pub use error::{SessionError, TokenError};
pub use session::{SessionIdentity, SessionStore};
