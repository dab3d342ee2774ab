//! Caller identity and resource authorization.
//!
//! There is no login: the caller is whoever the forwarded-address headers say
//! it is. Ownership is recorded against that key at upload time and share
//! tokens extend access to other callers.

pub mod access;
pub mod client_key;

pub use access::{enforce, require_owner, AccessDecision, AccessPolicy, Authorizer, DenialReason};
pub use client_key::ClientKey;
