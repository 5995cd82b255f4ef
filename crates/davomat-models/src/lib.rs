//! Core data models for Davomat.
//!
//! This crate provides the data types shared by the store, the ERP adapter
//! and both front-ends: stored credentials, external identities and the
//! normalized academic records returned to callers.

pub mod academic;
pub mod credential;
pub mod ids;

// Re-export main types
pub use academic::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry, UNKNOWN};
pub use credential::{
    CredentialUpdate, Language, UserCredential, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS,
};
pub use ids::ExternalId;
