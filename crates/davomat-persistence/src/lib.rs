//! Persistence layer for Davomat.
//!
//! This crate owns everything that touches credentials at rest:
//!
//! - [`PasswordCipher`]: symmetric encryption of stored passwords
//! - [`CredentialStore`]: the one-record-per-identity store contract
//! - [`JsonCredentialStore`]: a crash-safe JSON-file implementation using
//!   atomic file operations (write to temp file, then rename)
//!
//! # Example
//!
//! ```no_run
//! use davomat_models::{CredentialUpdate, ExternalId, Language};
//! use davomat_persistence::{CredentialStore, JsonCredentialStore};
//!
//! # async fn demo() -> davomat_persistence::Result<()> {
//! let store = JsonCredentialStore::open("/home/user/.davomat/state/credentials.json")?;
//! let id = ExternalId::telegram(12345);
//!
//! store.upsert(&id, CredentialUpdate::language(Language::En)).await?;
//! let record = store.get(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod cipher;
pub mod credential_store;
pub mod error;

pub use cipher::{CipherError, PasswordCipher};
pub use credential_store::{CredentialStore, JsonCredentialStore};
pub use error::{PersistenceError, Result};
