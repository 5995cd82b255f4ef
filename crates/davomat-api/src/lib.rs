//! REST API for Davomat.
//!
//! A thin JSON proxy in front of the Acharya ERP:
//! - `POST /login` exchanges ERP credentials for a session JWT
//! - `GET /profile`, `GET /timetable`, `GET /attendance` return normalized data
//! - `POST /logout` forgets the stored credentials
//! - `GET /health`
//!
//! # Example
//!
//! ```ignore
//! use davomat_api::{ApiConfig, AppState, JwtConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(ApiConfig::default(), JwtConfig::from_env()?, service);
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{AuthUser, Claims, JwtConfig};
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
