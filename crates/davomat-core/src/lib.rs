//! Davomat Core - shared logic for the chat bot and the REST server.
//!
//! - **config**: state directory layout and ERP settings from the environment
//! - **erp**: upstream ERP client and field remapping
//! - **lifecycle**: cached-token validation and silent re-login
//! - **mentor**: service-account mentor directory
//! - **service**: the operations both front-ends expose

pub mod config;
pub mod erp;
pub mod error;
pub mod lifecycle;
pub mod mentor;
pub mod service;

pub use config::{
    config_dir, credentials_file, ensure_all_dirs, env_file, load_env_files, required_env,
    runtime_state_dir, state_dir, ConfigError, ErpConfig, ServiceAccount, CREDENTIAL_KEY_ENV,
};
pub use erp::{ErpApi, ErpClient};
pub use error::{ErpError, Result};
pub use lifecycle::{TokenManager, ValidToken};
pub use mentor::MentorDirectory;
pub use service::{AcademicService, Report};
