//! Application state shared across handlers.

use std::sync::Arc;

use davomat_core::AcademicService;

use crate::auth::JwtConfig;
use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Session token settings.
    pub jwt: Arc<JwtConfig>,
    /// Token lifecycle and ERP operations.
    pub service: Arc<AcademicService>,
}

impl AppState {
    /// Creates a new AppState with all components.
    pub fn new(config: ApiConfig, jwt: JwtConfig, service: Arc<AcademicService>) -> Self {
        Self {
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            service,
        }
    }
}
