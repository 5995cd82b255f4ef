//! Login and logout handlers.

use axum::{extract::State, Form, Json};
use davomat_models::ExternalId;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{LoginForm, SuccessResponse, TokenResponse};

/// POST /login - Exchange ERP credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let id = ExternalId::api(username);
    let record = state
        .service
        .tokens()
        .login_and_store(&id, username, &form.password, None)
        .await?;
    let user_id = record
        .upstream_user_id
        .ok_or_else(|| ApiError::Internal("login stored no user id".to_string()))?;

    let access_token = state.jwt.issue(username, user_id).map_err(|e| {
        error!(error = %e, "Failed to sign session token");
        ApiError::Internal("failed to issue token".to_string())
    })?;

    info!(external_id = %id, "Session opened");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /logout - Forget stored credentials for the session user.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<Json<SuccessResponse>> {
    let removed = state.service.tokens().logout(&user.external_id).await?;
    let message = if removed {
        "logged out"
    } else {
        "no stored credentials"
    };

    Ok(Json(SuccessResponse {
        message: message.to_string(),
    }))
}
