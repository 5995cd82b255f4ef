//! Router configuration and server setup.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Session
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // Academic data
        .route("/profile", get(handlers::profile))
        .route("/timetable", get(handlers::timetable))
        .route("/attendance", get(handlers::attendance))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Starts the API server on the configured address.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, create_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, FakeErp, PASSWORD};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use std::sync::atomic::Ordering;

    fn server(erp: FakeErp) -> TestServer {
        let (state, _) = test_state(erp);
        TestServer::new(create_router(state)).unwrap()
    }

    async fn login(server: &TestServer) -> String {
        let response = server
            .post("/login")
            .form(&[("username", "ABT24CCS008"), ("password", PASSWORD)])
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = server(FakeErp::default());

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert!(!body["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = server(FakeErp::default());

        let response = server
            .post("/login")
            .form(&[("username", "ABT24CCS008"), ("password", "wrong")])
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("unauthorized"));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let server = server(FakeErp::default());

        let response = server
            .post("/login")
            .form(&[("username", " "), ("password", "x")])
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer() {
        let server = server(FakeErp::default());

        for path in ["/profile", "/timetable", "/attendance"] {
            server.get(path).await.assert_status(StatusCode::UNAUTHORIZED);
        }
        server
            .get("/profile")
            .authorization_bearer("not-a-jwt")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_includes_mentor() {
        let server = server(FakeErp::default());
        let token = login(&server).await;

        let response = server.get("/profile").authorization_bearer(&token).await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "ABT24CCS008");
        assert_eq!(body["user_id"], 689);
        assert_eq!(body["full_name"], "Axror");
        assert_eq!(body["year_or_sem"], "3");
        assert_eq!(body["role_name"], "Student");
        assert_eq!(body["mentor"], "Dr. Mentor");
        assert_eq!(body["mentor_code"], "E2");
    }

    #[tokio::test]
    async fn test_timetable_for_date() {
        let server = server(FakeErp::default());
        let token = login(&server).await;

        let response = server
            .get("/timetable")
            .add_query_param("date", "2025-03-10")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["date"], "2025-03-10");
        assert_eq!(body["timetable"][0]["subject"], "Maths");

        let response = server
            .get("/timetable")
            .add_query_param("date", "2025-03-11")
            .authorization_bearer(&token)
            .await;
        let body: serde_json::Value = response.json();
        assert!(body["timetable"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timetable_rejects_bad_date() {
        let server = server(FakeErp::default());
        let token = login(&server).await;

        server
            .get("/timetable")
            .add_query_param("date", "10.03.2025")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attendance() {
        let server = server(FakeErp::default());
        let token = login(&server).await;

        let response = server.get("/attendance").authorization_bearer(&token).await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["period"], "3");
        assert_eq!(body["attendance"][0]["present_count"], 18);
        assert_eq!(body["attendance"][0]["percentage"], 90.0);
        assert_eq!(body["mentor"], "Dr. Mentor");

        server
            .get("/attendance")
            .add_query_param("period", "../3")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attendance_upstream_failure_is_bad_gateway() {
        let server = server(FakeErp {
            attendance_down: true,
            ..Default::default()
        });
        let token = login(&server).await;

        server
            .get("/attendance")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_logout_forgets_credentials() {
        let (state, erp) = test_state(FakeErp::default());
        let server = TestServer::new(create_router(state)).unwrap();
        let token = login(&server).await;

        let response = server.post("/logout").authorization_bearer(&token).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "logged out");

        // The JWT is still well-formed, but nothing is stored behind it.
        server
            .get("/attendance")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(erp.logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let server = server(FakeErp::default());

        let response = server.get("/health").await;

        assert!(response.headers().contains_key("access-control-allow-origin"));
    }
}
