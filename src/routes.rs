// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assignments, attempts, auth, questions},
    state::AppState,
    utils::jwt::{auth_middleware, instructor_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * `/api/auth` is public.
/// * `/api/instructor` requires a valid token with the instructor role.
/// * `/api/assignments` requires a valid token with the student role.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://127.0.0.1:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let instructor_routes = Router::new()
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route("/questions/{id}", get(questions::get_question))
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/assignments/{id}",
            get(assignments::get_assignment).patch(assignments::update_assignment),
        )
        .route("/assignments/{id}/blocks", post(assignments::create_block))
        .route(
            "/assignments/{id}/blocks/{block_id}",
            delete(assignments::delete_block),
        )
        .route(
            "/assignments/{id}/submissions",
            get(assignments::list_submissions),
        )
        // Auth runs first (outermost), then the role check
        .layer(middleware::from_fn(instructor_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/", get(attempts::list_available))
        .route("/{id}/attempt", post(attempts::start_attempt))
        .route("/{id}/attempt/submit", post(attempts::submit_attempt))
        .route("/{id}/attempt/advance", post(attempts::advance_attempt))
        .route("/{id}/results", get(attempts::get_results))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/instructor", instructor_routes)
        .nest("/api/assignments", student_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::{Config, S3Config},
        media::DisabledMediaStore,
        store::MemoryStore,
        utils::jwt::sign_jwt,
    };

    fn app() -> Router {
        create_router(AppState {
            store: Arc::new(MemoryStore::new()),
            media: Arc::new(DisabledMediaStore),
            config: Config {
                database_url: String::new(),
                jwt_secret: "router_secret".to_string(),
                jwt_expiration: 60,
                rust_log: "error".to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
                s3: S3Config::default(),
                media_bucket: "media".to_string(),
                signed_url_ttl: Duration::from_secs(60),
                seed_instructor_username: None,
                seed_instructor_password: None,
            },
        })
    }

    #[tokio::test]
    async fn student_routes_need_a_token() {
        let response = app()
            .oneshot(Request::get("/api/assignments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn instructor_routes_reject_students() {
        let token = sign_jwt(7, "student", "router_secret", 60).unwrap();
        let response = app()
            .oneshot(
                Request::get("/api/instructor/assignments")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_assignment_is_not_found() {
        let token = sign_jwt(7, "student", "router_secret", 60).unwrap();
        let response = app()
            .oneshot(
                Request::post("/api/assignments/42/attempt")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
