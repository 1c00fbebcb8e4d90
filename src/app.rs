// app.rs - Router assembly
//
// Route groups:
//   public     /api/auth/login, /api/health
//   protected  bearer token; center scoping happens in the handlers
//   admin      bearer token plus the admin gate

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{admin, protected, public};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware, require_admin_middleware, RateLimiter};
use crate::state::AppState;

const GENERAL_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";
const LOGIN_LIMIT_MESSAGE: &str = "Too many login attempts from this IP, please try again after 15 minutes.";

/// Build the full application router over `state`
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut api = Router::new()
        .merge(public_routes(&config))
        .merge(protected_routes(&state))
        .merge(admin_routes(&state));

    if config.api.enable_rate_limiting {
        let limiter = Arc::new(RateLimiter::new(
            config.api.rate_limit_requests,
            Duration::from_secs(config.api.rate_limit_window_secs),
            GENERAL_LIMIT_MESSAGE,
        ));
        api = api.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn public_routes(config: &AppConfig) -> Router<AppState> {
    let mut login = Router::new().route("/auth/login", post(public::login));
    if config.api.enable_rate_limiting {
        // Only failed attempts count against the login window
        let limiter = RateLimiter::new(
            config.api.login_rate_limit_requests,
            Duration::from_secs(config.api.rate_limit_window_secs),
            LOGIN_LIMIT_MESSAGE,
        )
        .skip_successful();
        login = login.route_layer(from_fn_with_state(Arc::new(limiter), rate_limit_middleware));
    }

    Router::new().route("/health", get(public::health)).merge(login)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{attendance, auth, dashboard, families, students, test_scores, women};

    Router::new()
        .route("/auth/me", get(auth::me))
        // Families
        .route("/families", get(families::list_families).post(families::create_family))
        .route(
            "/families/:id",
            get(families::get_family)
                .put(families::update_family)
                .delete(families::delete_family),
        )
        // Students
        .route("/students", get(students::list_students).post(students::create_student))
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/students/:id/progress", get(students::student_progress))
        // Women
        .route("/women", get(women::list_women).post(women::create_woman))
        .route("/women/stats", get(women::women_stats))
        .route(
            "/women/:id",
            get(women::get_woman).put(women::update_woman).delete(women::delete_woman),
        )
        // Attendance
        .route("/attendance", get(attendance::list_attendance).post(attendance::mark_attendance))
        .route("/attendance/bulk", post(attendance::mark_bulk_attendance))
        .route("/attendance/summary", get(attendance::attendance_summary))
        // Test scores
        .route("/testscores", get(test_scores::list_test_scores).post(test_scores::add_test_score))
        .route("/testscores/bulk", post(test_scores::add_bulk_test_scores))
        .route("/testscores/analytics", get(test_scores::test_score_analytics))
        .route(
            "/testscores/:id",
            get(test_scores::get_test_score)
                .put(test_scores::update_test_score)
                .delete(test_scores::delete_test_score),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::dashboard_stats))
        .route("/dashboard/students", get(dashboard::dashboard_students))
        .route("/dashboard/attendance-reports", get(dashboard::attendance_reports))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use admin::{export, stats, users};

    Router::new()
        .route("/auth/register", post(users::create_user))
        .route("/admin/stats", get(stats::admin_stats))
        .route("/admin/export", get(export::export_data))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // The last layer added runs first: authenticate, then check the role
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
