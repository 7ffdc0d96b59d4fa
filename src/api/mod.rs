mod admin_auth;
mod assignments;
mod auth;
mod courses;
pub mod error;
pub mod extract;
mod programs;
pub mod rate_limit;
mod stats;
mod study_centers;
mod users;
pub mod validation;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential-accepting routes get the strict tier
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(admin_auth::login))
        .route("/admin/setup", post(admin_auth::setup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    let student_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route("/dashboard", get(auth::dashboard))
        .route(
            "/assignments",
            get(assignments::list_my_orders).post(assignments::create_order),
        )
        // Public catalog
        .route("/courses/filter", get(courses::public_filter))
        .route("/programs", get(programs::public_programs))
        .route("/study-centers", get(study_centers::public_study_centers));

    let admin_routes = Router::new()
        .route("/setup-status", get(admin_auth::setup_status))
        .route("/logout", post(admin_auth::logout))
        .route("/verify", get(admin_auth::verify))
        .route("/password", post(admin_auth::change_password))
        .route(
            "/admins",
            get(admin_auth::list_admins).post(admin_auth::create_admin),
        )
        // Students
        .route("/users", get(users::list_users))
        .route("/users/:id/status", put(users::update_user_status))
        // Catalog
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/courses/filter", get(courses::admin_filter))
        .route(
            "/courses/:id",
            put(courses::update_course).delete(courses::delete_course),
        )
        .route(
            "/programs",
            get(programs::list_programs).post(programs::create_program),
        )
        .route(
            "/study-centers",
            get(study_centers::list_study_centers).post(study_centers::create_study_center),
        )
        .route(
            "/study-centers/:id",
            put(study_centers::update_study_center).delete(study_centers::delete_study_center),
        )
        // Orders and reporting
        .route("/assignments", get(assignments::admin_list_orders))
        .route("/statistics", get(stats::statistics))
        .route("/analytics", get(stats::analytics));

    let api_routes = Router::new()
        .merge(student_routes)
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ))
        .merge(auth_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
