use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::web::{AppState, auth, dashboard, landing, recover, register, uploads};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route(
            "/register",
            get(register::register_page).post(register::process_register),
        )
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", get(auth::logout))
        .route(
            "/dashboard",
            get(dashboard::dashboard_page).post(dashboard::post_message),
        )
        .route(
            "/upload",
            get(uploads::upload_page).post(uploads::process_upload),
        )
        .route(
            "/recover",
            get(recover::recover_page).post(recover::process_recover),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
