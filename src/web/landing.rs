use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AppState, auth,
    templates::{FlashQuery, render_landing_page},
};

pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Html<String> {
    let student = auth::current_student(&state, &jar).await;
    Html(render_landing_page(student.as_ref(), &params))
}
