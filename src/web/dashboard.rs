use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, auth, data,
    templates::{FlashQuery, render_dashboard_page},
};

#[derive(Deserialize)]
pub struct MessageForm {
    pub user_input: String,
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Redirect> {
    let session = auth::require_student(&state, &jar).await?;

    let student = match data::find_by_id(state.pool_ref(), session.id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Err(Redirect::to("/login")),
        Err(err) => {
            error!(?err, "failed to load student for dashboard");
            return Err(Redirect::to("/login"));
        }
    };

    Ok(Html(render_dashboard_page(&student, &params)))
}

pub async fn post_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, Redirect> {
    let session = auth::require_student(&state, &jar).await?;

    // Attribution uses the name cached on the session, not a fresh lookup.
    if let Err(err) = state
        .message_log()
        .append(&session.name, &form.user_input)
        .await
    {
        error!(?err, "failed to append dashboard message");
        return Ok(Redirect::to("/dashboard?error=unknown"));
    }

    Ok(Redirect::to("/dashboard?status=message_saved"))
}
