use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, auth, data,
    templates::{FlashQuery, render_register_page},
};

#[derive(Deserialize)]
pub struct RegisterForm {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

pub async fn register_page(Query(params): Query<FlashQuery>) -> Html<String> {
    Html(render_register_page(&params))
}

pub async fn process_register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    let student_id = form.student_id.trim();
    let name = form.name.trim();
    let email = form.email.trim();
    let username = form.username.trim();
    let password = form.password.trim();

    if student_id.is_empty()
        || name.is_empty()
        || email.is_empty()
        || username.is_empty()
        || password.is_empty()
    {
        return Redirect::to("/register?error=missing_fields");
    }

    // Friendly duplicate-email check first so the user gets the specific
    // message; the UNIQUE constraints on the table are what actually close
    // the race between concurrent registrations.
    match data::find_by_email(state.pool_ref(), email).await {
        Ok(Some(_)) => return Redirect::to("/register?error=email_taken"),
        Ok(None) => {}
        Err(err) => {
            error!(?err, "failed to check email during registration");
            return Redirect::to("/register?error=unknown");
        }
    }

    let password_hash = match auth::hash_password(password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(?err, "failed to hash password during registration");
            return Redirect::to("/register?error=unknown");
        }
    };

    let result = data::insert_student(
        state.pool_ref(),
        student_id,
        name,
        email,
        username,
        &password_hash,
    )
    .await;

    match result {
        Ok(_) => Redirect::to("/login?status=registered"),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            Redirect::to("/register?error=duplicate")
        }
        Err(err) => {
            error!(?err, "failed to insert student");
            Redirect::to("/register?error=unknown")
        }
    }
}
