use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration as ChronoDuration, Utc};
use cookie::time::Duration as CookieDuration;
use rand_core::OsRng;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::web::{
    AppState,
    templates::{FlashQuery, render_login_page},
};

#[derive(Clone, sqlx::FromRow)]
pub struct DbStudentAuth {
    pub id: i64,
    pub password_hash: String,
}

/// Account fields bound to an active session: the record key plus the
/// cached display name used for message attribution.
#[derive(Clone, sqlx::FromRow)]
pub struct SessionStudent {
    pub id: i64,
    pub student_id: String,
    pub name: String,
}

pub const SESSION_COOKIE: &str = "portal_session";
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Redirect> {
    if current_student(&state, &jar).await.is_some() {
        return Err(Redirect::to("/dashboard"));
    }

    Ok(Html(render_login_page(&params)))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Redirect> {
    let username = form.username.trim();

    let student = match authenticate(state.pool_ref(), username, &form.password).await {
        Ok(Some(student)) => student,
        Ok(None) => return Err(Redirect::to("/login?error=invalid_credentials")),
        Err(err) => {
            error!(?err, "failed to fetch student during login");
            return Err(Redirect::to("/login?error=unknown"));
        }
    };

    let session_token = Uuid::new_v4();
    let expires_at = Utc::now() + ChronoDuration::days(SESSION_TTL_DAYS);

    if let Err(err) =
        sqlx::query("INSERT INTO sessions (id, student_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_token)
            .bind(student.id)
            .bind(expires_at)
            .execute(state.pool_ref())
            .await
    {
        error!(?err, "failed to create session");
        return Err(Redirect::to("/login?error=unknown"));
    }

    let mut cookie = Cookie::new(SESSION_COOKIE, session_token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));

    let jar = jar.add(cookie);
    Ok((jar, Redirect::to("/dashboard")))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let mut jar = jar;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(token) = Uuid::parse_str(cookie.value()) {
            if let Err(err) = sqlx::query("DELETE FROM sessions WHERE id = $1")
                .bind(token)
                .execute(state.pool_ref())
                .await
            {
                error!(?err, "failed to remove session during logout");
            }
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));
    jar = jar.remove(removal);

    (jar, Redirect::to("/login?status=logged_out"))
}

/// Login check with the exact external contract of the plaintext original:
/// the account is returned iff the username exists and the password
/// verifies against the stored hash. A missing account and a wrong
/// password are indistinguishable to the caller.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> sqlx::Result<Option<DbStudentAuth>> {
    let Some(student) = fetch_student_auth(pool, username).await? else {
        return Ok(None);
    };

    if verify_password(password, &student.password_hash) {
        Ok(Some(student))
    } else {
        Ok(None)
    }
}

/// Resolve the session cookie to its student, if a live session exists.
pub async fn current_student(state: &AppState, jar: &CookieJar) -> Option<SessionStudent> {
    let token_cookie = jar.get(SESSION_COOKIE)?;
    let token = Uuid::parse_str(token_cookie.value()).ok()?;
    let pool = state.pool();

    match fetch_student_by_session(&pool, token).await {
        Ok(student) => student,
        Err(err) => {
            error!(?err, "failed to validate session");
            None
        }
    }
}

/// Session gate for pages behind login; anonymous visitors land on /login.
pub async fn require_student(
    state: &AppState,
    jar: &CookieJar,
) -> Result<SessionStudent, Redirect> {
    current_student(state, jar)
        .await
        .ok_or_else(|| Redirect::to("/login"))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn fetch_student_auth(
    pool: &PgPool,
    username: &str,
) -> sqlx::Result<Option<DbStudentAuth>> {
    sqlx::query_as::<_, DbStudentAuth>(
        "SELECT id, password_hash FROM students WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_student_by_session(
    pool: &PgPool,
    token: Uuid,
) -> sqlx::Result<Option<SessionStudent>> {
    sqlx::query_as::<_, SessionStudent>(
        "SELECT students.id, students.student_id, students.name FROM sessions JOIN students ON students.id = sessions.student_id WHERE sessions.id = $1 AND sessions.expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("correct horse").expect("hashing should succeed");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn replacement_hash_invalidates_old_password() {
        let old_hash = hash_password("original-secret").unwrap();
        let new_hash = hash_password("Xy7kPq2M").unwrap();

        assert!(verify_password("original-secret", &old_hash));
        assert!(!verify_password("original-secret", &new_hash));
        assert!(verify_password("Xy7kPq2M", &new_hash));
    }
}
