use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use tracing::error;

use crate::{
    mailer::MailMessage,
    web::{
        AppState, auth, data,
        templates::{FlashQuery, render_recover_page},
    },
};

const RECOVERY_PASSWORD_LEN: usize = 8;
const RECOVERY_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Deserialize)]
pub struct RecoverForm {
    pub email: String,
}

pub async fn recover_page(Query(params): Query<FlashQuery>) -> Html<String> {
    Html(render_recover_page(&params))
}

pub async fn process_recover(
    State(state): State<AppState>,
    Form(form): Form<RecoverForm>,
) -> Redirect {
    let email = form.email.trim();

    let student = match data::find_by_email(state.pool_ref(), email).await {
        Ok(Some(student)) => student,
        Ok(None) => return Redirect::to("/recover?error=email_not_found"),
        Err(err) => {
            error!(?err, "failed to look up email during recovery");
            return Redirect::to("/recover?error=unknown");
        }
    };

    let new_password = generate_recovery_password();

    let password_hash = match auth::hash_password(&new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(?err, "failed to hash recovery password");
            return Redirect::to("/recover?error=unknown");
        }
    };

    if let Err(err) = data::update_password_hash(state.pool_ref(), student.id, &password_hash).await
    {
        error!(?err, "failed to store recovery password");
        return Redirect::to("/recover?error=unknown");
    }

    let message = MailMessage::new(
        student.email.clone(),
        "Password Recovery",
        format!("Your new password is: {new_password}"),
    );

    if let Err(err) = state.mail().send(message).await {
        error!(?err, "failed to send recovery email");
        return Redirect::to("/recover?error=mail_failed");
    }

    Redirect::to("/recover?status=sent")
}

/// Fresh 8-character alphanumeric credential from the OS random source.
/// Draws 6 bits per attempt and retries out-of-range values so every
/// charset entry is equally likely.
pub fn generate_recovery_password() -> String {
    let mut rng = OsRng;
    let mut password = String::with_capacity(RECOVERY_PASSWORD_LEN);
    while password.len() < RECOVERY_PASSWORD_LEN {
        let draw = (rng.next_u32() & 0x3f) as usize;
        if draw < RECOVERY_CHARSET.len() {
            password.push(RECOVERY_CHARSET[draw] as char);
        }
    }
    password
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_password_is_eight_alphanumeric_chars() {
        for _ in 0..64 {
            let password = generate_recovery_password();
            assert_eq!(password.len(), RECOVERY_PASSWORD_LEN);
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn consecutive_passwords_differ() {
        let first = generate_recovery_password();
        let second = generate_recovery_password();
        assert_ne!(first, second);
    }
}
