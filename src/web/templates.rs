use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::web::{SessionStudent, StudentRow, uploads::ALLOWED_EXTENSIONS};

/// Flash-style feedback carried across redirects as query parameters and
/// translated to user-facing text by the rendering layer.
#[derive(Default, Deserialize)]
pub struct FlashQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; margin: 0; min-height: 100vh; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; }
        main { width: 100%; max-width: 520px; display: flex; flex-direction: column; gap: 1.5rem; margin: auto; }
        .panel { background: #ffffff; padding: 2.25rem 2rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); border: 1px solid #e2e8f0; box-sizing: border-box; }
        h1 { margin: 0 0 1rem; font-size: 1.7rem; text-align: center; }
        p.description { margin: 0 0 1.5rem; color: #475569; text-align: center; font-size: 0.95rem; }
        label { display: block; margin-top: 1.1rem; font-weight: 600; color: #0f172a; }
        input, textarea { width: 100%; padding: 0.8rem; margin-top: 0.6rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; font-size: 1rem; box-sizing: border-box; }
        input:focus, textarea:focus { outline: none; border-color: #2563eb; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.15); }
        button { margin-top: 1.75rem; width: 100%; padding: 0.9rem; border: none; border-radius: 10px; background: #2563eb; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; transition: background 0.15s ease; }
        button:hover { background: #1d4ed8; }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; font-weight: 600; border: 1px solid transparent; }
        .flash.success { background: #ecfdf3; border-color: #bbf7d0; color: #166534; }
        .flash.error { background: #fef2f2; border-color: #fecaca; color: #b91c1c; }
        .links { text-align: center; font-size: 0.95rem; color: #475569; }
        .links a { color: #2563eb; text-decoration: none; font-weight: 600; }
        .links a:hover { text-decoration: underline; }
        .nav-grid { display: grid; gap: 1rem; }
        .nav-card { display: block; background: #ffffff; padding: 1.25rem 1.5rem; border-radius: 14px; text-decoration: none; color: inherit; border: 1px solid #e2e8f0; box-shadow: 0 12px 30px rgba(15, 23, 42, 0.06); font-weight: 600; }
        .nav-card:hover { border-color: #bfdbfe; }
        .nav-card span { display: block; margin-top: 0.3rem; color: #475569; font-weight: 400; font-size: 0.9rem; }
        .signed-in { text-align: center; color: #475569; font-size: 0.95rem; }
        .app-footer { margin-top: 2rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

fn render_page(meta_title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <main>
{body}
    </main>
</body>
</html>"#,
        meta_title = meta_title,
        styles = PAGE_BASE_STYLES,
        body = body,
    )
}

pub fn render_landing_page(student: Option<&SessionStudent>, params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();

    let body = match student {
        Some(student) => {
            let name = escape_html(&student.name);
            format!(
                r#"        <section class="panel">
            <h1>Student Portal</h1>
            <p class="signed-in">Signed in as <strong>{name}</strong></p>
        </section>
        {flash}
        <div class="nav-grid">
            <a class="nav-card" href="/dashboard">Dashboard<span>Post messages and see your details.</span></a>
            <a class="nav-card" href="/upload">File upload<span>Submit documents and images.</span></a>
            <a class="nav-card" href="/logout">Log out<span>End this session.</span></a>
        </div>
        {footer}"#,
                name = name,
                flash = flash,
                footer = footer,
            )
        }
        None => format!(
            r#"        <section class="panel">
            <h1>Student Portal</h1>
            <p class="description">Register for an account or log in to reach your dashboard.</p>
        </section>
        {flash}
        <div class="nav-grid">
            <a class="nav-card" href="/login">Log in<span>Access your dashboard.</span></a>
            <a class="nav-card" href="/register">Register<span>Create a new student account.</span></a>
            <a class="nav-card" href="/recover">Recover password<span>Get a new password by email.</span></a>
        </div>
        {footer}"#,
            flash = flash,
            footer = footer,
        ),
    };

    render_page("Student Portal", &body)
}

pub fn render_login_page(params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h1>Log in</h1>
            <p class="description">Enter your portal username and password.</p>
            <form method="post" action="/login">
                <label for="username">Username</label>
                <input id="username" name="username" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Log in</button>
            </form>
        </section>
        <p class="links">No account yet? <a href="/register">Register</a> · <a href="/recover">Forgot password?</a></p>
        {footer}"#,
        flash = flash,
        footer = footer,
    );

    render_page("Log in · Student Portal", &body)
}

pub fn render_register_page(params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h1>Register</h1>
            <p class="description">All fields are required.</p>
            <form method="post" action="/register">
                <label for="student_id">Student ID</label>
                <input id="student_id" name="student_id" required>
                <label for="name">Full name</label>
                <input id="name" name="name" required>
                <label for="email">Email</label>
                <input id="email" type="email" name="email" required>
                <label for="username">Username</label>
                <input id="username" name="username" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Register</button>
            </form>
        </section>
        <p class="links">Already registered? <a href="/login">Log in</a></p>
        {footer}"#,
        flash = flash,
        footer = footer,
    );

    render_page("Register · Student Portal", &body)
}

pub fn render_dashboard_page(student: &StudentRow, params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();
    let name = escape_html(&student.name);
    let student_id = escape_html(&student.student_id);

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h1>Welcome, {name}</h1>
            <p class="description">Student ID: {student_id}</p>
            <form method="post" action="/dashboard">
                <label for="user_input">Post a message</label>
                <textarea id="user_input" name="user_input" rows="4" required></textarea>
                <button type="submit">Save message</button>
            </form>
        </section>
        <p class="links"><a href="/upload">Upload a file</a> · <a href="/logout">Log out</a></p>
        {footer}"#,
        flash = flash,
        footer = footer,
        name = name,
        student_id = student_id,
    );

    render_page("Dashboard · Student Portal", &body)
}

pub fn render_upload_page(params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();
    let allowed = ALLOWED_EXTENSIONS.join(", ");

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h1>File upload</h1>
            <p class="description">Allowed file types: {allowed}.</p>
            <form method="post" action="/upload" enctype="multipart/form-data">
                <label for="file">Choose a file</label>
                <input id="file" type="file" name="file" required>
                <button type="submit">Upload</button>
            </form>
        </section>
        <p class="links"><a href="/dashboard">Back to dashboard</a></p>
        {footer}"#,
        flash = flash,
        footer = footer,
        allowed = allowed,
    );

    render_page("File upload · Student Portal", &body)
}

pub fn render_recover_page(params: &FlashQuery) -> String {
    let flash = compose_flash(params);
    let footer = render_footer();

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h1>Recover password</h1>
            <p class="description">A new password will be emailed to your registered address.</p>
            <form method="post" action="/recover">
                <label for="email">Email</label>
                <input id="email" type="email" name="email" required>
                <button type="submit">Send new password</button>
            </form>
        </section>
        <p class="links"><a href="/login">Back to login</a></p>
        {footer}"#,
        flash = flash,
        footer = footer,
    );

    render_page("Recover password · Student Portal", &body)
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} Student Portal</footer>"#)
}

fn compose_flash(params: &FlashQuery) -> String {
    if let Some(status) = params.status.as_deref() {
        let message = match status {
            "registered" => "Registration successful! Please log in.",
            "logged_out" => "You have been logged out.",
            "message_saved" => "Message saved!",
            "uploaded" => "File uploaded successfully!",
            "sent" => "Password recovery email sent!",
            _ => return String::new(),
        };

        return format!(r#"<div class="flash success">{message}</div>"#);
    }

    if let Some(error) = params.error.as_deref() {
        let message = match error {
            "invalid_credentials" => "Invalid login details.",
            "email_taken" => "Email already registered!",
            "duplicate" => "Student ID or username already registered.",
            "missing_fields" => "All fields are required.",
            "email_not_found" => "Email not found.",
            "mail_failed" => "Could not send the recovery email. Please try again later.",
            "no_file" => "No file selected.",
            "bad_type" => "Invalid file type!",
            "bad_form" => "Could not read the upload form.",
            _ => "Something went wrong. Please try again.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("hi")</script>"#),
            "&lt;script&gt;alert(&quot;hi&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("O'Brien & co"), "O&#39;Brien &amp; co");
    }

    #[test]
    fn flash_prefers_status_over_error() {
        let params = FlashQuery {
            status: Some("registered".to_string()),
            error: Some("unknown".to_string()),
        };
        let flash = compose_flash(&params);
        assert!(flash.contains("flash success"));
        assert!(flash.contains("Registration successful"));
    }

    #[test]
    fn flash_maps_unknown_error_to_generic_message() {
        let params = FlashQuery {
            status: None,
            error: Some("nonsense_code".to_string()),
        };
        let flash = compose_flash(&params);
        assert!(flash.contains("flash error"));
        assert!(flash.contains("Something went wrong"));
    }

    #[test]
    fn no_params_renders_no_flash() {
        assert_eq!(compose_flash(&FlashQuery::default()), "");
    }

    #[test]
    fn dashboard_escapes_student_fields() {
        let student = StudentRow {
            id: 1,
            student_id: "S<1>".to_string(),
            name: "Eve <b>".to_string(),
            email: "eve@example.com".to_string(),
            username: "eve".to_string(),
        };
        let page = render_dashboard_page(&student, &FlashQuery::default());
        assert!(page.contains("Eve &lt;b&gt;"));
        assert!(page.contains("S&lt;1&gt;"));
        assert!(!page.contains("Eve <b>"));
    }
}
