pub mod auth;
pub mod dashboard;
pub mod data;
pub mod landing;
pub mod messages;
pub mod models;
pub mod recover;
pub mod register;
pub mod router;
pub mod state;
pub mod templates;
pub mod uploads;

pub use auth::{SESSION_COOKIE, SESSION_TTL_DAYS, SessionStudent};
pub use models::StudentRow;
pub use state::AppState;
pub use templates::escape_html;
