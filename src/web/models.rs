use sqlx::FromRow;

/// Student account profile as stored in the record store. The password hash
/// never leaves the auth queries.
#[derive(Clone, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub username: String,
}
