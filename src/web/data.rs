use sqlx::PgPool;

use super::models::StudentRow;

pub async fn find_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        "SELECT id, student_id, name, email, username FROM students WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> sqlx::Result<Option<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        "SELECT id, student_id, name, email, username FROM students WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a new account. Uniqueness of student_id, email and username is
/// enforced by the table constraints; a duplicate surfaces as a database
/// error with code 23505 for the caller to map.
pub async fn insert_student(
    pool: &PgPool,
    student_id: &str,
    name: &str,
    email: &str,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<StudentRow> {
    sqlx::query_as::<_, StudentRow>(
        "INSERT INTO students (student_id, name, email, username, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, student_id, name, email, username",
    )
    .bind(student_id)
    .bind(name)
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn update_password_hash(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE students SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
