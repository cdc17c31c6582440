//! User row persistence.
//!
//! Repository functions take `&mut SqliteConnection` so they compose inside
//! a [`super::store::UserTx`] as well as over a plain pool connection.

use sqlx::SqliteConnection;

use super::{format_date, parse_date};
use crate::domain::models::{PendingQuestion, User};
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    chat_user_id: i64,
    pending_question: Option<String>,
    selected_work_date: Option<String>,
    timezone: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            chat_user_id: row.chat_user_id,
            // Tokens that no longer decode degrade to "no pending question".
            pending_question: row.pending_question.as_deref().and_then(PendingQuestion::parse),
            selected_work_date: row.selected_work_date.as_deref().and_then(|d| parse_date(d).ok()),
            timezone: row.timezone,
        }
    }
}

pub async fn get(conn: &mut SqliteConnection, user_id: i64) -> DomainResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, chat_user_id, pending_question, selected_work_date, timezone
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(User::from))
}

pub async fn get_by_chat_user(
    conn: &mut SqliteConnection,
    chat_user_id: i64,
) -> DomainResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, chat_user_id, pending_question, selected_work_date, timezone
         FROM users WHERE chat_user_id = ?",
    )
    .bind(chat_user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(User::from))
}

/// Fetch the user for a transport identity, creating the row on first
/// contact. Returns `(user, created)`.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    chat_user_id: i64,
) -> DomainResult<(User, bool)> {
    if let Some(user) = get_by_chat_user(&mut *conn, chat_user_id).await? {
        return Ok((user, false));
    }

    // INSERT OR IGNORE tolerates the race with another process creating the
    // same user between our probe and insert.
    sqlx::query("INSERT OR IGNORE INTO users (chat_user_id) VALUES (?)")
        .bind(chat_user_id)
        .execute(&mut *conn)
        .await?;

    let user = get_by_chat_user(&mut *conn, chat_user_id)
        .await?
        .ok_or_else(|| DomainError::internal("user row vanished after insert"))?;

    Ok((user, true))
}

pub async fn set_pending_question(
    conn: &mut SqliteConnection,
    user_id: i64,
    question: Option<&PendingQuestion>,
) -> DomainResult<()> {
    sqlx::query("UPDATE users SET pending_question = ? WHERE id = ?")
        .bind(question.map(PendingQuestion::encode))
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_timezone(
    conn: &mut SqliteConnection,
    user_id: i64,
    timezone: &str,
) -> DomainResult<()> {
    sqlx::query("UPDATE users SET timezone = ? WHERE id = ?")
        .bind(timezone)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_selected_work_date(
    conn: &mut SqliteConnection,
    user_id: i64,
    date: Option<chrono::NaiveDate>,
) -> DomainResult<()> {
    sqlx::query("UPDATE users SET selected_work_date = ? WHERE id = ?")
        .bind(date.map(format_date))
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
