//! Task row persistence.

use sqlx::SqliteConnection;

use super::format_date;
use crate::domain::models::Task;
use crate::domain::DomainResult;

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    owner_id: i64,
    name: String,
    position: i64,
    reward: i64,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            position: row.position,
            reward: row.reward,
        }
    }
}

pub async fn insert(
    conn: &mut SqliteConnection,
    owner_id: i64,
    name: &str,
    position: i64,
    reward: i64,
) -> DomainResult<Task> {
    let result = sqlx::query(
        "INSERT INTO tasks (owner_id, name, position, reward) VALUES (?, ?, ?, ?)",
    )
    .bind(owner_id)
    .bind(name)
    .bind(position)
    .bind(reward)
    .execute(conn)
    .await?;

    Ok(Task {
        id: result.last_insert_rowid(),
        owner_id,
        name: name.to_string(),
        position,
        reward,
    })
}

pub async fn get(
    conn: &mut SqliteConnection,
    owner_id: i64,
    task_id: i64,
) -> DomainResult<Option<Task>> {
    let row: Option<TaskRow> = sqlx::query_as(
        "SELECT id, owner_id, name, position, reward FROM tasks WHERE id = ? AND owner_id = ?",
    )
    .bind(task_id)
    .bind(owner_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Task::from))
}

/// All tasks of one owner, position order.
pub async fn list_for_owner(conn: &mut SqliteConnection, owner_id: i64) -> DomainResult<Vec<Task>> {
    let rows: Vec<TaskRow> = sqlx::query_as(
        "SELECT id, owner_id, name, position, reward
         FROM tasks WHERE owner_id = ? ORDER BY position",
    )
    .bind(owner_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Task::from).collect())
}

pub async fn exists_with_name(
    conn: &mut SqliteConnection,
    owner_id: i64,
    name: &str,
) -> DomainResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM tasks WHERE owner_id = ? AND name = ? LIMIT 1",
    )
    .bind(owner_id)
    .bind(name)
    .fetch_optional(conn)
    .await?;

    Ok(row.is_some())
}

pub async fn max_position(conn: &mut SqliteConnection, owner_id: i64) -> DomainResult<i64> {
    let (max,): (Option<i64>,) = sqlx::query_as(
        "SELECT MAX(position) FROM tasks WHERE owner_id = ?",
    )
    .bind(owner_id)
    .fetch_one(conn)
    .await?;

    Ok(max.unwrap_or(0))
}

pub async fn update_name(conn: &mut SqliteConnection, task_id: i64, name: &str) -> DomainResult<()> {
    sqlx::query("UPDATE tasks SET name = ? WHERE id = ?")
        .bind(name)
        .bind(task_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_reward(
    conn: &mut SqliteConnection,
    task_id: i64,
    reward: i64,
) -> DomainResult<()> {
    sqlx::query("UPDATE tasks SET reward = ? WHERE id = ?")
        .bind(reward)
        .bind(task_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Write a batch of `(task_id, position)` assignments.
///
/// Callers run this inside a user-locked transaction; the batch must restore
/// the dense `1..=N` invariant by the time the transaction commits.
pub async fn update_positions(
    conn: &mut SqliteConnection,
    assignments: &[(i64, i64)],
) -> DomainResult<()> {
    for (task_id, position) in assignments {
        sqlx::query("UPDATE tasks SET position = ? WHERE id = ?")
            .bind(position)
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, task_id: i64) -> DomainResult<()> {
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_many(conn: &mut SqliteConnection, task_ids: &[i64]) -> DomainResult<()> {
    for task_id in task_ids {
        delete(&mut *conn, *task_id).await?;
    }
    Ok(())
}

/// How many work logs this task generated on `date`.
pub async fn count_completions_on(
    conn: &mut SqliteConnection,
    task_id: i64,
    date: chrono::NaiveDate,
) -> DomainResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM work_logs WHERE task_id = ? AND date = ?",
    )
    .bind(task_id)
    .bind(format_date(date))
    .fetch_one(conn)
    .await?;

    Ok(count)
}
