//! Work-log row persistence.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::{format_date, parse_date};
use crate::domain::models::{WorkLog, WorkLogKind};
use crate::domain::{DomainError, DomainResult};

/// Insert payload; the id is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewWorkLog {
    pub owner_id: i64,
    pub task_id: Option<i64>,
    pub kind: WorkLogKind,
    pub name: String,
    pub date: NaiveDate,
    pub reward: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct WorkLogRow {
    id: i64,
    owner_id: i64,
    task_id: Option<i64>,
    kind: String,
    name: String,
    date: String,
    reward: i64,
}

impl TryFrom<WorkLogRow> for WorkLog {
    type Error = DomainError;

    fn try_from(row: WorkLogRow) -> Result<Self, Self::Error> {
        let kind = WorkLogKind::from_str(&row.kind)
            .ok_or_else(|| DomainError::internal(format!("unknown work log kind: {}", row.kind)))?;
        Ok(WorkLog {
            id: row.id,
            owner_id: row.owner_id,
            task_id: row.task_id,
            kind,
            name: row.name,
            date: parse_date(&row.date)?,
            reward: row.reward,
        })
    }
}

const SELECT: &str = "SELECT id, owner_id, task_id, kind, name, date, reward FROM work_logs";

pub async fn insert(conn: &mut SqliteConnection, entry: &NewWorkLog) -> DomainResult<WorkLog> {
    let result = sqlx::query(
        "INSERT INTO work_logs (owner_id, task_id, kind, name, date, reward)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.owner_id)
    .bind(entry.task_id)
    .bind(entry.kind.as_str())
    .bind(&entry.name)
    .bind(format_date(entry.date))
    .bind(entry.reward)
    .execute(conn)
    .await?;

    Ok(WorkLog {
        id: result.last_insert_rowid(),
        owner_id: entry.owner_id,
        task_id: entry.task_id,
        kind: entry.kind,
        name: entry.name.clone(),
        date: entry.date,
        reward: entry.reward,
    })
}

pub async fn get(
    conn: &mut SqliteConnection,
    owner_id: i64,
    work_log_id: i64,
) -> DomainResult<Option<WorkLog>> {
    let row: Option<WorkLogRow> =
        sqlx::query_as(&format!("{SELECT} WHERE id = ? AND owner_id = ?"))
            .bind(work_log_id)
            .bind(owner_id)
            .fetch_optional(conn)
            .await?;

    row.map(WorkLog::try_from).transpose()
}

pub async fn delete(conn: &mut SqliteConnection, work_log_id: i64) -> DomainResult<()> {
    sqlx::query("DELETE FROM work_logs WHERE id = ?")
        .bind(work_log_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// The bonus entry for `(owner, date)`, if one exists. At most one can.
pub async fn get_bonus_for(
    conn: &mut SqliteConnection,
    owner_id: i64,
    date: NaiveDate,
) -> DomainResult<Option<WorkLog>> {
    let row: Option<WorkLogRow> =
        sqlx::query_as(&format!("{SELECT} WHERE owner_id = ? AND date = ? AND kind = 'bonus'"))
            .bind(owner_id)
            .bind(format_date(date))
            .fetch_optional(conn)
            .await?;

    row.map(WorkLog::try_from).transpose()
}

pub async fn update_reward(
    conn: &mut SqliteConnection,
    work_log_id: i64,
    reward: i64,
) -> DomainResult<()> {
    sqlx::query("UPDATE work_logs SET reward = ? WHERE id = ?")
        .bind(reward)
        .bind(work_log_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_for_date(
    conn: &mut SqliteConnection,
    owner_id: i64,
    date: NaiveDate,
) -> DomainResult<Vec<WorkLog>> {
    let rows: Vec<WorkLogRow> =
        sqlx::query_as(&format!("{SELECT} WHERE owner_id = ? AND date = ? ORDER BY id"))
            .bind(owner_id)
            .bind(format_date(date))
            .fetch_all(conn)
            .await?;

    rows.into_iter().map(WorkLog::try_from).collect()
}

pub async fn list_for_owner(
    conn: &mut SqliteConnection,
    owner_id: i64,
) -> DomainResult<Vec<WorkLog>> {
    let rows: Vec<WorkLogRow> =
        sqlx::query_as(&format!("{SELECT} WHERE owner_id = ? ORDER BY id"))
            .bind(owner_id)
            .fetch_all(conn)
            .await?;

    rows.into_iter().map(WorkLog::try_from).collect()
}

/// Delete every entry (both kinds) on the given dates. Bulk import replaces
/// whole days, so stale bonus rows go too and the cascade recreates them.
pub async fn delete_for_dates(
    conn: &mut SqliteConnection,
    owner_id: i64,
    dates: &[NaiveDate],
) -> DomainResult<()> {
    for date in dates {
        sqlx::query("DELETE FROM work_logs WHERE owner_id = ? AND date = ?")
            .bind(owner_id)
            .bind(format_date(*date))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Per-day reward sums over `[start, end]`, for the scoring window.
pub async fn day_scores(
    conn: &mut SqliteConnection,
    owner_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> DomainResult<Vec<(NaiveDate, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT date, SUM(reward) FROM work_logs
         WHERE owner_id = ? AND date >= ? AND date <= ?
         GROUP BY date",
    )
    .bind(owner_id)
    .bind(format_date(start))
    .bind(format_date(end))
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|(date, score)| Ok((parse_date(&date)?, score)))
        .collect()
}
