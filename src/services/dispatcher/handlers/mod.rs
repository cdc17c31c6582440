//! Handler implementations for every declared command, action and question.

pub mod common;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use crate::domain::{DomainError, DomainResult};
use crate::services::dispatcher::Handler;

/// The full handler set the dispatcher is built with.
pub fn all() -> Vec<Arc<dyn Handler>> {
    vec![
        Arc::new(common::Start),
        Arc::new(common::Help),
        Arc::new(common::CancelQuestion),
        Arc::new(tasks::ShowTasks),
        Arc::new(tasks::ShowStats),
        Arc::new(tasks::ShowFinishedTasks),
        Arc::new(tasks::CreateTask),
        Arc::new(tasks::AnswerNewTaskName),
        Arc::new(tasks::CompleteTask),
        Arc::new(tasks::EditTask),
        Arc::new(tasks::DeleteTask),
        Arc::new(tasks::ChangeTaskName),
        Arc::new(tasks::AnswerTaskName),
        Arc::new(tasks::ChangeTaskReward),
        Arc::new(tasks::AnswerTaskReward),
        Arc::new(tasks::MoveTask),
        Arc::new(tasks::AnswerTaskPosition),
        Arc::new(tasks::DeleteWorkLog),
        Arc::new(tasks::RewriteAllTasks),
        Arc::new(tasks::AnswerTaskList),
        Arc::new(tasks::ImportWorkLogs),
        Arc::new(tasks::AnswerWorkLogFile),
        Arc::new(tasks::ExportData),
        Arc::new(users::ShowSettings),
        Arc::new(users::ChooseDate),
        Arc::new(users::AnswerWorkDate),
        Arc::new(users::ResetWorkDate),
        Arc::new(users::SelectYesterday),
        Arc::new(users::UpdateTimezone),
        Arc::new(users::AnswerTimezone),
    ]
}

/// Parse a routed argument that should be a row id.
fn parse_id(args: &[String], index: usize) -> DomainResult<i64> {
    args.get(index)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| DomainError::validation("Invalid identifier."))
}

/// User-facing note about a granted or revoked bonus; `None` when nothing
/// changed.
fn bonus_message(delta: i64) -> Option<String> {
    match delta {
        0 => None,
        d if d > 0 => Some(format!("Bonus for good work: +{d} added to tomorrow 👍")),
        d => Some(format!("Tomorrow's bonus decreased by {}.", -d)),
    }
}
