//! User domain model and the pending-question token.

use chrono::NaiveDate;

/// Kind of free-form reply the system is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// Name for a task being created
    NewTaskName,
    /// New name for an existing task
    ChangeTaskName,
    /// New reward for an existing task
    ChangeTaskReward,
    /// New list position for an existing task
    MoveTask,
    /// Work date override (ISO date)
    SetWorkDate,
    /// IANA time-zone name
    UpdateTimezone,
    /// Full task list as JSON, for bulk rewrite
    TaskList,
    /// JSON document with work logs to import
    WorkLogFile,
}

impl QuestionKind {
    /// Every question the system can ask. The dispatcher registry checks at
    /// startup that each one has an answer handler.
    pub const ALL: &'static [QuestionKind] = &[
        Self::NewTaskName,
        Self::ChangeTaskName,
        Self::ChangeTaskReward,
        Self::MoveTask,
        Self::SetWorkDate,
        Self::UpdateTimezone,
        Self::TaskList,
        Self::WorkLogFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewTaskName => "new_task_name",
            Self::ChangeTaskName => "change_task_name",
            Self::ChangeTaskReward => "change_task_reward",
            Self::MoveTask => "move_task",
            Self::SetWorkDate => "set_work_date",
            Self::UpdateTimezone => "update_timezone",
            Self::TaskList => "task_list",
            Self::WorkLogFile => "work_log_file",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new_task_name" => Some(Self::NewTaskName),
            "change_task_name" => Some(Self::ChangeTaskName),
            "change_task_reward" => Some(Self::ChangeTaskReward),
            "move_task" => Some(Self::MoveTask),
            "set_work_date" => Some(Self::SetWorkDate),
            "update_timezone" => Some(Self::UpdateTimezone),
            "task_list" => Some(Self::TaskList),
            "work_log_file" => Some(Self::WorkLogFile),
            _ => None,
        }
    }
}

/// A pending question plus the command context captured when it was asked
/// (e.g. which task is being edited).
///
/// Stored on the user row as a single text token: the question kind followed
/// by space-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub kind: QuestionKind,
    pub args: Vec<String>,
}

impl PendingQuestion {
    pub fn new(kind: QuestionKind) -> Self {
        Self { kind, args: Vec::new() }
    }

    pub fn with_arg(kind: QuestionKind, arg: impl Into<String>) -> Self {
        Self { kind, args: vec![arg.into()] }
    }

    /// Encode for storage on the user row.
    pub fn encode(&self) -> String {
        let mut token = self.kind.as_str().to_string();
        for arg in &self.args {
            token.push(' ');
            token.push_str(arg);
        }
        token
    }

    /// Parse a stored token. Unknown kinds decode to `None` so a stale token
    /// from an older deployment degrades to "no pending question".
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split(' ');
        let kind = QuestionKind::from_str(parts.next()?)?;
        Some(Self { kind, args: parts.map(str::to_string).collect() })
    }
}

/// A tracked user. Created on first observed event, never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    /// Opaque identity assigned by the chat transport.
    pub chat_user_id: i64,
    pub pending_question: Option<PendingQuestion>,
    /// Explicit work-date override; `None` means "today" in the user's zone.
    pub selected_work_date: Option<NaiveDate>,
    /// IANA time-zone name. Validated on update; defaults to UTC.
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_question_round_trips_with_args() {
        let question = PendingQuestion::with_arg(QuestionKind::ChangeTaskReward, "42");
        let decoded = PendingQuestion::parse(&question.encode()).unwrap();
        assert_eq!(decoded, question);
    }

    #[test]
    fn pending_question_without_args() {
        let question = PendingQuestion::new(QuestionKind::SetWorkDate);
        assert_eq!(question.encode(), "set_work_date");
        assert_eq!(PendingQuestion::parse("set_work_date").unwrap(), question);
    }

    #[test]
    fn unknown_question_kind_parses_to_none() {
        assert!(PendingQuestion::parse("definitely_not_a_question 1").is_none());
    }
}
