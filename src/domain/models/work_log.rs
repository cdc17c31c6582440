//! Work-log domain model.

use chrono::NaiveDate;

/// Display name used for bonus entries in listings and exports.
pub const BONUS_ENTRY_NAME: &str = "Bonus for good work";

/// Discriminator for work-log entries.
///
/// `Bonus` rows are derived: the cascade engine upserts or deletes them, a
/// user action never creates one directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkLogKind {
    UserWork,
    Bonus,
}

impl WorkLogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserWork => "user_work",
            Self::Bonus => "bonus",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user_work" => Some(Self::UserWork),
            "bonus" => Some(Self::Bonus),
            _ => None,
        }
    }
}

/// A logged piece of completed work for one calendar date.
///
/// Carries a snapshot of the task name and reward at completion time, so it
/// survives deletion of the task it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLog {
    pub id: i64,
    pub owner_id: i64,
    /// Weak reference to the originating task; `None` for bonus entries and
    /// for entries whose task was deleted afterwards.
    pub task_id: Option<i64>,
    pub kind: WorkLogKind,
    pub name: String,
    pub date: NaiveDate,
    pub reward: i64,
}

impl WorkLog {
    /// Name shown to the user: bonus rows get the fixed bonus label.
    pub fn display_name(&self) -> &str {
        match self.kind {
            WorkLogKind::Bonus => BONUS_ENTRY_NAME,
            WorkLogKind::UserWork => &self.name,
        }
    }
}
