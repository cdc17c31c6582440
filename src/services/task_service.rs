//! Task list management and the productivity ledger operations.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domain::models::{Task, TrackerConfig, User, WorkLog, WorkLogKind};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::work_log_repo::NewWorkLog;
use crate::infrastructure::database::{task_repo, work_log_repo, LedgerStore};
use crate::services::bonus_cascade::recalculate_day_bonus;
use crate::services::clock::{selected_work_date, Clock};
use crate::services::scoring_window::ScoringWindow;

/// Result of an operation that may have granted or revoked a bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusOutcome {
    pub day_bonus_delta: i64,
}

/// One `(name, reward)` pair of the bulk-rewrite payload; also the shape
/// tasks are exported in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub reward: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkLogSpec {
    name: String,
    reward: i64,
}

/// An exported file: name plus JSON content, handed to the transport to
/// deliver as a document.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}

/// Day score, week average and the day's entries, for the stats view.
#[derive(Debug, Clone)]
pub struct DayStats {
    pub date: NaiveDate,
    pub day_score: i64,
    pub week_average: i64,
    pub entries: Vec<WorkLog>,
}

/// Task list and work-log operations for one-user-at-a-time mutation.
///
/// Every mutating method opens a user-locked transaction and writes all
/// affected rows inside it, so the dense-position and one-bonus-per-day
/// invariants are never observable in a half-applied state.
#[derive(Clone)]
pub struct TaskService {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
}

impl TaskService {
    pub fn new(store: LedgerStore, clock: Arc<dyn Clock>, config: TrackerConfig) -> Self {
        Self { store, clock, config }
    }

    /// The user's tasks in list order.
    pub async fn tasks(&self, user: &User) -> DomainResult<Vec<Task>> {
        let mut conn = self.store.pool().acquire().await?;
        task_repo::list_for_owner(&mut conn, user.id).await
    }

    /// Tasks plus how many times each was completed on the selected date.
    pub async fn tasks_with_completions(&self, user: &User) -> DomainResult<Vec<(Task, i64)>> {
        let date = selected_work_date(self.clock.as_ref(), user);
        let mut conn = self.store.pool().acquire().await?;

        let tasks = task_repo::list_for_owner(&mut conn, user.id).await?;
        let mut result = Vec::with_capacity(tasks.len());
        for task in tasks {
            let count = task_repo::count_completions_on(&mut conn, task.id, date).await?;
            result.push((task, count));
        }
        Ok(result)
    }

    pub async fn get_task(&self, user: &User, task_id: i64) -> DomainResult<Task> {
        let mut conn = self.store.pool().acquire().await?;
        task_repo::get(&mut conn, user.id, task_id)
            .await?
            .ok_or_else(|| DomainError::validation("The task doesn't exist."))
    }

    pub async fn create_task(&self, user: &User, name: &str, reward: i64) -> DomainResult<Task> {
        let mut tx = self.store.lock_user(user.id).await?;

        if task_repo::exists_with_name(tx.conn(), user.id, name).await? {
            return Err(DomainError::validation("You already have a task with this name"));
        }

        let position = task_repo::max_position(tx.conn(), user.id).await? + 1;
        let task = task_repo::insert(tx.conn(), user.id, name, position, reward).await?;
        tx.commit().await?;

        info!(user_id = user.id, task_id = task.id, "task created");
        Ok(task)
    }

    pub async fn rename_task(&self, user: &User, task_id: i64, new_name: &str) -> DomainResult<Task> {
        let mut tx = self.store.lock_user(user.id).await?;

        let mut task = task_repo::get(tx.conn(), user.id, task_id)
            .await?
            .ok_or_else(|| DomainError::validation("The task doesn't exist."))?;

        if task.name != new_name && task_repo::exists_with_name(tx.conn(), user.id, new_name).await? {
            return Err(DomainError::validation("You already have a task with this name"));
        }

        task_repo::update_name(tx.conn(), task.id, new_name).await?;
        tx.commit().await?;

        task.name = new_name.to_string();
        Ok(task)
    }

    pub async fn set_task_reward(&self, user: &User, task_id: i64, reward: i64) -> DomainResult<()> {
        let mut tx = self.store.lock_user(user.id).await?;

        let task = task_repo::get(tx.conn(), user.id, task_id)
            .await?
            .ok_or_else(|| DomainError::validation("The task doesn't exist."))?;

        task_repo::update_reward(tx.conn(), task.id, reward).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete a task and close the position gap it leaves. Deleting a task
    /// that is already gone is a no-op (a stale button press, not an error).
    pub async fn delete_task(&self, user: &User, task_id: i64) -> DomainResult<()> {
        let mut tx = self.store.lock_user(user.id).await?;

        let Some(task) = task_repo::get(tx.conn(), user.id, task_id).await? else {
            return Ok(());
        };

        let tasks = task_repo::list_for_owner(tx.conn(), user.id).await?;
        let shifted: Vec<(i64, i64)> = tasks
            .iter()
            .filter(|other| other.position > task.position)
            .map(|other| (other.id, other.position - 1))
            .collect();

        task_repo::delete(tx.conn(), task.id).await?;
        task_repo::update_positions(tx.conn(), &shifted).await?;
        tx.commit().await?;

        info!(user_id = user.id, task_id, "task deleted");
        Ok(())
    }

    /// Move a task to `new_position`, shifting everything in between.
    ///
    /// `new_position` may be `N + 1`, meaning "to the end": the remaining
    /// tasks compact to `1..N-1` in their relative order and the moving task
    /// takes `N`.
    pub async fn move_task(&self, user: &User, task_id: i64, new_position: i64) -> DomainResult<()> {
        let mut tx = self.store.lock_user(user.id).await?;

        let mut tasks = task_repo::list_for_owner(tx.conn(), user.id).await?;
        let count = tasks.len() as i64;

        let Some(index) = tasks.iter().position(|task| task.id == task_id) else {
            return Err(DomainError::validation("The task doesn't exist."));
        };

        if new_position < 1 || new_position > count + 1 {
            return Err(DomainError::validation(format!(
                "Invalid position. Available choices: 1-{}",
                count + 1
            )));
        }

        let moving = tasks.remove(index);
        let target = if new_position == count + 1 {
            tasks.len()
        } else {
            (new_position - 1) as usize
        };
        tasks.insert(target, moving);

        // Relabel the whole list densely; only rows whose position actually
        // changed are written.
        let assignments: Vec<(i64, i64)> = tasks
            .iter()
            .enumerate()
            .filter_map(|(i, task)| {
                let position = i as i64 + 1;
                (task.position != position).then_some((task.id, position))
            })
            .collect();

        if !assignments.is_empty() {
            task_repo::update_positions(tx.conn(), &assignments).await?;
            tx.commit().await?;
        }

        Ok(())
    }

    /// Log a completion of `task_id` for the selected work date and settle
    /// tomorrow's bonus.
    #[instrument(skip(self, user), fields(user_id = user.id), err)]
    pub async fn complete_task(&self, user: &User, task_id: i64) -> DomainResult<BonusOutcome> {
        let mut tx = self.store.lock_user(user.id).await?;

        let task = task_repo::get(tx.conn(), user.id, task_id)
            .await?
            .ok_or_else(|| DomainError::validation("The task doesn't exist."))?;

        let date = selected_work_date(self.clock.as_ref(), user);
        work_log_repo::insert(
            tx.conn(),
            &NewWorkLog {
                owner_id: user.id,
                task_id: Some(task.id),
                kind: WorkLogKind::UserWork,
                name: task.name.clone(),
                date,
                reward: task.reward,
            },
        )
        .await?;

        let day_bonus_delta =
            recalculate_day_bonus(tx.conn(), user.id, date, self.config.cascade_depth).await?;
        tx.commit().await?;

        Ok(BonusOutcome { day_bonus_delta })
    }

    /// Delete a logged entry and settle the bonus for its date.
    #[instrument(skip(self, user), fields(user_id = user.id), err)]
    pub async fn delete_work_log(&self, user: &User, work_log_id: i64) -> DomainResult<BonusOutcome> {
        let mut tx = self.store.lock_user(user.id).await?;

        let entry = work_log_repo::get(tx.conn(), user.id, work_log_id)
            .await?
            .ok_or_else(|| DomainError::not_found("This entry has already been deleted."))?;

        work_log_repo::delete(tx.conn(), entry.id).await?;

        let day_bonus_delta =
            recalculate_day_bonus(tx.conn(), user.id, entry.date, self.config.cascade_depth)
                .await?;
        tx.commit().await?;

        Ok(BonusOutcome { day_bonus_delta })
    }

    /// Entries logged on the selected work date, oldest first.
    pub async fn work_logs_for_selected_date(&self, user: &User) -> DomainResult<Vec<WorkLog>> {
        let date = selected_work_date(self.clock.as_ref(), user);
        let mut conn = self.store.pool().acquire().await?;
        work_log_repo::list_for_date(&mut conn, user.id, date).await
    }

    /// Stats for the selected work date: day score, trailing week average,
    /// and the day's entries.
    pub async fn day_stats(&self, user: &User) -> DomainResult<DayStats> {
        let date = selected_work_date(self.clock.as_ref(), user);
        let mut conn = self.store.pool().acquire().await?;

        let window = ScoringWindow::load(&mut conn, user.id, date, date).await?;
        let entries = work_log_repo::list_for_date(&mut conn, user.id, date).await?;

        Ok(DayStats {
            date,
            day_score: window.day_score(date),
            week_average: window.week_average(date),
            entries,
        })
    }

    /// Replace the whole task set from an ordered JSON list of
    /// `{"name", "reward"}` objects. Input order becomes list order.
    #[instrument(skip_all, fields(user_id = user.id), err)]
    pub async fn bulk_rewrite(&self, user: &User, payload: &str) -> DomainResult<()> {
        let specs: Vec<TaskSpec> = serde_json::from_str(payload)
            .map_err(|_| DomainError::validation("JSON is invalid."))?;

        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(DomainError::validation(format!("`{}` is duplicated.", spec.name)));
            }
        }

        let mut tx = self.store.lock_user(user.id).await?;
        let current = task_repo::list_for_owner(tx.conn(), user.id).await?;

        let retained_names: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        let to_delete: Vec<i64> = current
            .iter()
            .filter(|task| !retained_names.contains(task.name.as_str()))
            .map(|task| task.id)
            .collect();
        task_repo::delete_many(tx.conn(), &to_delete).await?;

        let mut repositioned = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let position = index as i64 + 1;
            // Matching by name preserves task identity, and with it the
            // weak references from retained tasks' work logs.
            match current.iter().find(|task| task.name == spec.name) {
                Some(existing) => {
                    if existing.reward != spec.reward {
                        task_repo::update_reward(tx.conn(), existing.id, spec.reward).await?;
                    }
                    if existing.position != position {
                        repositioned.push((existing.id, position));
                    }
                }
                None => {
                    task_repo::insert(tx.conn(), user.id, &spec.name, position, spec.reward)
                        .await?;
                }
            }
        }
        task_repo::update_positions(tx.conn(), &repositioned).await?;
        tx.commit().await?;

        info!(
            user_id = user.id,
            tasks = specs.len(),
            deleted = to_delete.len(),
            "task set rewritten"
        );
        Ok(())
    }

    /// Replace the work logs of the dates named in a `{date: [{name,
    /// reward}]}` JSON payload, then re-settle the bonuses those dates feed.
    #[instrument(skip_all, fields(user_id = user.id), err)]
    pub async fn import_work_logs(&self, user: &User, payload: &str) -> DomainResult<()> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|_| DomainError::validation("JSON is invalid."))?;
        let by_date: std::collections::BTreeMap<String, Vec<WorkLogSpec>> =
            serde_json::from_value(value).map_err(|_| DomainError::validation("Wrong data."))?;

        let mut days: Vec<(NaiveDate, Vec<WorkLogSpec>)> = Vec::with_capacity(by_date.len());
        for (date, entries) in by_date {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| DomainError::validation("Wrong data."))?;
            days.push((date, entries));
        }

        let mut tx = self.store.lock_user(user.id).await?;

        let dates: Vec<NaiveDate> = days.iter().map(|(date, _)| *date).collect();
        work_log_repo::delete_for_dates(tx.conn(), user.id, &dates).await?;

        for (date, entries) in &days {
            for entry in entries {
                work_log_repo::insert(
                    tx.conn(),
                    &NewWorkLog {
                        owner_id: user.id,
                        task_id: None,
                        kind: WorkLogKind::UserWork,
                        name: entry.name.clone(),
                        date: *date,
                        reward: entry.reward,
                    },
                )
                .await?;
            }
        }

        // Imported history can shift any number of subsequent bonuses;
        // ascending order lets each day see its predecessors settled.
        for date in &dates {
            recalculate_day_bonus(tx.conn(), user.id, *date, self.config.import_cascade_depth)
                .await?;
        }
        tx.commit().await?;

        info!(user_id = user.id, days = dates.len(), "work logs imported");
        Ok(())
    }

    /// Tasks and work logs as JSON documents.
    pub async fn export_data(&self, user: &User) -> DomainResult<Vec<ExportFile>> {
        let mut conn = self.store.pool().acquire().await?;

        let tasks = task_repo::list_for_owner(&mut conn, user.id).await?;
        let task_specs: Vec<TaskSpec> = tasks
            .into_iter()
            .map(|task| TaskSpec { name: task.name, reward: task.reward })
            .collect();

        let mut logs_by_date: std::collections::BTreeMap<String, Vec<WorkLogSpec>> =
            std::collections::BTreeMap::new();
        for entry in work_log_repo::list_for_owner(&mut conn, user.id).await? {
            logs_by_date
                .entry(entry.date.format("%Y-%m-%d").to_string())
                .or_default()
                .push(WorkLogSpec {
                    name: entry.display_name().to_string(),
                    reward: entry.reward,
                });
        }

        Ok(vec![
            ExportFile {
                file_name: "Tallybot - Tasks.json".to_string(),
                content: serde_json::to_string_pretty(&task_specs)?,
            },
            ExportFile {
                file_name: "Tallybot - Work logs.json".to_string(),
                content: serde_json::to_string_pretty(&logs_by_date)?,
            },
        ])
    }

    /// JSON template for the bulk-rewrite answer: the current task set, or a
    /// small example for users without tasks yet.
    pub async fn bulk_rewrite_template(&self, user: &User) -> DomainResult<String> {
        let tasks = self.tasks(user).await?;

        let specs: Vec<TaskSpec> = if tasks.is_empty() {
            vec![
                TaskSpec { name: "Do exercises".to_string(), reward: 20 },
                TaskSpec { name: "Take a walk".to_string(), reward: 30 },
            ]
        } else {
            tasks
                .into_iter()
                .map(|task| TaskSpec { name: task.name, reward: task.reward })
                .collect()
        };

        Ok(serde_json::to_string_pretty(&specs)?)
    }

    /// JSON template for the work-log import document.
    pub fn import_template(&self, user: &User) -> DomainResult<String> {
        let date = selected_work_date(self.clock.as_ref(), user);
        let mut template = std::collections::BTreeMap::new();
        template.insert(
            date.format("%Y-%m-%d").to_string(),
            vec![
                WorkLogSpec { name: "Do exercises".to_string(), reward: 20 },
                WorkLogSpec { name: "Take a walk".to_string(), reward: 30 },
            ],
        );
        Ok(serde_json::to_string_pretty(&template)?)
    }

    /// Starter tasks for a first-contact user; the last one is completed
    /// right away so the new user sees a non-empty day.
    pub async fn create_samples(&self, user: &User) -> DomainResult<()> {
        self.create_task(user, "🧘 Meditate or practice mindfulness", 10).await?;
        self.create_task(user, "📖 Read or listen to a book", 20).await?;
        self.create_task(user, "📝 Review your to-do list", 10).await?;
        let task = self.create_task(user, "📱 Open the bot", 25).await?;
        self.complete_task(user, task.id).await?;
        Ok(())
    }
}
