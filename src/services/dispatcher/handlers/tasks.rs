//! Task list, completion, work-log and import/export handlers.

use async_trait::async_trait;

use super::{bonus_message, parse_id};
use crate::domain::models::{HandlerKind, PendingQuestion, QuestionKind};
use crate::domain::{DomainError, DomainResult};
use crate::services::dispatcher::registry::{actions, commands};
use crate::services::dispatcher::{Handler, HandlerContext};

const MAX_IMPORT_FILE_BYTES: usize = 1024 * 1024;

fn signed(reward: i64) -> String {
    if reward > 0 {
        format!("+{reward}")
    } else {
        reward.to_string()
    }
}

pub struct ShowTasks;

#[async_trait]
impl Handler for ShowTasks {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Message
    }

    fn name(&self) -> &'static str {
        commands::SHOW_TASKS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let tasks = cx.services.tasks.tasks_with_completions(cx.user).await?;

        if tasks.is_empty() {
            return cx
                .reply
                .answer("You don't have tasks. Create the first one: `create_task`.")
                .await;
        }

        let mut lines = vec!["Your current tasks:".to_string()];
        for (task, completions) in tasks {
            let mut line = format!("{}. {} [{}]", task.position, task.name, task.signed_reward());
            if completions > 0 {
                line.push_str(&format!(" — done {completions}x"));
            }
            lines.push(line);
        }
        lines.push(String::new());
        lines.push("Complete one with `complete_task <id>`, inspect with `edit_task <id>`.".to_string());

        cx.reply.answer(&lines.join("\n")).await
    }
}

pub struct ShowStats;

#[async_trait]
impl Handler for ShowStats {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Message
    }

    fn name(&self) -> &'static str {
        commands::SHOW_STATS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let stats = cx.services.tasks.day_stats(cx.user).await?;

        let mut lines = vec![format!("Your work log for {}:", stats.date)];
        if stats.entries.is_empty() {
            lines.push("(nothing logged yet)".to_string());
        }
        for entry in &stats.entries {
            lines.push(format!("{} — {}", signed(entry.reward), entry.display_name()));
        }
        lines.push(String::new());
        lines.push(format!("Day score: {}", stats.day_score));
        lines.push(format!("Average for 7 days: {}", stats.week_average));

        cx.reply.answer(&lines.join("\n")).await
    }
}

pub struct ShowFinishedTasks;

#[async_trait]
impl Handler for ShowFinishedTasks {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::SHOW_FINISHED_TASKS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let entries = cx.services.tasks.work_logs_for_selected_date(cx.user).await?;

        if entries.is_empty() {
            return cx.reply.answer("You haven't finished any tasks yet.").await;
        }

        let mut lines = Vec::with_capacity(entries.len() + 1);
        for entry in &entries {
            lines.push(format!(
                "#{} {} — {}",
                entry.id,
                signed(entry.reward),
                entry.display_name()
            ));
        }
        lines.push("Remove an entry with `delete_work_log <id>`.".to_string());

        cx.reply.answer(&lines.join("\n")).await
    }
}

pub struct CreateTask;

#[async_trait]
impl Handler for CreateTask {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::CREATE_TASK
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.services
            .users
            .ask(cx.user, PendingQuestion::new(QuestionKind::NewTaskName))
            .await?;
        cx.reply.answer("Enter a name for the new task").await
    }
}

pub struct AnswerNewTaskName;

#[async_trait]
impl Handler for AnswerNewTaskName {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::NewTaskName.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let name = args.first().map(String::as_str).unwrap_or_default();

        // Whatever happens to the creation attempt, the question is spent.
        cx.services.users.clear_pending(cx.user).await?;
        let task = cx.services.tasks.create_task(cx.user, name, 0).await?;

        cx.reply
            .answer(&format!(
                "You successfully created the new task 🎉\n\
                 Set its reward with `change_task_reward {}`.",
                task.id
            ))
            .await
    }
}

pub struct CompleteTask;

#[async_trait]
impl Handler for CompleteTask {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::COMPLETE_TASK
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        let outcome = cx.services.tasks.complete_task(cx.user, task_id).await?;

        cx.reply.answer("Good work 👍").await?;
        if let Some(text) = bonus_message(outcome.day_bonus_delta) {
            cx.reply.answer(&text).await?;
        }
        Ok(())
    }
}

pub struct EditTask;

#[async_trait]
impl Handler for EditTask {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::EDIT_TASK
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        let task = cx.services.tasks.get_task(cx.user, task_id).await?;

        cx.reply
            .answer(&format!(
                "Task: {}\nReward: {}\nPosition: {}\n\n\
                 `change_task_name {id}` — rename\n\
                 `change_task_reward {id}` — set the reward\n\
                 `move_task {id}` — move in the list\n\
                 `delete_task {id}` — delete",
                task.name,
                task.signed_reward(),
                task.position,
                id = task.id,
            ))
            .await
    }
}

pub struct DeleteTask;

#[async_trait]
impl Handler for DeleteTask {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::DELETE_TASK
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        cx.services.tasks.delete_task(cx.user, task_id).await?;
        cx.reply.answer("The task was deleted.").await
    }
}

pub struct ChangeTaskName;

#[async_trait]
impl Handler for ChangeTaskName {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::CHANGE_TASK_NAME
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        let task = cx.services.tasks.get_task(cx.user, task_id).await?;

        cx.services
            .users
            .ask(cx.user, PendingQuestion::with_arg(QuestionKind::ChangeTaskName, task.id.to_string()))
            .await?;
        cx.reply.answer(&format!("Enter a new name for `{}`", task.name)).await
    }
}

pub struct AnswerTaskName;

#[async_trait]
impl Handler for AnswerTaskName {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::ChangeTaskName.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let new_name = args.first().map(String::as_str).unwrap_or_default();
        let task_id = parse_id(args, 1)?;

        let old = cx.services.tasks.get_task(cx.user, task_id).await?;
        // A duplicate-name error leaves the question pending so the user can
        // just send another name.
        let task = cx.services.tasks.rename_task(cx.user, task_id, new_name).await?;
        cx.services.users.clear_pending(cx.user).await?;

        cx.reply
            .answer(&format!(
                "You successfully changed the task name!\n\
                 The old name: `{}`\nThe new name: `{}`",
                old.name, task.name
            ))
            .await
    }
}

pub struct ChangeTaskReward;

#[async_trait]
impl Handler for ChangeTaskReward {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::CHANGE_TASK_REWARD
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        let task = cx.services.tasks.get_task(cx.user, task_id).await?;

        cx.services
            .users
            .ask(cx.user, PendingQuestion::with_arg(QuestionKind::ChangeTaskReward, task.id.to_string()))
            .await?;
        cx.reply
            .answer(&format!("Enter a new reward for `{}` (current: {})", task.name, task.signed_reward()))
            .await
    }
}

pub struct AnswerTaskReward;

#[async_trait]
impl Handler for AnswerTaskReward {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::ChangeTaskReward.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let raw = args.first().map(String::as_str).unwrap_or_default();
        let task_id = parse_id(args, 1)?;

        let reward: i64 = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("`{raw}` is invalid value.")))?;

        cx.services.tasks.set_task_reward(cx.user, task_id, reward).await?;
        cx.services.users.clear_pending(cx.user).await?;
        cx.reply.answer("You successfully updated the task reward!").await
    }
}

pub struct MoveTask;

#[async_trait]
impl Handler for MoveTask {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::MOVE_TASK
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let task_id = parse_id(args, 0)?;
        let task = cx.services.tasks.get_task(cx.user, task_id).await?;
        let count = cx.services.tasks.tasks(cx.user).await?.len();

        cx.services
            .users
            .ask(cx.user, PendingQuestion::with_arg(QuestionKind::MoveTask, task.id.to_string()))
            .await?;
        cx.reply
            .answer(&format!(
                "Enter a new position for `{}` (1-{}, {} moves it to the end)",
                task.name,
                count,
                count + 1
            ))
            .await
    }
}

pub struct AnswerTaskPosition;

#[async_trait]
impl Handler for AnswerTaskPosition {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::MoveTask.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let raw = args.first().map(String::as_str).unwrap_or_default();
        let task_id = parse_id(args, 1)?;

        let position: i64 = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("`{raw}` is invalid value.")))?;

        cx.services.tasks.move_task(cx.user, task_id, position).await?;
        cx.services.users.clear_pending(cx.user).await?;
        cx.reply.answer("The task was moved.").await
    }
}

pub struct DeleteWorkLog;

#[async_trait]
impl Handler for DeleteWorkLog {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::DELETE_WORK_LOG
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let work_log_id = parse_id(args, 0)?;
        let outcome = cx.services.tasks.delete_work_log(cx.user, work_log_id).await?;

        cx.reply.answer("The entry was deleted.").await?;
        if let Some(text) = bonus_message(outcome.day_bonus_delta) {
            cx.reply.answer(&text).await?;
        }
        Ok(())
    }
}

pub struct RewriteAllTasks;

#[async_trait]
impl Handler for RewriteAllTasks {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::REWRITE_ALL_TASKS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let template = cx.services.tasks.bulk_rewrite_template(cx.user).await?;

        cx.services
            .users
            .ask(cx.user, PendingQuestion::new(QuestionKind::TaskList))
            .await?;
        cx.reply
            .answer(&format!(
                "Send the full task list as JSON; the order you send becomes the \
                 list order, and tasks missing from it are deleted.\n\n{template}"
            ))
            .await
    }
}

pub struct AnswerTaskList;

#[async_trait]
impl Handler for AnswerTaskList {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::TaskList.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let payload = args.first().map(String::as_str).unwrap_or_default();

        cx.services.users.clear_pending(cx.user).await?;
        cx.services.tasks.bulk_rewrite(cx.user, payload).await?;
        cx.reply.answer("Successfully saved 👍").await
    }
}

pub struct ImportWorkLogs;

#[async_trait]
impl Handler for ImportWorkLogs {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::IMPORT_WORK_LOGS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let template = cx.services.tasks.import_template(cx.user)?;

        cx.services
            .users
            .ask(cx.user, PendingQuestion::new(QuestionKind::WorkLogFile))
            .await?;
        cx.reply
            .answer(&format!(
                "Upload a JSON file with work logs grouped by date. Existing \
                 entries on the imported dates are replaced.\n\n{template}"
            ))
            .await
    }
}

pub struct AnswerWorkLogFile;

#[async_trait]
impl Handler for AnswerWorkLogFile {
    fn kind(&self) -> HandlerKind {
        HandlerKind::FileAnswer
    }

    fn name(&self) -> &'static str {
        QuestionKind::WorkLogFile.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        // Check the document before spending the question, so the user can
        // simply upload another file.
        let document = cx
            .document
            .ok_or_else(|| DomainError::validation("You need to upload a JSON file."))?;

        if document.content.len() > MAX_IMPORT_FILE_BYTES {
            return Err(DomainError::validation("Your file is too large (> 1 Mb)."));
        }
        if document.mime_type != "application/json" {
            return Err(DomainError::validation("You need to upload a JSON file."));
        }
        let payload = std::str::from_utf8(&document.content)
            .map_err(|_| DomainError::validation("JSON is invalid."))?;

        cx.services.users.clear_pending(cx.user).await?;
        cx.services.tasks.import_work_logs(cx.user, payload).await?;
        cx.reply.answer("Successfully saved 👍").await
    }
}

pub struct ExportData;

#[async_trait]
impl Handler for ExportData {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::EXPORT_DATA
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        for file in cx.services.tasks.export_data(cx.user).await? {
            cx.reply.answer_document(&file.file_name, &file.content).await?;
        }
        Ok(())
    }
}
