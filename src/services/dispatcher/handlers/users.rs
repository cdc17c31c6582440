//! Settings, work-date and time-zone handlers.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::domain::models::{HandlerKind, PendingQuestion, QuestionKind};
use crate::domain::{DomainError, DomainResult};
use crate::services::dispatcher::registry::{actions, commands};
use crate::services::dispatcher::{Handler, HandlerContext};

pub struct ShowSettings;

#[async_trait]
impl Handler for ShowSettings {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Message
    }

    fn name(&self) -> &'static str {
        commands::SHOW_SETTINGS
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let work_date = cx.services.users.selected_work_date(cx.user);
        let override_note = if cx.user.selected_work_date.is_some() {
            " (override)"
        } else {
            ""
        };

        cx.reply
            .answer(&format!(
                "Time zone: {}\nWork date: {work_date}{override_note}\n\n\
                 `choose_date` — edit another date\n\
                 `update_timezone` — change the time zone\n\
                 `rewrite_all_tasks` — edit all tasks at once\n\
                 `import_work_logs` — import work logs\n\
                 `export_data` — export your data\n\
                 `help` — how this works",
                cx.user.timezone
            ))
            .await
    }
}

pub struct ChooseDate;

#[async_trait]
impl Handler for ChooseDate {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::CHOOSE_DATE
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let today = cx.services.users.today_in_tz(cx.user);

        cx.services
            .users
            .ask(cx.user, PendingQuestion::new(QuestionKind::SetWorkDate))
            .await?;
        cx.reply
            .answer(&format!(
                "Enter a date to edit the data (for example, `{today}`).\n\
                 ⚠️ Don't forget to reset the date after data editing: `reset_work_date`."
            ))
            .await
    }
}

pub struct AnswerWorkDate;

#[async_trait]
impl Handler for AnswerWorkDate {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::SetWorkDate.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let raw = args.first().map(String::as_str).unwrap_or_default();

        // All rejections leave the question pending so the user can retry.
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            DomainError::validation(format!("`{raw}` is invalid date. Use format YYYY-MM-DD."))
        })?;

        let today = cx.services.users.today_in_tz(cx.user);
        if date > today + Days::new(31) {
            return Err(DomainError::validation(
                "You cannot edit data for more than a month in advance.",
            ));
        }
        if date < today - Days::new(365 * 3) {
            return Err(DomainError::validation(
                "You cannot edit data created more than 3 years ago.",
            ));
        }

        cx.services.users.set_work_date(cx.user, Some(date)).await?;
        cx.services.users.clear_pending(cx.user).await?;
        cx.reply
            .answer(&format!(
                "The work date successfully updated.\nYour current work date: {date}"
            ))
            .await
    }
}

pub struct ResetWorkDate;

#[async_trait]
impl Handler for ResetWorkDate {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::RESET_WORK_DATE
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.services.users.set_work_date(cx.user, None).await?;
        let today = cx.services.users.today_in_tz(cx.user);
        cx.reply
            .answer(&format!("The work date was reset.\nYour current work date: {today}"))
            .await
    }
}

pub struct SelectYesterday;

#[async_trait]
impl Handler for SelectYesterday {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::SELECT_YESTERDAY
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        let yesterday = cx.services.users.today_in_tz(cx.user) - Days::new(1);
        cx.services.users.set_work_date(cx.user, Some(yesterday)).await?;
        cx.reply
            .answer(&format!("Your current work date: {yesterday}"))
            .await
    }
}

pub struct UpdateTimezone;

#[async_trait]
impl Handler for UpdateTimezone {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::UPDATE_TIMEZONE
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.services
            .users
            .ask(cx.user, PendingQuestion::new(QuestionKind::UpdateTimezone))
            .await?;
        cx.reply
            .answer(&format!(
                "Your time zone: `{}`\n\n\
                 Send an IANA time zone name, e.g. `Europe/Berlin` (the \
                 \"TZ database name\" column of the tz database list).",
                cx.user.timezone
            ))
            .await
    }
}

pub struct AnswerTimezone;

#[async_trait]
impl Handler for AnswerTimezone {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Answer
    }

    fn name(&self) -> &'static str {
        QuestionKind::UpdateTimezone.as_str()
    }

    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()> {
        let timezone = args.first().map(String::as_str).unwrap_or_default();

        // An invalid zone leaves the question pending for another attempt.
        cx.services.users.update_timezone(cx.user, timezone.trim()).await?;
        cx.services.users.clear_pending(cx.user).await?;
        cx.reply.answer("Successfully saved 👍").await
    }
}
