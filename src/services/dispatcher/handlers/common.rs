//! Greeting, help and question cancellation.

use async_trait::async_trait;

use crate::domain::models::HandlerKind;
use crate::domain::DomainResult;
use crate::services::bonus_cascade::TARGET_SCORE;
use crate::services::dispatcher::registry::{actions, commands};
use crate::services::dispatcher::{Handler, HandlerContext};

pub struct Start;

#[async_trait]
impl Handler for Start {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Message
    }

    fn name(&self) -> &'static str {
        commands::START
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.reply.answer("Hello! What have you done usefully today?").await?;
        Help.handle(cx, &[]).await?;
        cx.reply
            .answer("Don't forget to update your time zone in the settings.")
            .await
    }
}

pub struct Help;

#[async_trait]
impl Handler for Help {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::HELP
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.reply
            .answer(&format!(
                "Create a list of tasks you evaluate your performance with and set a \
                 reward for each one.\n\
                 Every day you should aim to collect {TARGET_SCORE} points. One day your \
                 productivity can be low and the next day high, so the number to watch \
                 is the \"average\": the points collected over the last 7 days divided \
                 by 7.\n\
                 Collect more than {TARGET_SCORE} points in a day and half of the \
                 overflow carries into tomorrow as a bonus.\n\n\
                 Commands: `tasks`, `stats`, `settings`."
            ))
            .await
    }
}

pub struct CancelQuestion;

#[async_trait]
impl Handler for CancelQuestion {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn name(&self) -> &'static str {
        actions::CANCEL_QUESTION
    }

    async fn handle(&self, cx: &HandlerContext<'_>, _args: &[String]) -> DomainResult<()> {
        cx.services.users.clear_pending(cx.user).await?;
        cx.reply.answer("Canceled 👍\nYou can select another action.").await
    }
}
