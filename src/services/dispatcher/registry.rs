//! The static routing table: `(handler kind, name)` → handler.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

use crate::domain::models::{HandlerKind, QuestionKind};
use crate::domain::DomainResult;
use crate::services::dispatcher::HandlerContext;

/// Command names typed as plain messages.
pub mod commands {
    pub const START: &str = "/start";
    pub const SHOW_TASKS: &str = "tasks";
    pub const SHOW_STATS: &str = "stats";
    pub const SHOW_SETTINGS: &str = "settings";

    pub const ALL: &[&str] = &[START, SHOW_TASKS, SHOW_STATS, SHOW_SETTINGS];
}

/// Structured command names (button presses and the like).
pub mod actions {
    pub const HELP: &str = "help";
    pub const CANCEL_QUESTION: &str = "cancel_question";
    pub const CREATE_TASK: &str = "create_task";
    pub const COMPLETE_TASK: &str = "complete_task";
    pub const EDIT_TASK: &str = "edit_task";
    pub const DELETE_TASK: &str = "delete_task";
    pub const CHANGE_TASK_NAME: &str = "change_task_name";
    pub const CHANGE_TASK_REWARD: &str = "change_task_reward";
    pub const MOVE_TASK: &str = "move_task";
    pub const DELETE_WORK_LOG: &str = "delete_work_log";
    pub const SHOW_FINISHED_TASKS: &str = "show_finished_tasks";
    pub const REWRITE_ALL_TASKS: &str = "rewrite_all_tasks";
    pub const IMPORT_WORK_LOGS: &str = "import_work_logs";
    pub const EXPORT_DATA: &str = "export_data";
    pub const CHOOSE_DATE: &str = "choose_date";
    pub const RESET_WORK_DATE: &str = "reset_work_date";
    pub const SELECT_YESTERDAY: &str = "select_yesterday";
    pub const UPDATE_TIMEZONE: &str = "update_timezone";

    pub const ALL: &[&str] = &[
        HELP,
        CANCEL_QUESTION,
        CREATE_TASK,
        COMPLETE_TASK,
        EDIT_TASK,
        DELETE_TASK,
        CHANGE_TASK_NAME,
        CHANGE_TASK_REWARD,
        MOVE_TASK,
        DELETE_WORK_LOG,
        SHOW_FINISHED_TASKS,
        REWRITE_ALL_TASKS,
        IMPORT_WORK_LOGS,
        EXPORT_DATA,
        CHOOSE_DATE,
        RESET_WORK_DATE,
        SELECT_YESTERDAY,
        UPDATE_TIMEZONE,
    ];
}

/// One route of the dispatch table.
///
/// Handlers receive the routed arguments: for actions, whatever followed the
/// command name; for answers, the reply text followed by the args captured
/// when the question was asked.
#[async_trait]
pub trait Handler: Send + Sync {
    fn kind(&self) -> HandlerKind;
    fn name(&self) -> &'static str;
    async fn handle(&self, cx: &HandlerContext<'_>, args: &[String]) -> DomainResult<()>;
}

pub struct Registry {
    routes: HashMap<HandlerKind, HashMap<&'static str, Arc<dyn Handler>>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Build and validate the routing table. Fails fast so a misdeclared
    /// handler set is caught at startup, not at first use.
    pub fn build(handlers: Vec<Arc<dyn Handler>>) -> anyhow::Result<Self> {
        let mut routes: HashMap<HandlerKind, HashMap<&'static str, Arc<dyn Handler>>> =
            HashMap::new();

        for handler in handlers {
            let kind = handler.kind();
            let name = handler.name();

            let known = match kind {
                HandlerKind::Message => commands::ALL.contains(&name),
                HandlerKind::Action => actions::ALL.contains(&name),
                HandlerKind::Answer | HandlerKind::FileAnswer => {
                    QuestionKind::from_str(name).is_some()
                }
            };
            if !known {
                bail!("handler name {}.{name} is not declared", kind.as_str());
            }

            if routes.entry(kind).or_default().insert(name, handler).is_some() {
                bail!("handler {}.{name} is registered twice", kind.as_str());
            }
        }

        for name in commands::ALL {
            if Self::lookup(&routes, HandlerKind::Message, name).is_none() {
                bail!("no handler for command {name}");
            }
        }
        for name in actions::ALL {
            if Self::lookup(&routes, HandlerKind::Action, name).is_none() {
                bail!("no handler for action {name}");
            }
        }
        // A question needs a handler of either the plain-text or the
        // document-accepting variety.
        for question in QuestionKind::ALL {
            let name = question.as_str();
            if Self::lookup(&routes, HandlerKind::Answer, name).is_none()
                && Self::lookup(&routes, HandlerKind::FileAnswer, name).is_none()
            {
                bail!("no answer handler for question {name}");
            }
        }

        Ok(Self { routes })
    }

    pub fn get(&self, kind: HandlerKind, name: &str) -> Option<&Arc<dyn Handler>> {
        Self::lookup(&self.routes, kind, name)
    }

    fn lookup<'a>(
        routes: &'a HashMap<HandlerKind, HashMap<&'static str, Arc<dyn Handler>>>,
        kind: HandlerKind,
        name: &str,
    ) -> Option<&'a Arc<dyn Handler>> {
        routes.get(&kind).and_then(|by_name| by_name.get(name))
    }
}
