//! Update dispatcher and conversation state machine.
//!
//! Routes one inbound event to exactly one handler based on the event kind
//! and the user's pending-question state, with all same-user work ordered
//! through the per-user serializer.

pub mod handlers;
pub mod registry;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::models::{DispatchOutcome, Document, HandlerKind, InboundEvent, User};
use crate::domain::{DomainError, DomainResult};
use crate::services::serializer::PerUserSerializer;
use crate::services::task_service::TaskService;
use crate::services::user_service::UserService;

pub use registry::{actions, commands, Handler, Registry};

/// The transport's reply surface. Rendering (keyboards, markup) lives on the
/// transport side; the core only emits text and documents.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn answer(&self, text: &str) -> DomainResult<()>;
    async fn answer_document(&self, file_name: &str, content: &str) -> DomainResult<()>;
}

/// Service bundle handed to handlers.
pub struct Services {
    pub tasks: TaskService,
    pub users: UserService,
}

/// Everything a handler sees for one event.
pub struct HandlerContext<'a> {
    pub user: &'a User,
    pub services: &'a Services,
    pub reply: &'a dyn ReplySink,
    /// Set only on the document-answer route.
    pub document: Option<&'a Document>,
}

pub struct Dispatcher {
    registry: Registry,
    services: Arc<Services>,
    serializer: PerUserSerializer,
    in_flight: AtomicUsize,
}

impl Dispatcher {
    /// Build a dispatcher with the full handler set. Fails if the routing
    /// table does not validate.
    pub fn new(services: Arc<Services>) -> anyhow::Result<Self> {
        let registry = Registry::build(handlers::all())?;
        Ok(Self {
            registry,
            services,
            serializer: PerUserSerializer::new(),
            in_flight: AtomicUsize::new(0),
        })
    }

    /// Dispatch one event, chained behind any in-flight operation for the
    /// same user, and wait for it to finish.
    pub async fn dispatch(&self, event: InboundEvent, reply: &dyn ReplySink) -> DispatchOutcome {
        let chain_key = event.chat_user_id();
        self.serializer.run(chain_key, self.handle_event(event, reply)).await
    }

    /// Dispatch one event in the background. The chain slot is claimed
    /// before this returns, so calling `submit` in arrival order yields
    /// per-user execution in arrival order.
    pub fn submit(self: &Arc<Self>, event: InboundEvent, reply: Arc<dyn ReplySink>) {
        let ticket = self.serializer.enqueue(event.chat_user_id());
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher
                .serializer
                .complete(ticket, dispatcher.handle_event(event, reply.as_ref()))
                .await;
            dispatcher.in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Let in-flight chains finish, up to `grace`. Operations still running
    /// afterwards are abandoned; the row lock keeps their partial work
    /// invisible and they reconcile on next use.
    pub async fn drain(&self, grace: Duration) {
        let deadline = Instant::now() + grace;

        while self.in_flight.load(Ordering::SeqCst) > 0 {
            if Instant::now() >= deadline {
                warn!(
                    remaining = self.in_flight.load(Ordering::SeqCst),
                    "drain grace period elapsed, abandoning in-flight operations"
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    async fn handle_event(&self, event: InboundEvent, reply: &dyn ReplySink) -> DispatchOutcome {
        match self.route_and_run(event, reply).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(%err, "dispatch failed");
                if let Err(reply_err) = reply.answer("Something went wrong. Try again later.").await
                {
                    warn!(%reply_err, "failed to deliver error reply");
                }
                DispatchOutcome::Error
            }
        }
    }

    async fn route_and_run(
        &self,
        event: InboundEvent,
        reply: &dyn ReplySink,
    ) -> DomainResult<DispatchOutcome> {
        let (mut user, created) = self.services.users.get_or_create(event.chat_user_id()).await?;

        let (kind, name, args, document) = route(&user, event);

        // An explicit command always beats a stale pending question.
        if kind == HandlerKind::Action && user.pending_question.is_some() {
            self.services.users.clear_pending(&user).await?;
            user.pending_question = None;
        }

        let outcome = match self.registry.get(kind, &name) {
            Some(handler) => {
                let cx = HandlerContext {
                    user: &user,
                    services: &self.services,
                    reply,
                    document: document.as_ref(),
                };
                match handler.handle(&cx, &args).await {
                    Ok(()) => DispatchOutcome::Handled,
                    Err(DomainError::Validation(msg) | DomainError::NotFound(msg)) => {
                        reply.answer(&msg).await?;
                        DispatchOutcome::Handled
                    }
                    Err(DomainError::Internal(msg)) => {
                        error!(user_id = user.id, %msg, "handler failed");
                        reply.answer("Something went wrong. Try again later.").await?;
                        DispatchOutcome::Error
                    }
                }
            }
            None => {
                if matches!(kind, HandlerKind::Answer | HandlerKind::FileAnswer) {
                    // Nothing can interpret this answer; drop the question
                    // rather than swallowing every message from now on.
                    self.services.users.clear_pending(&user).await?;
                    reply.answer("I can't interpret this answer. Choose an action.").await?;
                } else {
                    reply.answer("Unknown command. Try `settings`.").await?;
                }
                DispatchOutcome::NotFound
            }
        };

        if created {
            self.services.tasks.create_samples(&user).await?;
            reply.answer("I created sample tasks for you. You can delete them.").await?;
            info!(user_id = user.id, "new user set up with samples");
        }

        Ok(outcome)
    }
}

/// Decide the route for an event given the user's conversation state.
fn route(user: &User, event: InboundEvent) -> (HandlerKind, String, Vec<String>, Option<Document>) {
    match event {
        InboundEvent::Message { text, document, .. } => {
            if let Some(question) = &user.pending_question {
                let name = question.kind.as_str().to_string();
                if let Some(document) = document {
                    // Captured args only; the document itself travels in the
                    // handler context.
                    (HandlerKind::FileAnswer, name, question.args.clone(), Some(document))
                } else {
                    let mut args = vec![text];
                    args.extend(question.args.iter().cloned());
                    (HandlerKind::Answer, name, args, None)
                }
            } else {
                (HandlerKind::Message, text, Vec::new(), None)
            }
        }
        InboundEvent::Action { data, .. } => {
            let mut parts = data.split_whitespace().map(str::to_string);
            let name = parts.next().unwrap_or_default();
            (HandlerKind::Action, name, parts.collect(), None)
        }
    }
}
