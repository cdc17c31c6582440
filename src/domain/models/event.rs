//! Inbound events and dispatch outcomes.
//!
//! The transport layer parses whatever its protocol delivers into an
//! [`InboundEvent`]; the dispatcher decides which handler kind and name it
//! maps to, taking the user's pending-question state into account.

/// A document attached to a message, already downloaded by the transport.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// An event arriving from the transport.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Free-form message. When the user is idle its text is interpreted as a
    /// command name; when a question is pending it is the answer.
    Message {
        chat_user_id: i64,
        text: String,
        document: Option<Document>,
    },
    /// Structured command (e.g. an inline button press): a command name
    /// followed by space-separated arguments.
    Action { chat_user_id: i64, data: String },
}

impl InboundEvent {
    pub fn chat_user_id(&self) -> i64 {
        match self {
            Self::Message { chat_user_id, .. } | Self::Action { chat_user_id, .. } => *chat_user_id,
        }
    }
}

/// The four handler routes of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Plain message whose text is the command name
    Message,
    /// Structured command
    Action,
    /// Free-form reply to a pending question
    Answer,
    /// Document reply to a pending question
    FileAnswer,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Action => "action",
            Self::Answer => "answer",
            Self::FileAnswer => "file_answer",
        }
    }
}

/// Structured result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran to completion (including handled validation replies)
    Handled,
    /// No handler is registered for the routed (kind, name)
    NotFound,
    /// The handler failed; the failure was reported and swallowed
    Error,
}
