//! Tallybot - Conversational Productivity Tracker
//!
//! Users log completed tasks against a personal, ordered task list, earn
//! point rewards, and the system maintains a rolling 7-day performance
//! average with an automatic "overflow bonus" carried to the next day.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models and the error taxonomy
//! - **Service Layer** (`services`): scoring window, bonus cascade, task
//!   position management, per-user serialization, update dispatch
//! - **Infrastructure Layer** (`infrastructure`): configuration and the
//!   SQLite-backed ledger store
//!
//! The chat transport is an external collaborator: it feeds
//! [`InboundEvent`]s to the [`Dispatcher`] and renders replies delivered
//! through its [`ReplySink`].

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, DispatchOutcome, Document, InboundEvent, PendingQuestion, QuestionKind, Task, User,
    WorkLog, WorkLogKind,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::database::{create_pool, LedgerStore};
pub use infrastructure::ConfigLoader;
pub use services::{
    BonusOutcome, Clock, Dispatcher, ReplySink, Services, SystemClock, TaskService, UserService,
};
