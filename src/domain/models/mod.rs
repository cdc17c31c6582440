//! Domain models.

pub mod config;
pub mod event;
pub mod task;
pub mod user;
pub mod work_log;

pub use config::{Config, DatabaseConfig, LoggingConfig, TrackerConfig};
pub use event::{DispatchOutcome, Document, HandlerKind, InboundEvent};
pub use task::Task;
pub use user::{PendingQuestion, QuestionKind, User};
pub use work_log::{WorkLog, WorkLogKind, BONUS_ENTRY_NAME};
