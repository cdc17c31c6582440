//! Service layer: the ledger logic, per-user serialization and dispatch.

pub mod bonus_cascade;
pub mod clock;
pub mod dispatcher;
pub mod scoring_window;
pub mod serializer;
pub mod task_service;
pub mod user_service;

pub use clock::{Clock, SystemClock};
pub use dispatcher::{Dispatcher, ReplySink, Services};
pub use scoring_window::ScoringWindow;
pub use serializer::PerUserSerializer;
pub use task_service::{BonusOutcome, DayStats, TaskService};
pub use user_service::UserService;
