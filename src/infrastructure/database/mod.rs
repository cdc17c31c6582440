//! SQLite-backed ledger store.

pub mod connection;
pub mod store;
pub mod task_repo;
pub mod user_repo;
pub mod work_log_repo;

pub use connection::{create_pool, ConnectionError};
pub use store::{LedgerStore, UserTx};

use chrono::NaiveDate;

use crate::domain::{DomainError, DomainResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar dates are stored as ISO text so range queries stay lexicographic.
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(text: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| DomainError::internal(format!("malformed stored date: {text}")))
}
