//! User state: identity, pending questions, time zone, work-date override.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::models::{PendingQuestion, User};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::{user_repo, LedgerStore};
use crate::services::clock::{self, Clock};

#[derive(Clone)]
pub struct UserService {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: LedgerStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resolve the transport identity to a user, creating the row on first
    /// contact. Returns `(user, created)`.
    pub async fn get_or_create(&self, chat_user_id: i64) -> DomainResult<(User, bool)> {
        let mut conn = self.store.pool().acquire().await?;
        user_repo::get_or_create(&mut conn, chat_user_id).await
    }

    /// Record the question the next free-form reply answers.
    pub async fn ask(&self, user: &User, question: PendingQuestion) -> DomainResult<()> {
        let mut tx = self.store.lock_user(user.id).await?;
        user_repo::set_pending_question(tx.conn(), user.id, Some(&question)).await?;
        tx.commit().await
    }

    pub async fn clear_pending(&self, user: &User) -> DomainResult<()> {
        if user.pending_question.is_none() {
            return Ok(());
        }
        let mut tx = self.store.lock_user(user.id).await?;
        user_repo::set_pending_question(tx.conn(), user.id, None).await?;
        tx.commit().await
    }

    pub async fn update_timezone(&self, user: &User, timezone: &str) -> DomainResult<()> {
        if timezone.parse::<Tz>().is_err() {
            return Err(DomainError::validation("Time zone is invalid."));
        }

        let mut tx = self.store.lock_user(user.id).await?;
        user_repo::set_timezone(tx.conn(), user.id, timezone).await?;
        tx.commit().await
    }

    pub async fn set_work_date(&self, user: &User, date: Option<NaiveDate>) -> DomainResult<()> {
        let mut tx = self.store.lock_user(user.id).await?;
        user_repo::set_selected_work_date(tx.conn(), user.id, date).await?;
        tx.commit().await
    }

    /// Today in the user's stored time zone, ignoring any override.
    pub fn today_in_tz(&self, user: &User) -> NaiveDate {
        clock::today_in_tz(self.clock.as_ref(), &user.timezone)
    }

    /// The date work is currently logged against: override or today.
    pub fn selected_work_date(&self, user: &User) -> NaiveDate {
        clock::selected_work_date(self.clock.as_ref(), user)
    }
}
