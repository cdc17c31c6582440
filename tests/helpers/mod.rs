#![allow(dead_code)]

pub mod database;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use tallybot::domain::models::TrackerConfig;
use tallybot::services::clock::Clock;
use tallybot::{DomainResult, LedgerStore, ReplySink, Services, TaskService, User, UserService};

/// Clock pinned to a fixed instant, so "today" is stable in tests.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Noon UTC on the given date.
pub fn clock_at(date: NaiveDate) -> Arc<FixedClock> {
    let instant = Utc
        .from_utc_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"));
    Arc::new(FixedClock(instant))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Service bundle over the given pool with the default tracker config.
pub fn build_services(pool: &SqlitePool, clock: Arc<FixedClock>) -> Services {
    build_services_with(pool, clock, TrackerConfig::default())
}

pub fn build_services_with(
    pool: &SqlitePool,
    clock: Arc<FixedClock>,
    config: TrackerConfig,
) -> Services {
    let store = LedgerStore::new(pool.clone());
    Services {
        tasks: TaskService::new(store.clone(), clock.clone(), config),
        users: UserService::new(store, clock),
    }
}

pub async fn create_user(services: &Services, chat_user_id: i64) -> User {
    let (user, _) = services
        .users
        .get_or_create(chat_user_id)
        .await
        .expect("failed to create user");
    user
}

/// Reload the user to observe persisted state changes.
pub async fn reload_user(services: &Services, chat_user_id: i64) -> User {
    create_user(services, chat_user_id).await
}

/// Reply sink that records everything for assertions.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    documents: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("sink lock").clone()
    }

    pub fn documents(&self) -> Vec<(String, String)> {
        self.documents.lock().expect("sink lock").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|text| text.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.lock().expect("sink lock").clear();
        self.documents.lock().expect("sink lock").clear();
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn answer(&self, text: &str) -> DomainResult<()> {
        self.messages.lock().expect("sink lock").push(text.to_string());
        Ok(())
    }

    async fn answer_document(&self, file_name: &str, content: &str) -> DomainResult<()> {
        self.documents
            .lock()
            .expect("sink lock")
            .push((file_name.to_string(), content.to_string()));
        Ok(())
    }
}

/// Positions of the user's tasks in list order, for invariant assertions.
pub async fn positions(services: &Services, user: &User) -> Vec<i64> {
    services
        .tasks
        .tasks(user)
        .await
        .expect("failed to list tasks")
        .iter()
        .map(|task| task.position)
        .collect()
}

/// All bonus rows of one user as `(date, reward)`, ordered by date.
pub async fn bonus_rows(pool: &SqlitePool, user: &User) -> Vec<(String, i64)> {
    sqlx::query_as(
        "SELECT date, reward FROM work_logs WHERE owner_id = ? AND kind = 'bonus' ORDER BY date",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await
    .expect("failed to query bonus rows")
}
