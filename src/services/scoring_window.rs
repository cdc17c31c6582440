//! Rolling 7-day scoring window.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use sqlx::SqliteConnection;

use crate::domain::DomainResult;
use crate::infrastructure::database::work_log_repo;

/// In-memory per-day score aggregates for one user over a bounded range.
///
/// Purely read-and-compute: loading aggregates reward sums per date, and
/// [`ScoringWindow::add_delta`] adjusts the cache without touching storage,
/// which is how the cascade previews an uncommitted step.
#[derive(Debug, Default)]
pub struct ScoringWindow {
    day_scores: BTreeMap<NaiveDate, i64>,
}

impl ScoringWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load aggregates for `[start - 6 days, end]`; the six extra days are
    /// what a week average at `start` needs.
    pub async fn load(
        conn: &mut SqliteConnection,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<Self> {
        let from = start - Days::new(6);
        let mut window = Self::new();
        for (date, score) in work_log_repo::day_scores(conn, owner_id, from, end).await? {
            window.add_delta(date, score);
        }
        Ok(window)
    }

    /// Sum of all work-log rewards (user-logged + bonus) on `date`.
    pub fn day_score(&self, date: NaiveDate) -> i64 {
        self.day_scores.get(&date).copied().unwrap_or(0)
    }

    /// Adjust the in-memory aggregate only.
    pub fn add_delta(&mut self, date: NaiveDate, delta: i64) {
        *self.day_scores.entry(date).or_insert(0) += delta;
    }

    /// Day scores summed over the 7 calendar days ending at `date`, divided
    /// by 7. Integer division truncates toward zero on the sum.
    pub fn week_average(&self, date: NaiveDate) -> i64 {
        let total: i64 = (0..7)
            .map(|back| self.day_score(date - Days::new(back)))
            .sum();
        total / 7
    }
}
