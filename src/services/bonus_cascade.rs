//! Overflow-bonus recomputation.
//!
//! The bonus entry for "tomorrow" is derived from "today's" score: half of
//! whatever exceeds the daily target. Granting or revoking that bonus changes
//! tomorrow's score, which can in turn change the bonus for the day after, so
//! a score change propagates forward day by day until nothing changes or the
//! recursion budget runs out. The budget exists because the chain is not
//! proven to terminate quickly on pathological historical data; hitting it is
//! a documented limitation, not an error.

use chrono::{Days, NaiveDate};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::domain::models::{WorkLogKind, BONUS_ENTRY_NAME};
use crate::domain::DomainResult;
use crate::infrastructure::database::work_log_repo::{self, NewWorkLog};
use crate::services::scoring_window::ScoringWindow;

/// Daily score a user aims for; scores above it overflow into a bonus.
pub const TARGET_SCORE: i64 = 100;

/// Recompute the bonus entry for the day after `date`, propagating forward
/// while changes keep crossing the target, at most `budget` extra days.
///
/// Returns the delta applied at `date` (the change in tomorrow's bonus
/// reward), which callers use to decide whether to tell the user a bonus was
/// granted or revoked. Must run inside the caller's user-locked transaction.
pub async fn recalculate_day_bonus(
    conn: &mut SqliteConnection,
    owner_id: i64,
    date: NaiveDate,
    budget: u32,
) -> DomainResult<i64> {
    let mut first_delta = None;
    let mut current = date;
    let mut remaining = budget;

    // Each pass settles the bonus derived from `current`; recursion on the
    // next day becomes another loop iteration with a smaller budget.
    loop {
        let next = current + Days::new(1);
        let mut window = ScoringWindow::load(&mut *conn, owner_id, current, next).await?;

        let day_score = window.day_score(current);
        let target_bonus = (day_score - TARGET_SCORE) / 2;

        let existing = work_log_repo::get_bonus_for(&mut *conn, owner_id, next).await?;
        let saved_bonus = existing.as_ref().map_or(0, |entry| entry.reward);

        let delta = if target_bonus == saved_bonus {
            0
        } else if target_bonus <= 0 {
            match existing {
                // Negative bonuses are never persisted.
                Some(entry) => {
                    work_log_repo::delete(&mut *conn, entry.id).await?;
                    -saved_bonus
                }
                None => 0,
            }
        } else {
            match existing {
                Some(entry) => {
                    work_log_repo::update_reward(&mut *conn, entry.id, target_bonus).await?
                }
                None => {
                    work_log_repo::insert(
                        &mut *conn,
                        &NewWorkLog {
                            owner_id,
                            task_id: None,
                            kind: WorkLogKind::Bonus,
                            name: BONUS_ENTRY_NAME.to_string(),
                            date: next,
                            reward: target_bonus,
                        },
                    )
                    .await?;
                }
            }
            target_bonus - saved_bonus
        };

        if first_delta.is_none() {
            first_delta = Some(delta);
        }

        if delta == 0 || remaining == 0 {
            if delta != 0 {
                debug!(owner_id, %current, "bonus cascade budget exhausted, stopping propagation");
            }
            break;
        }

        // Preview tomorrow with the delta applied; propagate only while the
        // score on either side of the change exceeds the target.
        let score_before = window.day_score(next);
        window.add_delta(next, delta);
        let score_after = window.day_score(next);

        if score_before.max(score_after) <= TARGET_SCORE {
            break;
        }

        remaining -= 1;
        current = next;
    }

    Ok(first_delta.unwrap_or(0))
}
