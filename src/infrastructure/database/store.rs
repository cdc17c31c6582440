//! The ledger store: pool handle plus the per-user transactional lock.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::domain::DomainResult;

/// Shared handle to the durable per-user collections of tasks and work logs.
///
/// Reads outside a mutation go straight through [`LedgerStore::pool`] and may
/// observe a pre-mutation snapshot. Every mutating operation must instead run
/// inside [`LedgerStore::lock_user`], which pins the user's row for the
/// duration of one transaction. The in-process serializer already orders
/// same-user operations; the row lock is what keeps a second process (e.g.
/// after a restart mid-flight) from interleaving destructively.
#[derive(Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
}

impl LedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction holding the write lock for `user_id`.
    ///
    /// SQLite has no `SELECT ... FOR UPDATE`; a self-assignment UPDATE of the
    /// user's row is a write statement, so it promotes the transaction to the
    /// writer immediately instead of deferring until the first real write.
    pub async fn lock_user(&self, user_id: i64) -> DomainResult<UserTx> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET id = id WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        Ok(UserTx { tx })
    }
}

/// An open transaction scoped to one user's mutation.
///
/// Dropping it without [`UserTx::commit`] rolls everything back, which is
/// what keeps half-applied position shifts and bonus rewrites invisible.
pub struct UserTx {
    tx: Transaction<'static, Sqlite>,
}

impl UserTx {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> DomainResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
