use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Create an in-memory SQLite database for testing.
///
/// Each call creates a completely isolated database instance with the
/// migrations applied. The pool is capped at one connection: every pooled
/// connection to `sqlite::memory:` would otherwise open its own empty
/// database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

/// Close the pool and clean up resources.
pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}
