//! Shared test utilities for `HireBook`.
//!
//! Helpers for setting up an in-memory database and creating rows with
//! sensible defaults.

use crate::{
    core::{
        employer::{self, NewEmployer},
        transaction::{self, InsertedTransaction, NewTransaction},
        worker::{self, NewWorker},
    },
    entities::TransactionKind,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Phone number given to every test person.
pub const TEST_TEL: &str = "01012345678";

/// Creates an in-memory `SQLite` database with all tables and indexes initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::ensure_schema(&db).await?;
    Ok(db)
}

/// Installs a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates an employer with the given name and [`TEST_TEL`], returning its id.
pub async fn create_test_employer(db: &DatabaseConnection, name: &str) -> Result<i64> {
    employer::insert(db, NewEmployer::new(name, TEST_TEL)).await
}

/// Creates a worker with the given name and [`TEST_TEL`], returning its id.
pub async fn create_test_worker(db: &DatabaseConnection, name: &str) -> Result<i64> {
    worker::insert(db, NewWorker::new(name, TEST_TEL)).await
}

/// Creates a transaction with no linked person.
///
/// # Defaults
/// * `category`: "기타"
/// * `payment_type`, `note`: empty
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    date: &str,
    amount: i64,
    kind: TransactionKind,
) -> Result<InsertedTransaction> {
    transaction::insert_with_record(db, NewTransaction::new(date, amount, kind, "기타")).await
}
