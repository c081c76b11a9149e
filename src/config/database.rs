//! Database configuration module for `HireBook`.
//!
//! This module handles the `SQLite` connection and idempotent schema creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the on-disk schema always matches the Rust structs. Indexes that the entity macros
//! cannot express (the partial unique index on live record dates) are created with raw SQL.

use crate::entities::{Employer, Record, Transaction, Worker};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Used when neither `DATABASE_URL` nor the settings file name a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/hirebook.sqlite?mode=rwc";

/// Secondary indexes, all `IF NOT EXISTS`.
///
/// `idx_records_live_date` enforces one non-deleted record per day.
const INDEX_STATEMENTS: [&str; 5] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_live_date ON records(date) WHERE deleted = 0",
    "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_record_id ON transactions(record_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_worker_id ON transactions(worker_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_employer_id ON transactions(employer_id)",
];

/// Opens a connection to the given database URL without touching the schema.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Opens the database and makes sure every table and index exists.
///
/// Failure here means storage is unusable; callers are expected to abort.
#[instrument]
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Initializing database connection to: {}", database_url);
    if let Some(dir) = sqlite_file_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    let db = create_connection(database_url).await?;
    info!("Database connection opened. Ensuring tables are created...");
    ensure_schema(&db).await?;
    Ok(db)
}

/// Creates the employers, workers, records and transactions tables if absent,
/// enables foreign-key enforcement and creates the secondary indexes.
///
/// Safe to call repeatedly; an existing schema is left untouched.
#[instrument(skip(db))]
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    create_table(db, Employer).await?;
    create_table(db, Worker).await?;
    create_table(db, Record).await?;
    create_table(db, Transaction).await?;

    for statement in INDEX_STATEMENTS {
        db.execute_unprepared(statement).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}

/// Directory holding the database file of a `sqlite://` URL, if it names one.
fn sqlite_file_dir(database_url: &str) -> Option<&Path> {
    let file = database_url
        .strip_prefix("sqlite://")?
        .split('?')
        .next()
        .filter(|file| !file.is_empty() && !file.contains(":memory:"))?;
    Path::new(file)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        employer::Model as EmployerModel, record::Model as RecordModel,
        transaction::Model as TransactionModel, worker::Model as WorkerModel,
    };
    use sea_orm::{FromQueryResult, QuerySelect, Statement};

    #[derive(Debug, FromQueryResult)]
    struct PragmaValue {
        foreign_keys: i32,
    }

    #[tokio::test]
    async fn test_ensure_schema_creates_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        ensure_schema(&db).await?;

        let _: Vec<EmployerModel> = Employer::find().limit(1).all(&db).await?;
        let _: Vec<WorkerModel> = Worker::find().limit(1).all(&db).await?;
        let _: Vec<RecordModel> = Record::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        ensure_schema(&db).await?;
        ensure_schema(&db).await?;

        let _: Vec<RecordModel> = Record::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        ensure_schema(&db).await?;

        let pragma = PragmaValue::find_by_statement(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_keys",
        ))
        .one(&db)
        .await?;
        assert_eq!(pragma.map(|p| p.foreign_keys), Some(1));
        Ok(())
    }

    #[test]
    fn test_sqlite_file_dir() {
        assert_eq!(
            sqlite_file_dir(DEFAULT_DATABASE_URL),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_file_dir("sqlite://hirebook.sqlite"), None);
        assert_eq!(sqlite_file_dir("sqlite::memory:"), None);
    }

    #[test]
    fn test_default_database_url_is_sqlite() {
        assert!(DEFAULT_DATABASE_URL.starts_with("sqlite://"));
    }
}
