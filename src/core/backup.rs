//! Backup and restore of the whole database as one JSON document.
//!
//! Exports include soft-deleted rows and keep every primary key. Imports insert
//! rows with their original ids inside a single storage transaction, so a failure
//! anywhere leaves the database as it was. Importing therefore only succeeds into
//! an empty database; [`restore_all`] clears the tables first.
//!
//! Older backups written by the share-sheet path carry no `records` array. For
//! those, records are rebuilt from the transactions' dates and each transaction is
//! re-pointed at the record of its day. Documents holding several live records
//! for one day keep the lowest id live and import the rest as deleted.

use crate::{
    core::{
        record,
        timestamp::{self, kst_now},
    },
    entities::{
        Employer, Record, Transaction, Worker, employer, record as record_entity, transaction,
        worker,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Full snapshot of the four tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    /// KST timestamp of the export
    pub timestamp: String,
    /// Every employer, trashed ones included
    #[serde(default)]
    pub employers: Vec<employer::Model>,
    /// Every worker, trashed ones included
    #[serde(default)]
    pub workers: Vec<worker::Model>,
    /// Every day record; absent in legacy backups
    #[serde(default)]
    pub records: Vec<record_entity::Model>,
    /// Every transaction, trashed ones included
    #[serde(default)]
    pub transactions: Vec<transaction::Model>,
}

/// Row counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Employers inserted
    pub employers: usize,
    /// Workers inserted
    pub workers: usize,
    /// Records inserted or rebuilt
    pub records: usize,
    /// Transactions inserted
    pub transactions: usize,
}

/// File name used for a backup taken on `day`: `hirebook_backup_<YYYY-MM-DD>.json`.
#[must_use]
pub fn backup_file_name(day: NaiveDate) -> String {
    format!("hirebook_backup_{}.json", timestamp::format_day(day))
}

/// Reads every row of every table, ordered by id.
#[instrument(skip(db))]
pub async fn export_all<C: ConnectionTrait>(db: &C) -> Result<BackupDocument> {
    let document = BackupDocument {
        timestamp: kst_now(),
        employers: Employer::find()
            .order_by_asc(employer::Column::Id)
            .all(db)
            .await?,
        workers: Worker::find()
            .order_by_asc(worker::Column::Id)
            .all(db)
            .await?,
        records: Record::find()
            .order_by_asc(record_entity::Column::Id)
            .all(db)
            .await?,
        transactions: Transaction::find()
            .order_by_asc(transaction::Column::Id)
            .all(db)
            .await?,
    };
    info!(
        "Exported {} employers, {} workers, {} records, {} transactions",
        document.employers.len(),
        document.workers.len(),
        document.records.len(),
        document.transactions.len()
    );
    Ok(document)
}

/// Inserts every row of `document`, keeping primary keys, all or nothing.
#[instrument(skip(db, document))]
pub async fn import_all(
    db: &DatabaseConnection,
    document: &BackupDocument,
) -> Result<ImportReport> {
    let txn = db.begin().await?;
    let report = import_rows(&txn, document).await?;
    txn.commit().await?;
    info!("Imported backup: {:?}", report);
    Ok(report)
}

/// Removes every row from the four tables in one storage transaction.
#[instrument(skip(db))]
pub async fn delete_all_data(db: &DatabaseConnection) -> Result<()> {
    let txn = db.begin().await?;
    clear_tables(&txn).await?;
    txn.commit().await?;
    info!("Deleted all data");
    Ok(())
}

/// Replaces the whole database with `document` in one storage transaction.
#[instrument(skip(db, document))]
pub async fn restore_all(
    db: &DatabaseConnection,
    document: &BackupDocument,
) -> Result<ImportReport> {
    let txn = db.begin().await?;
    clear_tables(&txn).await?;
    let report = import_rows(&txn, document).await?;
    txn.commit().await?;
    info!("Restored backup taken at {}: {report:?}", document.timestamp);
    Ok(report)
}

/// Pretty-printed JSON for a backup document.
pub fn to_json(document: &BackupDocument) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(Into::into)
}

/// Parses a backup document.
pub fn from_json(json: &str) -> Result<BackupDocument> {
    serde_json::from_str(json).map_err(Into::into)
}

/// Writes `document` into `dir` under [`backup_file_name`] for today (KST).
pub fn write_backup(dir: &Path, document: &BackupDocument) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(timestamp::kst_today()));
    std::fs::write(&path, to_json(document)?)?;
    info!("Wrote backup to {}", path.display());
    Ok(path)
}

/// Reads a backup document from a file.
pub fn read_backup(path: &Path) -> Result<BackupDocument> {
    let json = std::fs::read_to_string(path)?;
    from_json(&json)
}

async fn clear_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    // Children first: transactions reference records.
    Transaction::delete_many().exec(db).await?;
    Record::delete_many().exec(db).await?;
    Worker::delete_many().exec(db).await?;
    Employer::delete_many().exec(db).await?;
    Ok(())
}

async fn import_rows<C: ConnectionTrait>(
    db: &C,
    document: &BackupDocument,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for row in &document.employers {
        let model: employer::ActiveModel = row.clone().into();
        Employer::insert(model.reset_all()).exec(db).await?;
        report.employers += 1;
    }
    for row in &document.workers {
        let model: worker::ActiveModel = row.clone().into();
        Worker::insert(model.reset_all()).exec(db).await?;
        report.workers += 1;
    }

    let rebuild_records = document.records.is_empty() && !document.transactions.is_empty();
    let merged_records = import_records(db, &document.records).await?;
    report.records = document.records.len();

    for row in &document.transactions {
        let mut model: transaction::ActiveModel = row.clone().into();
        model = model.reset_all();
        if rebuild_records {
            let day = timestamp::normalize_day(&row.date)?;
            let record_id = record::resolve_record_for_date(db, &day).await?;
            model.date = Set(day);
            model.record_id = Set(record_id);
        } else if let Some(kept) = merged_records.get(&row.record_id) {
            model.record_id = Set(*kept);
        }
        Transaction::insert(model).exec(db).await?;
        report.transactions += 1;
    }

    if rebuild_records {
        report.records = Record::find().all(db).await?.len();
    }
    Ok(report)
}

/// Inserts the records of a document, oldest id first.
///
/// Only one live record per day can be stored. When a document holds several
/// live records for the same day, the lowest id stays live and the others are
/// imported as deleted. Returns a map from each demoted id to the id kept for
/// its day, so that transactions can be re-pointed.
async fn import_records<C: ConnectionTrait>(
    db: &C,
    records: &[record_entity::Model],
) -> Result<HashMap<i64, i64>> {
    let mut ordered: Vec<&record_entity::Model> = records.iter().collect();
    ordered.sort_by_key(|row| row.id);

    let mut live_by_day: HashMap<&str, i64> = HashMap::new();
    let mut merged = HashMap::new();
    for row in ordered {
        let mut model: record_entity::ActiveModel = row.clone().into();
        model = model.reset_all();
        if !row.deleted {
            if let Some(&kept) = live_by_day.get(row.date.as_str()) {
                warn!(
                    "Record {} duplicates live record {} for {}, importing it as deleted",
                    row.id, kept, row.date
                );
                model.deleted = Set(true);
                merged.insert(row.id, kept);
            } else {
                live_by_day.insert(row.date.as_str(), row.id);
            }
        }
        Record::insert(model).exec(db).await?;
    }
    Ok(merged)
}
