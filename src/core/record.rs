//! Record aggregator - keeps exactly one live record per calendar day.
//!
//! Transactions never create records directly; they ask
//! [`resolve_record_for_date`] for the bucket of their date. A unique partial index
//! on `records(date) WHERE deleted = 0` guarantees that two writers racing on a new
//! date cannot both create a record: the loser's insert fails with a unique
//! violation and it re-reads the winner's row instead.

use crate::{
    core::timestamp::{self, kst_now},
    entities::{Record, record},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Finds the live (non-deleted) record for a day.
pub async fn get_by_date<C: ConnectionTrait>(db: &C, date: &str) -> Result<Option<record::Model>> {
    let day = timestamp::normalize_day(date)?;
    find_live_by_day(db, &day).await
}

/// Finds a record by id regardless of its deleted flag.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<record::Model>> {
    Record::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Live records of a month, oldest day first.
pub async fn get_for_month<C: ConnectionTrait>(
    db: &C,
    year: i32,
    month: u32,
) -> Result<Vec<record::Model>> {
    let prefix = timestamp::month_prefix(year, month)?;
    Record::find()
        .filter(record::Column::Deleted.eq(false))
        .filter(record::Column::Date.starts_with(&prefix))
        .order_by_asc(record::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the id of the live record for `date`, creating it if needed.
///
/// Soft-deleted records are never reused; a day whose record was trashed gets a
/// fresh one. Run this inside the same storage transaction as the write that
/// uses the returned id.
#[instrument(skip(db))]
pub async fn resolve_record_for_date<C: ConnectionTrait>(db: &C, date: &str) -> Result<i64> {
    let day = timestamp::normalize_day(date)?;

    if let Some(existing) = find_live_by_day(db, &day).await? {
        debug!("Reusing record {} for {}", existing.id, day);
        return Ok(existing.id);
    }

    insert_live_record(db, &day).await
}

/// Inserts the live record for `day`. When another writer got there first, the
/// unique index rejects the insert and the winner's id is returned instead.
async fn insert_live_record<C: ConnectionTrait>(db: &C, day: &str) -> Result<i64> {
    let now = kst_now();
    let new_record = record::ActiveModel {
        date: Set(day.to_string()),
        created_date: Set(now.clone()),
        updated_date: Set(now),
        deleted: Set(false),
        ..Default::default()
    };

    match Record::insert(new_record).exec(db).await {
        Ok(inserted) => {
            info!("Created record {} for {}", inserted.last_insert_id, day);
            Ok(inserted.last_insert_id)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            warn!("Record for {} was created concurrently, re-reading", day);
            find_live_by_day(db, day)
                .await?
                .map(|winner| winner.id)
                .ok_or(Error::Database(err))
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_live_by_day<C: ConnectionTrait>(db: &C, day: &str) -> Result<Option<record::Model>> {
    Record::find()
        .filter(record::Column::Date.eq(day))
        .filter(record::Column::Deleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}
