//! Transaction repository - income and expense entries bucketed by day.
//!
//! Every write goes through the record aggregator inside one storage transaction,
//! so a transaction's `record_id` always points at the live record of its own
//! `date`. That includes edits: changing the date moves the transaction to the
//! record of the new day.
//!
//! All listings hide soft-deleted rows and share one ordering, newest first:
//! `date` desc, then `created_date` desc, then `id` desc.

use crate::{
    core::{
        record,
        timestamp::{self, kst_now},
        trash::{self, TrashKind},
    },
    entities::{Employer, Transaction, TransactionKind, Worker, employer, transaction, worker},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Select, Set, TransactionTrait, prelude::*, sea_query::SimpleExpr,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, instrument};

/// Fields for a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Non-negative amount in currency units
    pub amount: i64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Free-text category, must not be blank
    pub category: String,
    /// Free-text payment method
    pub payment_type: String,
    /// Free-form memo
    pub note: String,
    /// Worker involved; exclusive with `employer_id`
    pub worker_id: Option<i64>,
    /// Employer involved; exclusive with `worker_id`
    pub employer_id: Option<i64>,
}

impl NewTransaction {
    /// Starts a transaction with its required fields.
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        amount: i64,
        kind: TransactionKind,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount,
            kind,
            category: category.into(),
            payment_type: String::new(),
            note: String::new(),
            worker_id: None,
            employer_id: None,
        }
    }

    /// Links the transaction to a worker.
    #[must_use]
    pub const fn with_worker(mut self, worker_id: i64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Links the transaction to an employer.
    #[must_use]
    pub const fn with_employer(mut self, employer_id: i64) -> Self {
        self.employer_id = Some(employer_id);
        self
    }

    /// Sets the payment method.
    #[must_use]
    pub fn with_payment_type(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = payment_type.into();
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
///
/// The person links are doubly optional: `Some(None)` clears the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    /// New day; re-buckets the transaction when it differs
    pub date: Option<String>,
    /// New amount
    pub amount: Option<i64>,
    /// New direction
    pub kind: Option<TransactionKind>,
    /// New category
    pub category: Option<String>,
    /// New payment method
    pub payment_type: Option<String>,
    /// New memo
    pub note: Option<String>,
    /// New worker link
    pub worker_id: Option<Option<i64>>,
    /// New employer link
    pub employer_id: Option<Option<i64>>,
}

/// Ids produced by [`insert_with_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedTransaction {
    /// Record the transaction was bucketed into
    pub record_id: i64,
    /// The new transaction
    pub transaction_id: i64,
}

/// Optional filters for [`search`]; provided fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only transactions of this worker
    pub worker_id: Option<i64>,
    /// Only transactions of this employer
    pub employer_id: Option<i64>,
    /// First day, inclusive
    pub from: Option<String>,
    /// Last day, inclusive
    pub to: Option<String>,
    /// Only income or only expense
    pub kind: Option<TransactionKind>,
    /// Exact category
    pub category: Option<String>,
}

/// A transaction with its worker and employer looked up.
///
/// A link to a person that was permanently deleted yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithParties {
    /// The transaction itself
    pub transaction: transaction::Model,
    /// Linked worker, if it still exists
    pub worker: Option<worker::Model>,
    /// Linked employer, if it still exists
    pub employer: Option<employer::Model>,
}

impl TransactionWithParties {
    /// Name of whoever the transaction is with, if anyone can be found.
    #[must_use]
    pub fn party_name(&self) -> Option<&str> {
        self.worker
            .as_ref()
            .map(|w| w.name.as_str())
            .or_else(|| self.employer.as_ref().map(|e| e.name.as_str()))
    }
}

fn validate_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_parties(worker_id: Option<i64>, employer_id: Option<i64>) -> Result<()> {
    if worker_id.is_some() && employer_id.is_some() {
        return Err(Error::validation(
            "a transaction links either a worker or an employer, not both",
        ));
    }
    Ok(())
}

fn require_category(category: &str) -> Result<String> {
    crate::core::person::require_text("category", category)
}

fn optional_day(value: Option<&str>) -> Result<Option<String>> {
    value.map(timestamp::normalize_day).transpose()
}

fn newest_first(select: Select<Transaction>) -> Select<Transaction> {
    select
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedDate)
        .order_by_desc(transaction::Column::Id)
}

fn live() -> Select<Transaction> {
    Transaction::find().filter(transaction::Column::Deleted.eq(false))
}

fn live_where(filter: SimpleExpr) -> Select<Transaction> {
    live().filter(filter)
}

/// Finds a transaction by id, including soft-deleted ones.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every live transaction.
pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<transaction::Model>> {
    newest_first(live()).all(db).await.map_err(Into::into)
}

/// Live transactions linked to a worker.
pub async fn get_by_worker_id<C: ConnectionTrait>(
    db: &C,
    worker_id: i64,
) -> Result<Vec<transaction::Model>> {
    newest_first(live_where(transaction::Column::WorkerId.eq(worker_id)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Live transactions linked to an employer.
pub async fn get_by_employer_id<C: ConnectionTrait>(
    db: &C,
    employer_id: i64,
) -> Result<Vec<transaction::Model>> {
    newest_first(live_where(transaction::Column::EmployerId.eq(employer_id)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Live transactions dated within a month.
pub async fn get_monthly<C: ConnectionTrait>(
    db: &C,
    year: i32,
    month: u32,
) -> Result<Vec<transaction::Model>> {
    let prefix = timestamp::month_prefix(year, month)?;
    newest_first(live_where(transaction::Column::Date.starts_with(&prefix)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Live transactions of one day record.
pub async fn get_by_record_id<C: ConnectionTrait>(
    db: &C,
    record_id: i64,
) -> Result<Vec<transaction::Model>> {
    newest_first(live_where(transaction::Column::RecordId.eq(record_id)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Live transactions between two days, both inclusive.
pub async fn get_by_date_range<C: ConnectionTrait>(
    db: &C,
    from: &str,
    to: &str,
) -> Result<Vec<transaction::Model>> {
    search(
        db,
        &TransactionFilter {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            ..TransactionFilter::default()
        },
    )
    .await
}

/// Live transactions matching every provided filter.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let from = optional_day(filter.from.as_deref())?;
    let to = optional_day(filter.to.as_deref())?;
    if let (Some(from), Some(to)) = (&from, &to) {
        if from > to {
            return Err(Error::validation(format!(
                "date range starts after it ends ({from} > {to})"
            )));
        }
    }

    let mut condition = Condition::all();
    if let Some(worker_id) = filter.worker_id {
        condition = condition.add(transaction::Column::WorkerId.eq(worker_id));
    }
    if let Some(employer_id) = filter.employer_id {
        condition = condition.add(transaction::Column::EmployerId.eq(employer_id));
    }
    if let Some(from) = from {
        condition = condition.add(transaction::Column::Date.gte(from));
    }
    if let Some(to) = to {
        condition = condition.add(transaction::Column::Date.lte(to));
    }
    if let Some(kind) = filter.kind {
        condition = condition.add(transaction::Column::Kind.eq(kind.as_str()));
    }
    if let Some(category) = &filter.category {
        condition = condition.add(transaction::Column::Category.eq(category.trim()));
    }

    newest_first(live().filter(condition))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Validates and stores a transaction in the record of its day.
///
/// The record lookup/creation and the insert share one storage transaction.
#[instrument(skip(db, new_transaction), fields(date = %new_transaction.date))]
pub async fn insert_with_record(
    db: &DatabaseConnection,
    new_transaction: NewTransaction,
) -> Result<InsertedTransaction> {
    validate_amount(new_transaction.amount)?;
    validate_parties(new_transaction.worker_id, new_transaction.employer_id)?;
    let category = require_category(&new_transaction.category)?;
    let date = timestamp::normalize_day(&new_transaction.date)?;

    let txn = db.begin().await?;

    let record_id = record::resolve_record_for_date(&txn, &date).await?;
    let now = kst_now();
    let model = transaction::ActiveModel {
        record_id: Set(record_id),
        worker_id: Set(new_transaction.worker_id),
        employer_id: Set(new_transaction.employer_id),
        amount: Set(new_transaction.amount),
        date: Set(date),
        category: Set(category),
        kind: Set(new_transaction.kind.as_str().to_string()),
        payment_type: Set(new_transaction.payment_type),
        note: Set(new_transaction.note),
        created_date: Set(now.clone()),
        updated_date: Set(now),
        deleted: Set(false),
        ..Default::default()
    };
    let transaction_id = Transaction::insert(model).exec(&txn).await?.last_insert_id;

    txn.commit().await?;

    info!(
        "Created transaction {} in record {}",
        transaction_id, record_id
    );
    Ok(InsertedTransaction {
        record_id,
        transaction_id,
    })
}

/// Applies the provided fields to a transaction and bumps `updated_date`.
///
/// When the date changes the transaction moves to the record of the new day,
/// which is created if necessary. The previous record is left in place even if
/// it no longer holds any transaction.
#[instrument(skip(db, patch))]
pub async fn update_with_record(
    db: &DatabaseConnection,
    id: i64,
    patch: TransactionPatch,
) -> Result<transaction::Model> {
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    let category = patch.category.as_deref().map(require_category).transpose()?;
    let new_date = optional_day(patch.date.as_deref())?;

    let txn = db.begin().await?;

    let existing = get_by_id(&txn, id).await?.ok_or(Error::NotFound {
        entity: "transaction",
        id,
    })?;
    let worker_id = patch.worker_id.unwrap_or(existing.worker_id);
    let employer_id = patch.employer_id.unwrap_or(existing.employer_id);
    validate_parties(worker_id, employer_id)?;

    let previous_date = existing.date.clone();
    let mut model: transaction::ActiveModel = existing.into();
    if let Some(date) = new_date {
        if date != previous_date {
            let record_id = record::resolve_record_for_date(&txn, &date).await?;
            info!("Moving transaction {id} to record {record_id} ({date})");
            model.record_id = Set(record_id);
        }
        model.date = Set(date);
    }
    if let Some(amount) = patch.amount {
        model.amount = Set(amount);
    }
    if let Some(kind) = patch.kind {
        model.kind = Set(kind.as_str().to_string());
    }
    if let Some(category) = category {
        model.category = Set(category);
    }
    if let Some(payment_type) = patch.payment_type {
        model.payment_type = Set(payment_type);
    }
    if let Some(note) = patch.note {
        model.note = Set(note);
    }
    model.worker_id = Set(worker_id);
    model.employer_id = Set(employer_id);
    model.updated_date = Set(kst_now());

    let updated = model.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Moves a transaction to the trash. Its record is left in place.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    trash::set_deleted_flag(db, TrashKind::Transaction, id, true).await
}

/// Looks up the worker and employer of each transaction.
///
/// Persons are matched by id whatever their deleted flag; ids with no row left
/// produce `None` rather than an error.
pub async fn with_parties<C: ConnectionTrait>(
    db: &C,
    transactions: Vec<transaction::Model>,
) -> Result<Vec<TransactionWithParties>> {
    let worker_ids: BTreeSet<i64> = transactions.iter().filter_map(|t| t.worker_id).collect();
    let employer_ids: BTreeSet<i64> = transactions.iter().filter_map(|t| t.employer_id).collect();

    let workers: HashMap<i64, worker::Model> = if worker_ids.is_empty() {
        HashMap::new()
    } else {
        Worker::find()
            .filter(worker::Column::Id.is_in(worker_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect()
    };
    let employers: HashMap<i64, employer::Model> = if employer_ids.is_empty() {
        HashMap::new()
    } else {
        Employer::find()
            .filter(employer::Column::Id.is_in(employer_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect()
    };

    Ok(transactions
        .into_iter()
        .map(|transaction| TransactionWithParties {
            worker: transaction
                .worker_id
                .and_then(|id| workers.get(&id).cloned()),
            employer: transaction
                .employer_id
                .and_then(|id| employers.get(&id).cloned()),
            transaction,
        })
        .collect())
}
