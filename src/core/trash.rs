//! Trash subsystem - the soft-delete view over employers, workers and transactions.
//!
//! Soft deletion only flips the `deleted` flag and bumps `updated_date`, which
//! therefore doubles as the time an item entered the trash. Restoring flips the
//! flag back; permanent deletion removes the row without touching anything that
//! references it.

use crate::{
    core::timestamp::kst_now,
    entities::{Employer, Transaction, Worker, employer, transaction, worker},
    errors::{Error, Result},
};
use sea_orm::{TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

/// Kinds of rows that can sit in the trash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashKind {
    /// A row of `employers`
    Employer,
    /// A row of `workers`
    Worker,
    /// A row of `transactions`
    Transaction,
}

impl TrashKind {
    /// Lowercase name, also used in error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Worker => "worker",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for TrashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrashKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employer" => Ok(Self::Employer),
            "worker" => Ok(Self::Worker),
            "transaction" => Ok(Self::Transaction),
            other => Err(Error::validation(format!("unknown trash kind '{other}'"))),
        }
    }
}

/// One entry of the trash view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedItem {
    /// Primary key in the item's own table
    pub id: i64,
    /// Person name, or `"<date> <category> <amount>"` for transactions
    pub display_name: String,
    /// Which table the item lives in
    pub kind: TrashKind,
    /// KST timestamp of the soft delete
    pub deleted_at: String,
}

/// Sets or clears the `deleted` flag of one row and bumps its `updated_date`.
#[instrument(skip(db))]
pub(crate) async fn set_deleted_flag<C: ConnectionTrait>(
    db: &C,
    kind: TrashKind,
    id: i64,
    deleted: bool,
) -> Result<()> {
    let now = kst_now();
    let result = match kind {
        TrashKind::Employer => {
            Employer::update_many()
                .col_expr(employer::Column::Deleted, Expr::value(deleted))
                .col_expr(employer::Column::UpdatedDate, Expr::value(now))
                .filter(employer::Column::Id.eq(id))
                .exec(db)
                .await?
        }
        TrashKind::Worker => {
            Worker::update_many()
                .col_expr(worker::Column::Deleted, Expr::value(deleted))
                .col_expr(worker::Column::UpdatedDate, Expr::value(now))
                .filter(worker::Column::Id.eq(id))
                .exec(db)
                .await?
        }
        TrashKind::Transaction => {
            Transaction::update_many()
                .col_expr(transaction::Column::Deleted, Expr::value(deleted))
                .col_expr(transaction::Column::UpdatedDate, Expr::value(now))
                .filter(transaction::Column::Id.eq(id))
                .exec(db)
                .await?
        }
    };

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: kind.as_str(),
            id,
        });
    }
    info!("Set deleted={} on {} {}", deleted, kind, id);
    Ok(())
}

/// Everything currently in the trash, most recently deleted first.
pub async fn list_deleted<C: ConnectionTrait>(db: &C) -> Result<Vec<DeletedItem>> {
    let employers = Employer::find()
        .filter(employer::Column::Deleted.eq(true))
        .all(db)
        .await?;
    let workers = Worker::find()
        .filter(worker::Column::Deleted.eq(true))
        .all(db)
        .await?;
    let transactions = Transaction::find()
        .filter(transaction::Column::Deleted.eq(true))
        .all(db)
        .await?;

    let mut items: Vec<DeletedItem> = employers
        .into_iter()
        .map(|e| DeletedItem {
            id: e.id,
            display_name: e.name,
            kind: TrashKind::Employer,
            deleted_at: e.updated_date,
        })
        .chain(workers.into_iter().map(|w| DeletedItem {
            id: w.id,
            display_name: w.name,
            kind: TrashKind::Worker,
            deleted_at: w.updated_date,
        }))
        .chain(transactions.into_iter().map(|t| DeletedItem {
            id: t.id,
            display_name: format!("{} {} {}", t.date, t.category, t.amount),
            kind: TrashKind::Transaction,
            deleted_at: t.updated_date,
        }))
        .collect();

    items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(b.id.cmp(&a.id)));
    Ok(items)
}

/// Takes an item out of the trash.
pub async fn restore<C: ConnectionTrait>(db: &C, kind: TrashKind, id: i64) -> Result<()> {
    set_deleted_flag(db, kind, id, false).await
}

/// Removes a row for good. Rows referencing it are not touched.
#[instrument(skip(db))]
pub async fn permanently_delete<C: ConnectionTrait>(
    db: &C,
    kind: TrashKind,
    id: i64,
) -> Result<()> {
    let result = match kind {
        TrashKind::Employer => Employer::delete_by_id(id).exec(db).await?,
        TrashKind::Worker => Worker::delete_by_id(id).exec(db).await?,
        TrashKind::Transaction => Transaction::delete_by_id(id).exec(db).await?,
    };

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: kind.as_str(),
            id,
        });
    }
    info!("Permanently deleted {} {}", kind, id);
    Ok(())
}

/// Permanently deletes everything in the trash and returns the number of rows removed.
#[instrument(skip(db))]
pub async fn empty_trash(db: &DatabaseConnection) -> Result<u64> {
    let txn = db.begin().await?;

    let transactions = Transaction::delete_many()
        .filter(transaction::Column::Deleted.eq(true))
        .exec(&txn)
        .await?
        .rows_affected;
    let workers = Worker::delete_many()
        .filter(worker::Column::Deleted.eq(true))
        .exec(&txn)
        .await?
        .rows_affected;
    let employers = Employer::delete_many()
        .filter(employer::Column::Deleted.eq(true))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;

    let total = transactions + workers + employers;
    info!(
        "Emptied trash: {} transactions, {} workers, {} employers",
        transactions, workers, employers
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        transaction::{self as transactions, NewTransaction},
        worker as workers,
    };
    use crate::entities::TransactionKind;
    use crate::test_utils::*;

    #[test]
    fn test_trash_kind_parsing() {
        assert_eq!("Worker".parse::<TrashKind>().ok(), Some(TrashKind::Worker));
        assert_eq!(TrashKind::Transaction.to_string(), "transaction");
        assert!("record".parse::<TrashKind>().is_err());
    }

    #[tokio::test]
    async fn test_deleted_worker_appears_then_disappears_for_good() -> Result<()> {
        let db = setup_test_db().await?;
        let worker_id = create_test_worker(&db, "홍길동").await?;
        let inserted = transactions::insert_with_record(
            &db,
            NewTransaction::new("2025-09-01", 90_000, TransactionKind::Expense, "일당")
                .with_worker(worker_id),
        )
        .await?;

        workers::delete(&db, worker_id).await?;

        let trash = list_deleted(&db).await?;
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].kind, TrashKind::Worker);
        assert_eq!(trash[0].id, worker_id);
        assert_eq!(trash[0].display_name, "홍길동");
        assert!(trash[0].deleted_at.ends_with("+09:00"));

        permanently_delete(&db, TrashKind::Worker, worker_id).await?;
        assert!(workers::get_by_id(&db, worker_id).await?.is_none());
        assert!(list_deleted(&db).await?.is_empty());

        // The transaction still points at the vanished worker and reads fine
        let orphan = transactions::get_by_id(&db, inserted.transaction_id)
            .await?
            .unwrap();
        assert_eq!(orphan.worker_id, Some(worker_id));
        let joined = transactions::with_parties(&db, vec![orphan]).await?;
        assert!(joined[0].worker.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_transaction_display_name_and_restore() -> Result<()> {
        let db = setup_test_db().await?;
        let inserted =
            create_test_transaction(&db, "2025-09-01", 50_000, TransactionKind::Expense).await?;

        transactions::delete(&db, inserted.transaction_id).await?;
        let trash = list_deleted(&db).await?;
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].kind, TrashKind::Transaction);
        assert_eq!(trash[0].display_name, "2025-09-01 기타 50000");

        restore(&db, TrashKind::Transaction, inserted.transaction_id).await?;
        assert!(list_deleted(&db).await?.is_empty());
        assert_eq!(transactions::get_all(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ids_are_reported() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            restore(&db, TrashKind::Employer, 5).await,
            Err(Error::NotFound {
                entity: "employer",
                id: 5
            })
        ));
        assert!(matches!(
            permanently_delete(&db, TrashKind::Transaction, 5).await,
            Err(Error::NotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_trash_keeps_live_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let kept = create_test_employer(&db, "Alpha").await?;
        let gone = create_test_employer(&db, "Bravo").await?;
        let worker_id = create_test_worker(&db, "Charlie").await?;
        let tx = create_test_transaction(&db, "2025-09-01", 1, TransactionKind::Income).await?;

        crate::core::employer::delete(&db, gone).await?;
        workers::delete(&db, worker_id).await?;
        transactions::delete(&db, tx.transaction_id).await?;

        assert_eq!(list_deleted(&db).await?.len(), 3);
        assert_eq!(empty_trash(&db).await?, 3);
        assert!(list_deleted(&db).await?.is_empty());

        let remaining = crate::core::employer::get_all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept);

        Ok(())
    }
}
