//! Transaction entity - A single income or expense event.
//!
//! Each transaction belongs to the record of its `date`, may point at one worker
//! or one employer, and stores `amount` as a non-negative magnitude. Direction
//! comes from the `type` column (`"수입"` income / `"지출"` expense).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the day record this transaction is bucketed into
    pub record_id: i64,
    /// Worker involved, if any (not enforced by the database)
    pub worker_id: Option<i64>,
    /// Employer involved, if any (not enforced by the database)
    pub employer_id: Option<i64>,
    /// Non-negative amount in currency units
    pub amount: i64,
    /// Calendar day in `YYYY-MM-DD` form
    pub date: String,
    /// Free-text category (e.g., `"식비"`, `"소개비"`, `"기타"`)
    pub category: String,
    /// `"수입"` or `"지출"`, see [`TransactionKind`]
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text payment method (e.g., `"현금"`, `"이체"`)
    pub payment_type: String,
    /// Free-form memo
    pub note: String,
    /// KST timestamp of creation
    pub created_date: String,
    /// KST timestamp of the last modification (also the trash timestamp)
    pub updated_date: String,
    /// Soft delete flag
    #[serde(with = "super::deleted_flag")]
    pub deleted: bool,
}

impl Model {
    /// Parsed direction of the transaction; `None` for unrecognised values
    /// that may arrive through an imported backup.
    #[must_use]
    pub fn direction(&self) -> Option<TransactionKind> {
        self.kind.parse().ok()
    }

    /// Amount with the sign implied by the transaction type.
    #[must_use]
    pub fn signed_amount(&self) -> i64 {
        match self.direction() {
            Some(TransactionKind::Income) => self.amount,
            Some(TransactionKind::Expense) => -self.amount,
            None => 0,
        }
    }
}

/// Direction of a transaction as stored in the `type` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// `"수입"`
    #[serde(rename = "수입")]
    Income,
    /// `"지출"`
    #[serde(rename = "지출")]
    Expense,
}

impl TransactionKind {
    /// Stored column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "수입",
            Self::Expense => "지출",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = crate::errors::Error;

    /// Accepts the stored Korean values as well as `income`/`expense`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "수입" | "income" => Ok(Self::Income),
            "지출" | "expense" => Ok(Self::Expense),
            other => Err(crate::errors::Error::validation(format!(
                "unknown transaction type '{other}'"
            ))),
        }
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one day record
    #[sea_orm(
        belongs_to = "super::record::Entity",
        from = "Column::RecordId",
        to = "super::record::Column::Id"
    )]
    Record,
}

impl Related<super::record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Record.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
