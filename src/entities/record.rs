//! Record entity - A per-day bucket grouping transactions.
//!
//! Records are created lazily by the record aggregator; at most one
//! non-deleted record exists for a given `date`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Calendar day in `YYYY-MM-DD` form
    pub date: String,
    /// KST timestamp of creation
    pub created_date: String,
    /// KST timestamp of the last modification
    pub updated_date: String,
    /// Soft delete flag
    #[serde(with = "super::deleted_flag")]
    pub deleted: bool,
}

/// Defines relationships between Record and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One record groups many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
