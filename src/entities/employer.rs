//! Employer entity - A client who hires workers through the broker.
//!
//! Only `name` and `tel` carry meaning for the application; every other text
//! column is stored as an empty string when unknown.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Employer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employers")]
pub struct Model {
    /// Unique identifier for the employer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "김사장")
    pub name: String,
    /// Phone number as entered, separators included
    pub tel: String,
    /// Free-form memo
    pub note: String,
    /// Business type (e.g., "건설", "식당")
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Postal code returned by the address lookup
    pub addr_postcode: String,
    /// Street address returned by the address lookup
    pub addr_street: String,
    /// Building name or extra address detail
    pub addr_extra: String,
    /// KST timestamp of creation
    pub created_date: String,
    /// KST timestamp of the last modification (also the trash timestamp)
    pub updated_date: String,
    /// Soft delete flag - if true, the employer sits in the trash
    #[serde(with = "super::deleted_flag")]
    pub deleted: bool,
}

/// Employers are referenced by transactions without a database constraint,
/// so the entity declares no relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
