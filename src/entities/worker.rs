//! Worker entity - A day laborer placed by the broker.
//!
//! Shares the employer's contact/address columns and adds personal details.
//! `face` holds an image URI; the image itself lives on the filesystem.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Worker database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workers")]
pub struct Model {
    /// Unique identifier for the worker
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Phone number as entered
    pub tel: String,
    /// Free-form memo
    pub note: String,
    /// Job type or skill (e.g., "목수", "잡부")
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Postal code of the home address
    pub addr_postcode: String,
    /// Street of the home address
    pub addr_street: String,
    /// Extra home address detail
    pub addr_extra: String,
    /// Birth year as entered
    pub birth_year: String,
    /// Gender as entered
    pub gender: String,
    /// University name, for student workers
    pub university: String,
    /// Postal code of the university address
    pub uni_postcode: String,
    /// Street of the university address
    pub uni_street: String,
    /// Nationality
    pub nationality: String,
    /// URI of the worker's photo
    pub face: String,
    /// KST timestamp of creation
    pub created_date: String,
    /// KST timestamp of the last modification (also the trash timestamp)
    pub updated_date: String,
    /// Soft delete flag - if true, the worker sits in the trash
    #[serde(with = "super::deleted_flag")]
    pub deleted: bool,
}

/// Workers are referenced by transactions without a database constraint,
/// so the entity declares no relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
