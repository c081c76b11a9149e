//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod employer;
pub mod record;
pub mod transaction;
pub mod worker;

// Re-export specific types to avoid conflicts
pub use employer::{Column as EmployerColumn, Entity as Employer, Model as EmployerModel};
pub use record::{Column as RecordColumn, Entity as Record, Model as RecordModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel, TransactionKind,
};
pub use worker::{Column as WorkerColumn, Entity as Worker, Model as WorkerModel};

/// Serde adapter for the `deleted` column.
///
/// Backups write the flag as `0`/`1` like the table does; reading accepts either
/// integers or booleans.
pub(crate) mod deleted_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(flag) => flag,
            Flag::Int(value) => value != 0,
        })
    }
}
