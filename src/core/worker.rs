//! Worker repository - Handles all worker-related operations.
//!
//! Same contract as the employer repository, with the worker's personal
//! columns and an extra `nationality` filter for the search screen.

use crate::{
    core::{
        person::{self, PersonFilter, SEARCH_RESULT_LIMIT},
        timestamp::kst_now,
        trash::{self, TrashKind},
    },
    entities::{Worker, worker},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{info, instrument};

/// Fields for a new worker. Unset text fields are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewWorker {
    /// Required
    pub name: String,
    /// Required
    pub tel: String,
    /// Free-form memo
    pub note: String,
    /// Job type or skill
    pub kind: String,
    /// Home postal code
    pub addr_postcode: String,
    /// Home street address
    pub addr_street: String,
    /// Extra home address detail
    pub addr_extra: String,
    /// Birth year as entered
    pub birth_year: String,
    /// Gender as entered
    pub gender: String,
    /// University name
    pub university: String,
    /// University postal code
    pub uni_postcode: String,
    /// University street address
    pub uni_street: String,
    /// Nationality
    pub nationality: String,
    /// Photo URI from the image picker, stored verbatim
    pub face: String,
}

impl NewWorker {
    /// Starts a new worker with the two required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, tel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tel: tel.into(),
            ..Self::default()
        }
    }

    /// Fills the home address columns from a postcode lookup result.
    #[must_use]
    pub fn with_address(mut self, address: person::Address) -> Self {
        self.addr_postcode = address.zonecode;
        self.addr_street = address.address;
        self.addr_extra = address.building_name;
        self
    }

    /// Fills the university address columns from a postcode lookup result.
    /// The lookup's building name is not kept for universities.
    #[must_use]
    pub fn with_university_address(mut self, address: person::Address) -> Self {
        self.uni_postcode = address.zonecode;
        self.uni_street = address.address;
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerPatch {
    /// New name (must not be blank)
    pub name: Option<String>,
    /// New phone number (must not be blank)
    pub tel: Option<String>,
    /// New memo
    pub note: Option<String>,
    /// New job type
    pub kind: Option<String>,
    /// New home postal code
    pub addr_postcode: Option<String>,
    /// New home street address
    pub addr_street: Option<String>,
    /// New extra home address detail
    pub addr_extra: Option<String>,
    /// New birth year
    pub birth_year: Option<String>,
    /// New gender
    pub gender: Option<String>,
    /// New university
    pub university: Option<String>,
    /// New university postal code
    pub uni_postcode: Option<String>,
    /// New university street address
    pub uni_street: Option<String>,
    /// New nationality
    pub nationality: Option<String>,
    /// New photo URI
    pub face: Option<String>,
}

/// Finds a worker by id, including soft-deleted ones.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<worker::Model>> {
    Worker::find_by_id(id).one(db).await.map_err(Into::into)
}

/// All active workers ordered by name.
pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<worker::Model>> {
    Worker::find()
        .filter(worker::Column::Deleted.eq(false))
        .order_by_asc(worker::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active workers whose name, type or note contains `term`, ignoring ASCII case.
///
/// A blank term returns every active worker. Accented Latin letters are compared
/// as stored, because `SQLite`'s `LIKE` only folds ASCII: `"nguyễn"` does not
/// find a worker saved as `"NGUYỄN"`.
pub async fn search<C: ConnectionTrait>(db: &C, term: &str) -> Result<Vec<worker::Model>> {
    let term = term.trim();
    if term.is_empty() {
        return get_all(db).await;
    }

    Worker::find()
        .filter(worker::Column::Deleted.eq(false))
        .filter(person::any_text_matches(
            [
                worker::Column::Name,
                worker::Column::Kind,
                worker::Column::Note,
            ],
            term,
        ))
        .order_by_asc(worker::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active workers matching every provided filter, at most [`SEARCH_RESULT_LIMIT`] rows.
pub async fn search_with_filters<C: ConnectionTrait>(
    db: &C,
    filter: &PersonFilter,
) -> Result<Vec<worker::Model>> {
    let mut condition = Condition::all().add(worker::Column::Deleted.eq(false));
    if let Some(name) = person::filter_term(filter.name.as_ref()) {
        condition = condition.add(person::contains(worker::Column::Name, name));
    }
    if let Some(tel) = person::filter_term(filter.tel.as_ref()).and_then(person::tel_contains) {
        condition = condition.add(tel);
    }
    if let Some(kind) = person::filter_term(filter.kind.as_ref()) {
        condition = condition.add(person::contains(worker::Column::Kind, kind));
    }
    if let Some(nationality) = person::filter_term(filter.nationality.as_ref()) {
        condition = condition.add(person::contains(worker::Column::Nationality, nationality));
    }

    Worker::find()
        .filter(condition)
        .order_by_asc(worker::Column::Name)
        .limit(SEARCH_RESULT_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a worker and returns its id.
///
/// `name` and `tel` are trimmed and must not be blank.
#[instrument(skip(db, new_worker), fields(name = %new_worker.name))]
pub async fn insert<C: ConnectionTrait>(db: &C, new_worker: NewWorker) -> Result<i64> {
    let name = person::require_text("name", &new_worker.name)?;
    let tel = person::require_text("tel", &new_worker.tel)?;
    let now = kst_now();

    let model = worker::ActiveModel {
        name: Set(name),
        tel: Set(tel),
        note: Set(new_worker.note),
        kind: Set(new_worker.kind),
        addr_postcode: Set(new_worker.addr_postcode),
        addr_street: Set(new_worker.addr_street),
        addr_extra: Set(new_worker.addr_extra),
        birth_year: Set(new_worker.birth_year),
        gender: Set(new_worker.gender),
        university: Set(new_worker.university),
        uni_postcode: Set(new_worker.uni_postcode),
        uni_street: Set(new_worker.uni_street),
        nationality: Set(new_worker.nationality),
        face: Set(new_worker.face),
        created_date: Set(now.clone()),
        updated_date: Set(now),
        deleted: Set(false),
        ..Default::default()
    };

    let id = Worker::insert(model).exec(db).await?.last_insert_id;
    info!("Created worker {}", id);
    Ok(id)
}

/// Applies the provided fields to an existing worker and bumps `updated_date`.
#[instrument(skip(db, patch))]
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i64,
    patch: WorkerPatch,
) -> Result<worker::Model> {
    let existing = get_by_id(db, id).await?.ok_or(Error::NotFound {
        entity: "worker",
        id,
    })?;

    let mut model: worker::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        model.name = Set(person::require_text("name", &name)?);
    }
    if let Some(tel) = patch.tel {
        model.tel = Set(person::require_text("tel", &tel)?);
    }
    let optional_columns = [
        (patch.note, worker::Column::Note),
        (patch.kind, worker::Column::Kind),
        (patch.addr_postcode, worker::Column::AddrPostcode),
        (patch.addr_street, worker::Column::AddrStreet),
        (patch.addr_extra, worker::Column::AddrExtra),
        (patch.birth_year, worker::Column::BirthYear),
        (patch.gender, worker::Column::Gender),
        (patch.university, worker::Column::University),
        (patch.uni_postcode, worker::Column::UniPostcode),
        (patch.uni_street, worker::Column::UniStreet),
        (patch.nationality, worker::Column::Nationality),
        (patch.face, worker::Column::Face),
    ];
    for (value, column) in optional_columns {
        if let Some(value) = value {
            model.set(column, value.into());
        }
    }
    model.updated_date = Set(kst_now());

    let updated = model.update(db).await?;
    info!("Updated worker {}", id);
    Ok(updated)
}

/// Moves a worker to the trash. Transactions referencing it are left alone.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    trash::set_deleted_flag(db, TrashKind::Worker, id, true).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_insert_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = insert(&db, NewWorker::new("  ", "01012345678")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = insert(&db, NewWorker::new("홍길동", "")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_stores_personal_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let id = insert(
            &db,
            NewWorker {
                birth_year: "1995".to_string(),
                gender: "남".to_string(),
                nationality: "베트남".to_string(),
                face: "file:///photos/w1.jpg".to_string(),
                ..NewWorker::new("Nguyen Van A", "010-5555-6666")
            }
            .with_university_address(person::Address {
                zonecode: "08826".to_string(),
                address: "서울 관악구 관악로 1".to_string(),
                building_name: "서울대학교".to_string(),
            }),
        )
        .await?;

        let stored = get_by_id(&db, id).await?.unwrap();
        assert_eq!(stored.face, "file:///photos/w1.jpg");
        assert_eq!(stored.nationality, "베트남");
        assert_eq!(stored.uni_postcode, "08826");
        assert_eq!(stored.university, "");
        assert_eq!(stored.addr_street, "");

        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;

        let john = create_test_worker(&db, "John KIM").await?;
        create_test_worker(&db, "Maria Lee").await?;

        let found = search(&db, "john").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, john);

        let found = search(&db, "kim").await?;
        assert_eq!(found.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_does_not_fold_accented_letters() -> Result<()> {
        let db = setup_test_db().await?;
        let id = create_test_worker(&db, "NGUYỄN Van A").await?;

        assert!(search(&db, "nguyễn").await?.is_empty());
        assert_eq!(search(&db, "NGUYỄN").await?[0].id, id);
        assert_eq!(search(&db, "van").await?[0].id, id);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_excludes_deleted_and_blank_term_lists_all() -> Result<()> {
        let db = setup_test_db().await?;

        let kept = create_test_worker(&db, "Worker A").await?;
        let trashed = create_test_worker(&db, "Worker B").await?;
        delete(&db, trashed).await?;

        let found = search(&db, "worker").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, kept);

        let all = search(&db, "   ").await?;
        assert_eq!(all.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_visibility() -> Result<()> {
        let db = setup_test_db().await?;
        let id = create_test_worker(&db, "홍길동").await?;

        assert_eq!(get_all(&db).await?.len(), 1);
        delete(&db, id).await?;

        assert!(get_all(&db).await?.is_empty());
        let row = get_by_id(&db, id).await?.unwrap();
        assert!(row.deleted);

        trash::restore(&db, TrashKind::Worker, id).await?;
        let all = get_all(&db).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let id = insert(
            &db,
            NewWorker {
                nationality: "중국".to_string(),
                face: "content://face.png".to_string(),
                ..NewWorker::new("왕웨이", "01077778888")
            },
        )
        .await?;

        let updated = update(
            &db,
            id,
            WorkerPatch {
                kind: Some("목수".to_string()),
                ..WorkerPatch::default()
            },
        )
        .await?;

        assert_eq!(updated.kind, "목수");
        assert_eq!(updated.nationality, "중국");
        assert_eq!(updated.face, "content://face.png");
        assert_eq!(updated.tel, "01077778888");

        Ok(())
    }

    #[tokio::test]
    async fn test_search_with_filters_by_nationality() -> Result<()> {
        let db = setup_test_db().await?;

        let vn = insert(
            &db,
            NewWorker {
                nationality: "베트남".to_string(),
                ..NewWorker::new("Tran", "010-1111-2222")
            },
        )
        .await?;
        insert(
            &db,
            NewWorker {
                nationality: "한국".to_string(),
                ..NewWorker::new("Kim", "010-3333-4444")
            },
        )
        .await?;

        let found = search_with_filters(
            &db,
            &PersonFilter {
                nationality: Some("베트남".to_string()),
                tel: Some("01011112222".to_string()),
                ..PersonFilter::default()
            },
        )
        .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, vn);

        Ok(())
    }
}
