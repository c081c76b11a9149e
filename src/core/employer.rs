//! Employer repository - Handles all employer-related operations.
//!
//! Provides lookup, quick search, filtered search, creation, read-merge-write
//! updates and soft deletion. Soft-deleted employers stay readable by id and are
//! managed further by the trash subsystem.

use crate::{
    core::{
        person::{self, PersonFilter, SEARCH_RESULT_LIMIT},
        timestamp::kst_now,
        trash::{self, TrashKind},
    },
    entities::{Employer, employer},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{info, instrument};

/// Fields for a new employer. Unset text fields are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEmployer {
    /// Required
    pub name: String,
    /// Required
    pub tel: String,
    /// Free-form memo
    pub note: String,
    /// Business type
    pub kind: String,
    /// Postal code
    pub addr_postcode: String,
    /// Street address
    pub addr_street: String,
    /// Extra address detail
    pub addr_extra: String,
}

impl NewEmployer {
    /// Starts a new employer with the two required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, tel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tel: tel.into(),
            ..Self::default()
        }
    }

    /// Fills the address columns from a postcode lookup result.
    #[must_use]
    pub fn with_address(mut self, address: person::Address) -> Self {
        self.addr_postcode = address.zonecode;
        self.addr_street = address.address;
        self.addr_extra = address.building_name;
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerPatch {
    /// New name (must not be blank)
    pub name: Option<String>,
    /// New phone number (must not be blank)
    pub tel: Option<String>,
    /// New memo
    pub note: Option<String>,
    /// New business type
    pub kind: Option<String>,
    /// New postal code
    pub addr_postcode: Option<String>,
    /// New street address
    pub addr_street: Option<String>,
    /// New extra address detail
    pub addr_extra: Option<String>,
}

/// Finds an employer by id, including soft-deleted ones.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<employer::Model>> {
    Employer::find_by_id(id).one(db).await.map_err(Into::into)
}

/// All active employers ordered by name.
pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<employer::Model>> {
    Employer::find()
        .filter(employer::Column::Deleted.eq(false))
        .order_by_asc(employer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active employers whose name, type or note contains `term`.
///
/// A blank term returns every active employer. Matching ignores case for ASCII
/// letters only: `SQLite`'s `LIKE` does not fold accented Latin letters, so
/// `"nguyễn"` does not find `"NGUYỄN"`.
pub async fn search<C: ConnectionTrait>(db: &C, term: &str) -> Result<Vec<employer::Model>> {
    let term = term.trim();
    if term.is_empty() {
        return get_all(db).await;
    }

    Employer::find()
        .filter(employer::Column::Deleted.eq(false))
        .filter(person::any_text_matches(
            [
                employer::Column::Name,
                employer::Column::Kind,
                employer::Column::Note,
            ],
            term,
        ))
        .order_by_asc(employer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active employers matching every provided filter, at most
/// [`SEARCH_RESULT_LIMIT`] rows. `nationality` is ignored for employers.
pub async fn search_with_filters<C: ConnectionTrait>(
    db: &C,
    filter: &PersonFilter,
) -> Result<Vec<employer::Model>> {
    let mut condition = Condition::all().add(employer::Column::Deleted.eq(false));
    if let Some(name) = person::filter_term(filter.name.as_ref()) {
        condition = condition.add(person::contains(employer::Column::Name, name));
    }
    if let Some(tel) = person::filter_term(filter.tel.as_ref()).and_then(person::tel_contains) {
        condition = condition.add(tel);
    }
    if let Some(kind) = person::filter_term(filter.kind.as_ref()) {
        condition = condition.add(person::contains(employer::Column::Kind, kind));
    }

    Employer::find()
        .filter(condition)
        .order_by_asc(employer::Column::Name)
        .limit(SEARCH_RESULT_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates an employer and returns its id.
///
/// `name` and `tel` are trimmed and must not be blank.
#[instrument(skip(db, new_employer), fields(name = %new_employer.name))]
pub async fn insert<C: ConnectionTrait>(db: &C, new_employer: NewEmployer) -> Result<i64> {
    let name = person::require_text("name", &new_employer.name)?;
    let tel = person::require_text("tel", &new_employer.tel)?;
    let now = kst_now();

    let model = employer::ActiveModel {
        name: Set(name),
        tel: Set(tel),
        note: Set(new_employer.note),
        kind: Set(new_employer.kind),
        addr_postcode: Set(new_employer.addr_postcode),
        addr_street: Set(new_employer.addr_street),
        addr_extra: Set(new_employer.addr_extra),
        created_date: Set(now.clone()),
        updated_date: Set(now),
        deleted: Set(false),
        ..Default::default()
    };

    let id = Employer::insert(model).exec(db).await?.last_insert_id;
    info!("Created employer {}", id);
    Ok(id)
}

/// Applies the provided fields to an existing employer and bumps `updated_date`.
#[instrument(skip(db, patch))]
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i64,
    patch: EmployerPatch,
) -> Result<employer::Model> {
    let existing = get_by_id(db, id).await?.ok_or(Error::NotFound {
        entity: "employer",
        id,
    })?;

    let mut model: employer::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        model.name = Set(person::require_text("name", &name)?);
    }
    if let Some(tel) = patch.tel {
        model.tel = Set(person::require_text("tel", &tel)?);
    }
    if let Some(note) = patch.note {
        model.note = Set(note);
    }
    if let Some(kind) = patch.kind {
        model.kind = Set(kind);
    }
    if let Some(addr_postcode) = patch.addr_postcode {
        model.addr_postcode = Set(addr_postcode);
    }
    if let Some(addr_street) = patch.addr_street {
        model.addr_street = Set(addr_street);
    }
    if let Some(addr_extra) = patch.addr_extra {
        model.addr_extra = Set(addr_extra);
    }
    model.updated_date = Set(kst_now());

    let updated = model.update(db).await?;
    info!("Updated employer {}", id);
    Ok(updated)
}

/// Moves an employer to the trash. Transactions referencing it are left alone.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    trash::set_deleted_flag(db, TrashKind::Employer, id, true).await
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

        let result = insert(&db, NewEmployer::new("", "01012345678")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = insert(&db, NewEmployer::new("김사장", "   ")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_sets_defaults_and_timestamps() -> Result<()> {
        let db = setup_test_db().await?;

        let id = insert(&db, NewEmployer::new(" 김사장 ", "01012345678")).await?;
        let employer = get_by_id(&db, id).await?.unwrap();

        assert_eq!(employer.name, "김사장");
        assert_eq!(employer.note, "");
        assert_eq!(employer.kind, "");
        assert_eq!(employer.addr_street, "");
        assert!(!employer.deleted);
        assert!(employer.created_date.ends_with("+09:00"));
        assert_eq!(employer.created_date, employer.updated_date);

        Ok(())
    }

    #[tokio::test]
    async fn test_with_address() -> Result<()> {
        let db = setup_test_db().await?;

        let address = person::Address {
            zonecode: "06236".to_string(),
            address: "서울 강남구 테헤란로 152".to_string(),
            building_name: "강남파이낸스센터".to_string(),
        };
        let id = insert(
            &db,
            NewEmployer::new("박대표", "010-2222-3333").with_address(address),
        )
        .await?;

        let employer = get_by_id(&db, id).await?.unwrap();
        assert_eq!(employer.addr_postcode, "06236");
        assert_eq!(employer.addr_extra, "강남파이낸스센터");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_orders_by_name_and_hides_deleted() -> Result<()> {
        let db = setup_test_db().await?;

        let c = create_test_employer(&db, "Charlie").await?;
        let a = create_test_employer(&db, "Alpha").await?;
        let b = create_test_employer(&db, "Bravo").await?;
        delete(&db, c).await?;

        let all = get_all(&db).await?;
        let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);

        // Still readable by id, flagged as deleted
        let trashed = get_by_id(&db, c).await?.unwrap();
        assert!(trashed.deleted);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_merges_only_provided_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let id = insert(
            &db,
            NewEmployer {
                note: "단골".to_string(),
                kind: "건설".to_string(),
                ..NewEmployer::new("김사장", "01012345678")
            },
        )
        .await?;

        let updated = update(
            &db,
            id,
            EmployerPatch {
                tel: Some("010-9999-8888".to_string()),
                ..EmployerPatch::default()
            },
        )
        .await?;

        assert_eq!(updated.tel, "010-9999-8888");
        assert_eq!(updated.name, "김사장");
        assert_eq!(updated.note, "단골");
        assert_eq!(updated.kind, "건설");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name_and_missing_row() -> Result<()> {
        let db = setup_test_db().await?;
        let id = create_test_employer(&db, "김사장").await?;

        let result = update(
            &db,
            id,
            EmployerPatch {
                name: Some(" ".to_string()),
                ..EmployerPatch::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = update(&db, 999, EmployerPatch::default()).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "employer",
                id: 999
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_search_matches_name_type_and_note() -> Result<()> {
        let db = setup_test_db().await?;

        let by_name = create_test_employer(&db, "Kim Construction").await?;
        let by_type = insert(
            &db,
            NewEmployer {
                kind: "construction site".to_string(),
                ..NewEmployer::new("Lee", "0101111")
            },
        )
        .await?;
        let by_note = insert(
            &db,
            NewEmployer {
                note: "pays in CONSTRUCTION vouchers".to_string(),
                ..NewEmployer::new("Park", "0102222")
            },
        )
        .await?;
        create_test_employer(&db, "Choi Restaurant").await?;

        let found = search(&db, "construction").await?;
        let mut ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![by_name, by_type, by_note]);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_employer(&db, "Alpha").await?;
        let percent = create_test_employer(&db, "100% Cash").await?;

        let found = search(&db, "%").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, percent);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_with_filters_strips_tel_separators() -> Result<()> {
        let db = setup_test_db().await?;

        let kim = insert(
            &db,
            NewEmployer {
                kind: "건설".to_string(),
                ..NewEmployer::new("김사장", "010-1234-5678")
            },
        )
        .await?;
        insert(&db, NewEmployer::new("이사장", "010-9876-5432")).await?;

        let by_tel = search_with_filters(
            &db,
            &PersonFilter {
                tel: Some("1234 5678".to_string()),
                ..PersonFilter::default()
            },
        )
        .await?;
        assert_eq!(by_tel.len(), 1);
        assert_eq!(by_tel[0].id, kim);

        let combined = search_with_filters(
            &db,
            &PersonFilter {
                name: Some("사장".to_string()),
                kind: Some("건설".to_string()),
                ..PersonFilter::default()
            },
        )
        .await?;
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].id, kim);

        let everyone = search_with_filters(&db, &PersonFilter::default()).await?;
        assert_eq!(everyone.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_with_filters_caps_results() -> Result<()> {
        let db = setup_test_db().await?;
        for i in 0..55 {
            create_test_employer(&db, &format!("Employer {i:02}")).await?;
        }

        let found = search_with_filters(
            &db,
            &PersonFilter {
                name: Some("Employer".to_string()),
                ..PersonFilter::default()
            },
        )
        .await?;
        assert_eq!(found.len(), 50);
        assert_eq!(found[0].name, "Employer 00");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_employer() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete(&db, 42).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
