//! Database operations behind the admin site and the listings view.
//!
//! Every write validates its form before touching the database and reports
//! problems as [`StoreError::Validation`]. Delete behavior follows the foreign
//! keys declared in the `migration` crate.

pub mod categories;
pub mod listing_images;
pub mod listings;
pub mod messages;
pub mod notifications;
pub mod reviews;
pub mod users;

use chrono::{DateTime, Utc};
use parsim_core::validation::FieldErrors;
use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, PrimaryKeyTrait, Select,
};

use crate::error::StoreError;
use crate::models::Page;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fetch one 1-based page of `select`. Pages past the end come back empty.
pub(crate) async fn fetch_page<E, C>(
    db: &C,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<Page<E::Model>, StoreError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync,
    C: ConnectionTrait,
{
    let page = page.max(1);
    let per_page = per_page.max(1);
    let paginator = select.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    // `fetch_page` computes the offset as page * page size and overflows on huge pages.
    let results = if page > totals.number_of_pages {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(Page {
        count: totals.number_of_items,
        page,
        page_size: per_page,
        total_pages: totals.number_of_pages,
        results,
    })
}

/// Record a field error when the referenced row does not exist.
pub(crate) async fn check_exists<E, C>(
    db: &C,
    id: i64,
    field: &str,
    errors: &mut FieldErrors,
) -> Result<Option<E::Model>, DbErr>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
    C: ConnectionTrait,
{
    let found = E::find_by_id(id).one(db).await?;
    if found.is_none() {
        errors.add(field, INVALID_CHOICE);
    }
    Ok(found)
}
