use entity::listing::Status;
use entity::{category, listing, listing_image, user};
use parsim_core::slug;
use parsim_core::validation::{normalize_price, FieldErrors};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::StoreError;
use crate::models::{ListingDetailResponse, ListingForm, Page};
use crate::store::{check_exists, fetch_page, now};

const SLUG_TAKEN: &str = "Listing with this slug already exists.";
const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Prices come back from some backends with fewer fraction digits than they
/// were stored with; always hand out two.
fn normalized(mut model: listing::Model) -> listing::Model {
    model.price = normalize_price(model.price);
    model
}

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<listing::Model, StoreError> {
    listing::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(normalized)
        .ok_or_else(|| StoreError::not_found("listing", id))
}

pub async fn get_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<listing::Model, StoreError> {
    listing::Entity::find()
        .filter(listing::Column::Slug.eq(slug))
        .one(db)
        .await?
        .map(normalized)
        .ok_or_else(|| StoreError::NotFound(format!("listing \u{201c}{slug}\u{201d}")))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<listing::Model>, StoreError> {
    let page = fetch_page(
        db,
        listing::Entity::find().order_by_asc(listing::Column::Id),
        page,
        per_page,
    )
    .await?;
    Ok(page.map(normalized))
}

/// Listings for the public view, newest first.
pub async fn list_public(
    db: &DatabaseConnection,
    status: Status,
    category_id: Option<i64>,
    page: u64,
    per_page: u64,
) -> Result<Page<listing::Model>, StoreError> {
    let mut select = listing::Entity::find().filter(listing::Column::Status.eq(status));
    if let Some(category_id) = category_id {
        select = select.filter(listing::Column::CategoryId.eq(category_id));
    }
    let select = select
        .order_by_desc(listing::Column::DatePosted)
        .order_by_desc(listing::Column::Id);

    Ok(fetch_page(db, select, page, per_page).await?.map(normalized))
}

/// A listing with its seller, category and images, featured image first.
pub async fn detail_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<ListingDetailResponse, StoreError> {
    let listing = get_by_slug(db, slug).await?;

    let seller = user::Entity::find_by_id(listing.seller_id)
        .one(db)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();

    let category = match listing.category_id {
        Some(id) => category::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    let images = listing
        .find_related(listing_image::Entity)
        .order_by_desc(listing_image::Column::IsFeatured)
        .order_by_asc(listing_image::Column::UploadedAt)
        .order_by_asc(listing_image::Column::Id)
        .all(db)
        .await?;

    Ok(ListingDetailResponse {
        listing,
        seller,
        category,
        images,
    })
}

async fn slug_taken(
    db: &DatabaseConnection,
    candidate: &str,
    exclude_id: Option<i64>,
) -> Result<bool, StoreError> {
    let mut select = listing::Entity::find().filter(listing::Column::Slug.eq(candidate));
    if let Some(id) = exclude_id {
        select = select.filter(listing::Column::Id.ne(id));
    }
    Ok(select.one(db).await?.is_some())
}

/// First free slug derived from `title`: `title`, `title-2`, `title-3`, ...
pub async fn unique_slug(
    db: &DatabaseConnection,
    title: &str,
    exclude_id: Option<i64>,
) -> Result<String, StoreError> {
    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let candidate = slug::make_slug(title, attempt);
        if !slug_taken(db, &candidate, exclude_id).await? {
            return Ok(candidate);
        }
    }
    Err(StoreError::field(
        "slug",
        "Could not derive a free slug from the title; please enter one.",
    ))
}

/// Validate the form and its references, returning the slug to store.
async fn check_form(
    db: &DatabaseConnection,
    form: &ListingForm,
    existing: Option<&listing::Model>,
) -> Result<String, StoreError> {
    let mut errors: FieldErrors = form.validate();
    check_exists::<user::Entity, _>(db, form.seller_id, "seller_id", &mut errors).await?;
    if let Some(category_id) = form.category_id {
        check_exists::<category::Entity, _>(db, category_id, "category_id", &mut errors).await?;
    }
    errors.into_result()?;

    let exclude_id = existing.map(|l| l.id);
    match (form.slug.as_deref(), existing) {
        (Some(requested), _) => {
            if slug_taken(db, requested, exclude_id).await? {
                return Err(StoreError::field("slug", SLUG_TAKEN));
            }
            Ok(requested.to_string())
        }
        (None, Some(existing)) => Ok(existing.slug.clone()),
        (None, None) => unique_slug(db, &form.title, None).await,
    }
}

pub async fn create(
    db: &DatabaseConnection,
    form: ListingForm,
) -> Result<listing::Model, StoreError> {
    let slug = check_form(db, &form, None).await?;

    let created = listing::ActiveModel {
        seller_id: Set(form.seller_id),
        title: Set(form.title.trim().to_string()),
        description: Set(form.description),
        condition: Set(form.condition),
        price: Set(normalize_price(form.price)),
        category_id: Set(form.category_id),
        date_posted: Set(now()),
        status: Set(form.status),
        slug: Set(slug),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| StoreError::from_unique_violation(e, "slug", SLUG_TAKEN))?;

    log::info!("Listing created: {} (id={}, slug={})", created.title, created.id, created.slug);
    Ok(normalized(created))
}

/// Replace the editable fields. `date_posted` is never touched.
pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: ListingForm,
) -> Result<listing::Model, StoreError> {
    let existing = get(db, id).await?;
    let slug = check_form(db, &form, Some(&existing)).await?;

    let mut active: listing::ActiveModel = existing.into();
    active.seller_id = Set(form.seller_id);
    active.title = Set(form.title.trim().to_string());
    active.description = Set(form.description);
    active.condition = Set(form.condition);
    active.price = Set(normalize_price(form.price));
    active.category_id = Set(form.category_id);
    active.status = Set(form.status);
    active.slug = Set(slug);

    let updated = active
        .update(db)
        .await
        .map_err(|e| StoreError::from_unique_violation(e, "slug", SLUG_TAKEN))?;

    log::info!("Listing updated: {} (id={})", updated.title, updated.id);
    Ok(normalized(updated))
}

/// Delete a listing; its images and messages go with it.
pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<listing::Model, StoreError> {
    let existing = get(db, id).await?;
    listing::Entity::delete_by_id(id).exec(db).await?;
    log::info!("Listing deleted: {} (id={})", existing.title, id);
    Ok(existing)
}

pub fn describe(listing: &listing::Model) -> String {
    listing.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingImageForm, MessageForm};
    use crate::store::testing::{listing_form, seed_category, seed_listing, seed_user, setup_db};
    use crate::store::{listing_images, messages};
    use entity::listing::Condition;
    use entity::message;
    use rust_decimal::Decimal;
    use sea_orm::PaginatorTrait;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_price_keeps_two_fraction_digits() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;

        let exact = seed_listing(&db, seller.id, "Lamp", "19.99").await;
        let short = seed_listing(&db, seller.id, "Chair", "19.9").await;
        let whole = seed_listing(&db, seller.id, "Table", "250").await;

        assert_eq!(get(&db, exact.id).await.unwrap().price.to_string(), "19.99");
        assert_eq!(get(&db, short.id).await.unwrap().price.to_string(), "19.90");
        assert_eq!(get(&db, whole.id).await.unwrap().price.to_string(), "250.00");
        assert_eq!(
            get(&db, exact.id).await.unwrap().price,
            Decimal::from_str("19.99").unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_price_and_missing_refs() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;

        let err = create(&db, listing_form(seller.id, "Lamp", "1.999"))
            .await
            .unwrap_err();
        match err {
            StoreError::Validation(errors) => assert!(errors.has("price")),
            other => panic!("unexpected error: {other:?}"),
        }

        let mut form = listing_form(9999, "Lamp", "10.00");
        form.category_id = Some(12345);
        match create(&db, form).await.unwrap_err() {
            StoreError::Validation(errors) => {
                assert!(errors.has("seller_id"));
                assert!(errors.has("category_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_defaults_and_derived_slug() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;

        let first = seed_listing(&db, seller.id, "Vintage Road Bike", "300.00").await;
        let second = seed_listing(&db, seller.id, "Vintage road bike!", "280.00").await;
        let third = seed_listing(&db, seller.id, "vintage-road-bike", "250.00").await;

        assert_eq!(first.status, Status::Available);
        assert_eq!(first.slug, "vintage-road-bike");
        assert_eq!(second.slug, "vintage-road-bike-2");
        assert_eq!(third.slug, "vintage-road-bike-3");
    }

    #[tokio::test]
    async fn test_derived_slug_folds_accented_letters() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;

        let chair = seed_listing(&db, seller.id, "Café crème Über-Stuhl", "45.00").await;
        assert_eq!(chair.slug, "cafe-creme-uber-stuhl");
        assert_eq!(get_by_slug(&db, "cafe-creme-uber-stuhl").await.unwrap().id, chair.id);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        seed_listing(&db, seller.id, "Lamp", "10.00").await;
        seed_listing(&db, seller.id, "Chair", "20.00").await;

        let page = list(&db, u64::MAX, 100).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.page, u64::MAX);
        assert_eq!(page.total_pages, 1);
        assert!(page.results.is_empty());

        let public = list_public(&db, Status::Available, None, u64::MAX, u64::MAX)
            .await
            .unwrap();
        assert_eq!(public.count, 2);
        assert!(public.results.is_empty());

        let last = list(&db, 2, 1).await.unwrap();
        assert_eq!(last.results.len(), 1);
        assert!(list(&db, 3, 1).await.unwrap().results.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_slug_must_be_unique() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let first = seed_listing(&db, seller.id, "Lamp", "10.00").await;

        let mut form = listing_form(seller.id, "Other lamp", "12.00");
        form.slug = Some(first.slug.clone());
        match create(&db, form).await.unwrap_err() {
            StoreError::Validation(errors) => assert!(errors.has("slug")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Re-saving a listing with its own slug is fine.
        let mut same = listing_form(seller.id, "Lamp (renamed)", "11.00");
        same.slug = Some(first.slug.clone());
        let updated = update(&db, first.id, same).await.unwrap();
        assert_eq!(updated.slug, first.slug);
        assert_eq!(updated.date_posted, first.date_posted);
    }

    #[tokio::test]
    async fn test_update_keeps_slug_when_omitted() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let listing = seed_listing(&db, seller.id, "Lamp", "10.00").await;

        let mut form = listing_form(seller.id, "Brass lamp", "10.00");
        form.status = Status::Sold;
        form.condition = Condition::Worn;
        let updated = update(&db, listing.id, form).await.unwrap();

        assert_eq!(updated.slug, "lamp");
        assert_eq!(updated.title, "Brass lamp");
        assert_eq!(updated.status, Status::Sold);
        assert_eq!(updated.condition, Condition::Worn);
    }

    #[tokio::test]
    async fn test_delete_cascades_images_and_messages() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let listing = seed_listing(&db, seller.id, "Lamp", "10.00").await;
        let keep = seed_listing(&db, seller.id, "Chair", "20.00").await;

        for image in ["listing_images/a.jpg", "listing_images/b.jpg"] {
            listing_images::create(
                &db,
                ListingImageForm {
                    listing_id: listing.id,
                    image: image.to_string(),
                    alt_text: None,
                    is_featured: false,
                },
            )
            .await
            .unwrap();
        }
        for listing_id in [listing.id, keep.id] {
            messages::create(
                &db,
                MessageForm {
                    sender_id: buyer.id,
                    receiver_id: seller.id,
                    listing_id,
                    content: "Is this still available?".to_string(),
                    read: false,
                },
            )
            .await
            .unwrap();
        }

        delete(&db, listing.id).await.unwrap();

        assert_eq!(listing_image::Entity::find().count(&db).await.unwrap(), 0);
        let remaining = message::Entity::find().all(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].listing_id, keep.id);
        assert!(get(&db, keep.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_public_listing_filters() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let bikes = seed_category(&db, "Bikes").await;

        let mut bike = listing_form(seller.id, "Road bike", "300.00");
        bike.category_id = Some(bikes.id);
        let bike = create(&db, bike).await.unwrap();

        let mut sold = listing_form(seller.id, "Old bike", "50.00");
        sold.category_id = Some(bikes.id);
        sold.status = Status::Sold;
        create(&db, sold).await.unwrap();

        seed_listing(&db, seller.id, "Lamp", "10.00").await;

        let available = list_public(&db, Status::Available, None, 1, 10).await.unwrap();
        assert_eq!(available.count, 2);

        let available_bikes = list_public(&db, Status::Available, Some(bikes.id), 1, 10)
            .await
            .unwrap();
        assert_eq!(available_bikes.count, 1);
        assert_eq!(available_bikes.results[0].id, bike.id);

        let sold = list_public(&db, Status::Sold, None, 1, 10).await.unwrap();
        assert_eq!(sold.count, 1);
    }

    #[tokio::test]
    async fn test_detail_by_slug_puts_featured_image_first() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let listing = seed_listing(&db, seller.id, "Lamp", "10.00").await;

        for (image, featured) in [("listing_images/side.jpg", false), ("listing_images/front.jpg", true)] {
            listing_images::create(
                &db,
                ListingImageForm {
                    listing_id: listing.id,
                    image: image.to_string(),
                    alt_text: None,
                    is_featured: featured,
                },
            )
            .await
            .unwrap();
        }

        let detail = detail_by_slug(&db, &listing.slug).await.unwrap();
        assert_eq!(detail.seller, "seller");
        assert!(detail.category.is_none());
        assert_eq!(detail.images.len(), 2);
        assert_eq!(detail.images[0].image, "listing_images/front.jpg");

        assert!(matches!(
            detail_by_slug(&db, "no-such-listing").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
