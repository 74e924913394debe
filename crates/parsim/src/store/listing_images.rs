use entity::{listing, listing_image};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::error::StoreError;
use crate::models::{blank_to_none, ListingImageForm, Page};
use crate::store::{check_exists, fetch_page, now};

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<listing_image::Model, StoreError> {
    listing_image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("listing image", id))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<listing_image::Model>, StoreError> {
    fetch_page(
        db,
        listing_image::Entity::find().order_by_asc(listing_image::Column::Id),
        page,
        per_page,
    )
    .await
}

async fn check_form(db: &DatabaseConnection, form: &ListingImageForm) -> Result<(), StoreError> {
    let mut errors = form.validate();
    check_exists::<listing::Entity, _>(db, form.listing_id, "listing_id", &mut errors).await?;
    Ok(errors.into_result()?)
}

/// Clear the featured flag on every other image of `listing_id`.
async fn unfeature_others(
    txn: &DatabaseTransaction,
    listing_id: i64,
    keep_id: Option<i64>,
) -> Result<u64, StoreError> {
    let mut update = listing_image::Entity::update_many()
        .col_expr(listing_image::Column::IsFeatured, Expr::value(false))
        .filter(listing_image::Column::ListingId.eq(listing_id))
        .filter(listing_image::Column::IsFeatured.eq(true));
    if let Some(id) = keep_id {
        update = update.filter(listing_image::Column::Id.ne(id));
    }
    Ok(update.exec(txn).await?.rows_affected)
}

pub async fn create(
    db: &DatabaseConnection,
    form: ListingImageForm,
) -> Result<listing_image::Model, StoreError> {
    check_form(db, &form).await?;

    let txn = db.begin().await?;
    if form.is_featured {
        unfeature_others(&txn, form.listing_id, None).await?;
    }
    let created = listing_image::ActiveModel {
        listing_id: Set(form.listing_id),
        image: Set(form.image.trim().to_string()),
        alt_text: Set(blank_to_none(form.alt_text)),
        uploaded_at: Set(now()),
        is_featured: Set(form.is_featured),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    log::info!(
        "Listing image created: {} for listing {} (featured={})",
        created.image,
        created.listing_id,
        created.is_featured
    );
    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: ListingImageForm,
) -> Result<listing_image::Model, StoreError> {
    let existing = get(db, id).await?;
    check_form(db, &form).await?;

    let txn = db.begin().await?;
    if form.is_featured {
        unfeature_others(&txn, form.listing_id, Some(id)).await?;
    }
    let mut active: listing_image::ActiveModel = existing.into();
    active.listing_id = Set(form.listing_id);
    active.image = Set(form.image.trim().to_string());
    active.alt_text = Set(blank_to_none(form.alt_text));
    active.is_featured = Set(form.is_featured);
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(updated)
}

pub async fn delete(
    db: &DatabaseConnection,
    id: i64,
) -> Result<listing_image::Model, StoreError> {
    let existing = get(db, id).await?;
    listing_image::Entity::delete_by_id(id).exec(db).await?;
    log::info!("Listing image deleted: {} (id={})", existing.image, id);
    Ok(existing)
}

pub async fn describe(
    db: &DatabaseConnection,
    image: &listing_image::Model,
) -> Result<String, StoreError> {
    let title = listing::Entity::find_by_id(image.listing_id)
        .one(db)
        .await?
        .map(|l| l.title)
        .unwrap_or_default();
    Ok(format!("Image for {} uploaded at {}", title, image.uploaded_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{seed_listing, seed_user, setup_db};

    fn form(listing_id: i64, image: &str, is_featured: bool) -> ListingImageForm {
        ListingImageForm {
            listing_id,
            image: image.to_string(),
            alt_text: Some("Front view".to_string()),
            is_featured,
        }
    }

    async fn featured_ids(db: &DatabaseConnection, listing_id: i64) -> Vec<i64> {
        listing_image::Entity::find()
            .filter(listing_image::Column::ListingId.eq(listing_id))
            .filter(listing_image::Column::IsFeatured.eq(true))
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect()
    }

    #[tokio::test]
    async fn test_featuring_an_image_unfeatures_siblings_only() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let lamp = seed_listing(&db, seller.id, "Lamp", "10.00").await;
        let chair = seed_listing(&db, seller.id, "Chair", "20.00").await;

        let first = create(&db, form(lamp.id, "listing_images/1.jpg", true)).await.unwrap();
        let chair_image = create(&db, form(chair.id, "listing_images/c.jpg", true)).await.unwrap();
        let second = create(&db, form(lamp.id, "listing_images/2.jpg", true)).await.unwrap();

        assert_eq!(featured_ids(&db, lamp.id).await, vec![second.id]);
        assert_eq!(featured_ids(&db, chair.id).await, vec![chair_image.id]);

        update(&db, first.id, form(lamp.id, "listing_images/1.jpg", true))
            .await
            .unwrap();
        assert_eq!(featured_ids(&db, lamp.id).await, vec![first.id]);
    }

    #[tokio::test]
    async fn test_validation_and_missing_listing() {
        let db = setup_db().await;
        let err = create(&db, form(404, "", false)).await.unwrap_err();
        match err {
            StoreError::Validation(errors) => {
                assert!(errors.has("image"));
                assert!(errors.has("listing_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_describe() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let lamp = seed_listing(&db, seller.id, "Lamp", "10.00").await;
        let image = create(&db, form(lamp.id, "listing_images/1.jpg", false)).await.unwrap();

        let repr = describe(&db, &image).await.unwrap();
        assert!(repr.starts_with("Image for Lamp uploaded at "));
    }
}
