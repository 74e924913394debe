use entity::{review, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::error::StoreError;
use crate::models::{blank_to_none, Page, ReviewForm};
use crate::store::{check_exists, fetch_page, now};

const DUPLICATE_REVIEW: &str = "Review with this Reviewer and Seller already exists.";

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<review::Model, StoreError> {
    review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("review", id))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<review::Model>, StoreError> {
    fetch_page(
        db,
        review::Entity::find().order_by_asc(review::Column::Id),
        page,
        per_page,
    )
    .await
}

/// Validate the form and make sure the reviewer has not already reviewed
/// this seller. `exclude_id` skips the review being edited.
async fn check_form(
    db: &DatabaseConnection,
    form: &ReviewForm,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    let mut errors = form.validate();
    let reviewer =
        check_exists::<user::Entity, _>(db, form.reviewer_id, "reviewer_id", &mut errors).await?;
    let seller =
        check_exists::<user::Entity, _>(db, form.seller_id, "seller_id", &mut errors).await?;

    if reviewer.is_some() && seller.is_some() {
        let mut existing = review::Entity::find()
            .filter(review::Column::ReviewerId.eq(form.reviewer_id))
            .filter(review::Column::SellerId.eq(form.seller_id));
        if let Some(id) = exclude_id {
            existing = existing.filter(review::Column::Id.ne(id));
        }
        if existing.one(db).await?.is_some() {
            errors.add("seller_id", DUPLICATE_REVIEW);
        }
    }

    Ok(errors.into_result()?)
}

pub async fn create(db: &DatabaseConnection, form: ReviewForm) -> Result<review::Model, StoreError> {
    check_form(db, &form, None).await?;

    let created = review::ActiveModel {
        reviewer_id: Set(form.reviewer_id),
        seller_id: Set(form.seller_id),
        rating: Set(form.rating),
        comment: Set(blank_to_none(form.comment)),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| StoreError::from_unique_violation(e, "seller_id", DUPLICATE_REVIEW))?;

    log::info!(
        "Review created: {} star(s) by user {} for user {}",
        created.rating,
        created.reviewer_id,
        created.seller_id
    );
    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: ReviewForm,
) -> Result<review::Model, StoreError> {
    let existing = get(db, id).await?;
    check_form(db, &form, Some(id)).await?;

    let mut active: review::ActiveModel = existing.into();
    active.reviewer_id = Set(form.reviewer_id);
    active.seller_id = Set(form.seller_id);
    active.rating = Set(form.rating);
    active.comment = Set(blank_to_none(form.comment));
    active
        .update(db)
        .await
        .map_err(|e| StoreError::from_unique_violation(e, "seller_id", DUPLICATE_REVIEW))
}

pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<review::Model, StoreError> {
    let existing = get(db, id).await?;
    review::Entity::delete_by_id(id).exec(db).await?;
    Ok(existing)
}

pub async fn describe(db: &DatabaseConnection, review: &review::Model) -> Result<String, StoreError> {
    let reviewer = user::Entity::find_by_id(review.reviewer_id).one(db).await?;
    let seller = user::Entity::find_by_id(review.seller_id).one(db).await?;

    Ok(format!(
        "{} star review by {} for {}",
        review.rating,
        reviewer.map(|u| u.username).unwrap_or_default(),
        seller.map(|u| u.username).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{seed_user, setup_db};

    fn form(reviewer_id: i64, seller_id: i64, rating: i32) -> ReviewForm {
        ReviewForm {
            reviewer_id,
            seller_id,
            rating,
            comment: Some("Smooth pickup".to_string()),
        }
    }

    #[tokio::test]
    async fn test_one_review_per_reviewer_and_seller() {
        let db = setup_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;

        let first = create(&db, form(alice.id, bob.id, 5)).await.unwrap();
        assert_eq!(describe(&db, &first).await.unwrap(), "5 star review by alice for bob");

        let err = create(&db, form(alice.id, bob.id, 3)).await.unwrap_err();
        match err {
            StoreError::Validation(errors) => {
                assert_eq!(errors.get("seller_id").unwrap()[0], DUPLICATE_REVIEW);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Another seller, or the reverse direction, is fine.
        create(&db, form(alice.id, carol.id, 4)).await.unwrap();
        create(&db, form(bob.id, alice.id, 4)).await.unwrap();

        // Editing a review in place does not collide with itself.
        let updated = update(&db, first.id, form(alice.id, bob.id, 2)).await.unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_is_rejected() {
        let db = setup_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        for rating in [0, 6, -1] {
            let err = create(&db, form(alice.id, bob.id, rating)).await.unwrap_err();
            match err {
                StoreError::Validation(errors) => assert!(errors.has("rating")),
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(list(&db, 1, 10).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_missing_users() {
        let db = setup_db().await;
        let err = create(&db, form(10, 11, 3)).await.unwrap_err();
        match err {
            StoreError::Validation(errors) => {
                assert!(errors.has("reviewer_id"));
                assert!(errors.has("seller_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
