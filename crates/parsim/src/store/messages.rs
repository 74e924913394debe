use entity::{listing, message, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::error::StoreError;
use crate::models::{MessageForm, Page};
use crate::store::{check_exists, fetch_page, now};

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<message::Model, StoreError> {
    message::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("message", id))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<message::Model>, StoreError> {
    fetch_page(
        db,
        message::Entity::find().order_by_asc(message::Column::Id),
        page,
        per_page,
    )
    .await
}

async fn check_form(db: &DatabaseConnection, form: &MessageForm) -> Result<(), StoreError> {
    let mut errors = form.validate();
    check_exists::<user::Entity, _>(db, form.sender_id, "sender_id", &mut errors).await?;
    check_exists::<user::Entity, _>(db, form.receiver_id, "receiver_id", &mut errors).await?;
    check_exists::<listing::Entity, _>(db, form.listing_id, "listing_id", &mut errors).await?;
    Ok(errors.into_result()?)
}

pub async fn create(
    db: &DatabaseConnection,
    form: MessageForm,
) -> Result<message::Model, StoreError> {
    check_form(db, &form).await?;

    let created = message::ActiveModel {
        sender_id: Set(form.sender_id),
        receiver_id: Set(form.receiver_id),
        listing_id: Set(form.listing_id),
        content: Set(form.content),
        timestamp: Set(now()),
        read: Set(form.read),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "Message created: {} -> {} about listing {}",
        created.sender_id,
        created.receiver_id,
        created.listing_id
    );
    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: MessageForm,
) -> Result<message::Model, StoreError> {
    let existing = get(db, id).await?;
    check_form(db, &form).await?;

    let mut active: message::ActiveModel = existing.into();
    active.sender_id = Set(form.sender_id);
    active.receiver_id = Set(form.receiver_id);
    active.listing_id = Set(form.listing_id);
    active.content = Set(form.content);
    active.read = Set(form.read);
    Ok(active.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<message::Model, StoreError> {
    let existing = get(db, id).await?;
    message::Entity::delete_by_id(id).exec(db).await?;
    Ok(existing)
}

pub async fn describe(
    db: &DatabaseConnection,
    message: &message::Model,
) -> Result<String, StoreError> {
    let sender = user::Entity::find_by_id(message.sender_id).one(db).await?;
    let receiver = user::Entity::find_by_id(message.receiver_id).one(db).await?;
    let listing = listing::Entity::find_by_id(message.listing_id).one(db).await?;

    Ok(format!(
        "Message from {} to {} about {}",
        sender.map(|u| u.username).unwrap_or_default(),
        receiver.map(|u| u.username).unwrap_or_default(),
        listing.map(|l| l.title).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{seed_listing, seed_user, setup_db};

    #[tokio::test]
    async fn test_create_and_describe() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let lamp = seed_listing(&db, seller.id, "Lamp", "10.00").await;

        let message = create(
            &db,
            MessageForm {
                sender_id: buyer.id,
                receiver_id: seller.id,
                listing_id: lamp.id,
                content: "Would you take 8?".to_string(),
                read: false,
            },
        )
        .await
        .unwrap();

        assert!(!message.read);
        assert_eq!(
            describe(&db, &message).await.unwrap(),
            "Message from buyer to seller about Lamp"
        );
    }

    #[tokio::test]
    async fn test_content_limits_and_references() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;

        let err = create(
            &db,
            MessageForm {
                sender_id: seller.id,
                receiver_id: 77,
                listing_id: 88,
                content: "x".repeat(256),
                read: false,
            },
        )
        .await
        .unwrap_err();

        match err {
            StoreError::Validation(errors) => {
                assert!(errors.has("content"));
                assert!(errors.has("receiver_id"));
                assert!(errors.has("listing_id"));
                assert!(!errors.has("sender_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mark_read_keeps_timestamp() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let lamp = seed_listing(&db, seller.id, "Lamp", "10.00").await;

        let mut form = MessageForm {
            sender_id: buyer.id,
            receiver_id: seller.id,
            listing_id: lamp.id,
            content: "Hello".to_string(),
            read: false,
        };
        let message = create(&db, form.clone()).await.unwrap();

        form.read = true;
        let updated = update(&db, message.id, form).await.unwrap();
        assert!(updated.read);
        assert_eq!(updated.timestamp, message.timestamp);
    }
}
