use entity::{notification, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::error::StoreError;
use crate::models::{NotificationForm, Page};
use crate::store::{check_exists, fetch_page, now};

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<notification::Model, StoreError> {
    notification::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("notification", id))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<notification::Model>, StoreError> {
    fetch_page(
        db,
        notification::Entity::find().order_by_asc(notification::Column::Id),
        page,
        per_page,
    )
    .await
}

async fn check_form(db: &DatabaseConnection, form: &NotificationForm) -> Result<(), StoreError> {
    let mut errors = form.validate();
    check_exists::<user::Entity, _>(db, form.user_id, "user_id", &mut errors).await?;
    Ok(errors.into_result()?)
}

pub async fn create(
    db: &DatabaseConnection,
    form: NotificationForm,
) -> Result<notification::Model, StoreError> {
    check_form(db, &form).await?;

    let created = notification::ActiveModel {
        user_id: Set(form.user_id),
        message: Set(form.message),
        is_read: Set(form.is_read),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::debug!("Notification {} queued for user {}", created.id, created.user_id);
    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: NotificationForm,
) -> Result<notification::Model, StoreError> {
    let existing = get(db, id).await?;
    check_form(db, &form).await?;

    let mut active: notification::ActiveModel = existing.into();
    active.user_id = Set(form.user_id);
    active.message = Set(form.message);
    active.is_read = Set(form.is_read);
    Ok(active.update(db).await?)
}

pub async fn delete(
    db: &DatabaseConnection,
    id: i64,
) -> Result<notification::Model, StoreError> {
    let existing = get(db, id).await?;
    notification::Entity::delete_by_id(id).exec(db).await?;
    Ok(existing)
}

pub async fn describe(
    db: &DatabaseConnection,
    notification: &notification::Model,
) -> Result<String, StoreError> {
    let recipient = user::Entity::find_by_id(notification.user_id)
        .one(db)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    Ok(format!("Notification for {}: {}", recipient, notification.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{seed_user, setup_db};

    #[tokio::test]
    async fn test_create_update_and_describe() {
        let db = setup_db().await;
        let alice = seed_user(&db, "alice").await;

        let mut form = NotificationForm {
            user_id: alice.id,
            message: "Your lamp sold".to_string(),
            is_read: false,
        };
        let created = create(&db, form.clone()).await.unwrap();
        assert!(!created.is_read);
        assert_eq!(
            describe(&db, &created).await.unwrap(),
            "Notification for alice: Your lamp sold"
        );

        form.is_read = true;
        let updated = update(&db, created.id, form).await.unwrap();
        assert!(updated.is_read);
        assert_eq!(updated.created_at, created.created_at);

        delete(&db, created.id).await.unwrap();
        assert!(matches!(
            get(&db, created.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_requires_message_and_user() {
        let db = setup_db().await;
        let err = create(
            &db,
            NotificationForm {
                user_id: 5,
                message: String::new(),
                is_read: false,
            },
        )
        .await
        .unwrap_err();

        match err {
            StoreError::Validation(errors) => {
                assert!(errors.has("message"));
                assert!(errors.has("user_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
