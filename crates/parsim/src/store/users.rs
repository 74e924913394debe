use entity::{listing, user};
use parsim_core::{password, username};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::StoreError;
use crate::models::{blank_to_none, Page, UserForm};
use crate::store::{fetch_page, now};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<user::Model, StoreError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("user", id))
}

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>, StoreError> {
    let username = username::normalize_username(username);
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<user::Model>, StoreError> {
    fetch_page(db, user::Entity::find().order_by_asc(user::Column::Id), page, per_page).await
}

pub async fn create(db: &DatabaseConnection, form: UserForm) -> Result<user::Model, StoreError> {
    form.validate(true).into_result()?;

    let requested_username = username::normalize_username(&form.username);
    if find_by_username(db, &requested_username).await?.is_some() {
        return Err(StoreError::field("username", USERNAME_TAKEN));
    }

    let password_hash = hash(form.password.as_deref().unwrap_or_default())?;

    let new_user = user::ActiveModel {
        username: Set(requested_username.clone()),
        password_hash: Set(password_hash),
        email: Set(form.email.trim().to_string()),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        is_staff: Set(form.is_staff),
        is_superuser: Set(form.is_superuser),
        is_active: Set(form.is_active),
        last_login: Set(None),
        profile_picture: Set(blank_to_none(form.profile_picture)),
        bio: Set(blank_to_none(form.bio)),
        date_joined: Set(now()),
        phone_number: Set(form.phone_number.trim().to_string()),
        geolocation: Set(blank_to_none(form.geolocation)),
        ..Default::default()
    };

    let created = new_user
        .insert(db)
        .await
        .map_err(|e| StoreError::from_unique_violation(e, "username", USERNAME_TAKEN))?;

    log::info!("User created: {} (id={})", created.username, created.id);
    Ok(created)
}

/// Replace the editable fields of a user. The password only changes when one is given.
pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: UserForm,
) -> Result<user::Model, StoreError> {
    form.validate(false).into_result()?;
    let existing = get(db, id).await?;

    let requested_username = username::normalize_username(&form.username);
    if let Some(other) = find_by_username(db, &requested_username).await? {
        if other.id != id {
            return Err(StoreError::field("username", USERNAME_TAKEN));
        }
    }

    let mut active: user::ActiveModel = existing.into();
    active.username = Set(requested_username);
    if let Some(new_password) = form.password.as_deref() {
        active.password_hash = Set(hash(new_password)?);
    }
    active.email = Set(form.email.trim().to_string());
    active.first_name = Set(form.first_name);
    active.last_name = Set(form.last_name);
    active.is_staff = Set(form.is_staff);
    active.is_superuser = Set(form.is_superuser);
    active.is_active = Set(form.is_active);
    active.profile_picture = Set(blank_to_none(form.profile_picture));
    active.bio = Set(blank_to_none(form.bio));
    active.phone_number = Set(form.phone_number.trim().to_string());
    active.geolocation = Set(blank_to_none(form.geolocation));

    let updated = active
        .update(db)
        .await
        .map_err(|e| StoreError::from_unique_violation(e, "username", USERNAME_TAKEN))?;

    log::info!("User updated: {} (id={})", updated.username, updated.id);
    Ok(updated)
}

/// Delete a user together with their messages, reviews and notifications.
///
/// Listings do not cascade from their seller, so a user who still sells
/// anything is refused with [`StoreError::Conflict`] and nothing is removed.
pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<user::Model, StoreError> {
    let existing = get(db, id).await?;

    let listing_count = listing::Entity::find()
        .filter(listing::Column::SellerId.eq(id))
        .count(db)
        .await?;
    if listing_count > 0 {
        return Err(StoreError::Conflict(format!(
            "Cannot delete user \u{201c}{}\u{201d}: they are the seller of {} listing(s)",
            existing.username, listing_count
        )));
    }

    user::Entity::delete_by_id(id).exec(db).await.map_err(|e| {
        match e.sql_err() {
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Conflict(
                format!("Cannot delete user \u{201c}{}\u{201d}: still referenced", existing.username),
            ),
            _ => StoreError::Database(e),
        }
    })?;

    log::info!("User deleted: {} (id={})", existing.username, id);
    Ok(existing)
}

pub fn describe(user: &user::Model) -> String {
    user.to_string()
}

fn hash(plain: &str) -> Result<String, StoreError> {
    password::hash_password(plain).map_err(|e| StoreError::Internal(e.to_string()))
}
