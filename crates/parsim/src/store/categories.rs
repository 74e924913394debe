use entity::{category, listing};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::StoreError;
use crate::models::{blank_to_none, CategoryForm, Page};
use crate::store::fetch_page;

pub async fn get(db: &DatabaseConnection, id: i64) -> Result<category::Model, StoreError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("category", id))
}

pub async fn list(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<category::Model>, StoreError> {
    fetch_page(
        db,
        category::Entity::find().order_by_asc(category::Column::Id),
        page,
        per_page,
    )
    .await
}

pub async fn create(
    db: &DatabaseConnection,
    form: CategoryForm,
) -> Result<category::Model, StoreError> {
    form.validate().into_result()?;

    let created = category::ActiveModel {
        name: Set(form.name.trim().to_string()),
        description: Set(blank_to_none(form.description)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Category created: {} (id={})", created.name, created.id);
    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    form: CategoryForm,
) -> Result<category::Model, StoreError> {
    form.validate().into_result()?;
    let mut active: category::ActiveModel = get(db, id).await?.into();
    active.name = Set(form.name.trim().to_string());
    active.description = Set(blank_to_none(form.description));
    Ok(active.update(db).await?)
}

/// Listings in the category stay and lose their category.
pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<category::Model, StoreError> {
    let existing = get(db, id).await?;
    let detached = listing::Entity::find()
        .filter(listing::Column::CategoryId.eq(id))
        .count(db)
        .await?;

    category::Entity::delete_by_id(id).exec(db).await?;

    log::info!(
        "Category deleted: {} (id={}), {} listing(s) left uncategorized",
        existing.name,
        id,
        detached
    );
    Ok(existing)
}

pub fn describe(category: &category::Model) -> String {
    category.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::listings;
    use crate::store::testing::{listing_form, seed_category, seed_user, setup_db};

    #[tokio::test]
    async fn test_create_requires_name() {
        let db = setup_db().await;
        let err = create(
            &db,
            CategoryForm {
                name: "  ".to_string(),
                description: Some("Things".to_string()),
            },
        )
        .await
        .unwrap_err();

        match err {
            StoreError::Validation(errors) => assert!(errors.has("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_nulls_listing_category() {
        let db = setup_db().await;
        let seller = seed_user(&db, "seller").await;
        let furniture = seed_category(&db, "Furniture").await;

        let mut form = listing_form(seller.id, "Oak table", "120.00");
        form.category_id = Some(furniture.id);
        let listing = listings::create(&db, form).await.unwrap();
        assert_eq!(listing.category_id, Some(furniture.id));

        delete(&db, furniture.id).await.unwrap();

        let reloaded = listings::get(&db, listing.id).await.unwrap();
        assert_eq!(reloaded.category_id, None);
        assert_eq!(reloaded.title, "Oak table");
        assert!(matches!(
            get(&db, furniture.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let db = setup_db().await;
        let books = seed_category(&db, "Books").await;
        seed_category(&db, "Bikes").await;

        let updated = update(
            &db,
            books.id,
            CategoryForm {
                name: "Books & Comics".to_string(),
                description: Some(String::new()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Books & Comics");
        assert!(updated.description.is_none());

        let page = list(&db, 1, 1).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, books.id);
    }
}
