use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::admin::{get_model_admin, AdminModel, ModelAdmin};
use crate::app_state::AppState;
use crate::error::StoreError;
use crate::models::*;
use crate::store::{categories, listing_images, listings, messages, notifications, reviews, users};

fn to_json<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Internal(e.to_string()))
}

fn json_page<T: Serialize>(page: Page<T>) -> Result<Page<Value>, StoreError> {
    let results = page
        .results
        .iter()
        .map(to_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        count: page.count,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        results,
    })
}

fn parse_form<T: DeserializeOwned>(body: Value) -> Result<T, StoreError> {
    serde_json::from_value(body)
        .map_err(|e| StoreError::InvalidPayload(format!("Invalid form data: {e}")))
}

fn lookup(model_name: &str) -> Result<&'static ModelAdmin, StoreError> {
    get_model_admin(model_name)
        .ok_or_else(|| StoreError::NotFound(format!("admin model \u{201c}{model_name}\u{201d}")))
}

/// A row rendered for the admin: its display string and its JSON form.
struct Rendered {
    repr: String,
    data: Value,
}

impl Rendered {
    fn new<T: Serialize>(repr: String, row: &T) -> Result<Self, StoreError> {
        Ok(Self {
            repr,
            data: to_json(row)?,
        })
    }
}

async fn list_rows(
    db: &DatabaseConnection,
    model: AdminModel,
    page: u64,
    per_page: u64,
) -> Result<Page<Value>, StoreError> {
    match model {
        AdminModel::User => json_page(users::list(db, page, per_page).await?),
        AdminModel::Category => json_page(categories::list(db, page, per_page).await?),
        AdminModel::Listing => json_page(listings::list(db, page, per_page).await?),
        AdminModel::ListingImage => json_page(listing_images::list(db, page, per_page).await?),
        AdminModel::Message => json_page(messages::list(db, page, per_page).await?),
        AdminModel::Review => json_page(reviews::list(db, page, per_page).await?),
        AdminModel::Notification => json_page(notifications::list(db, page, per_page).await?),
    }
}

async fn fetch_row(
    db: &DatabaseConnection,
    model: AdminModel,
    id: i64,
) -> Result<Rendered, StoreError> {
    match model {
        AdminModel::User => {
            let row = users::get(db, id).await?;
            Rendered::new(users::describe(&row), &row)
        }
        AdminModel::Category => {
            let row = categories::get(db, id).await?;
            Rendered::new(categories::describe(&row), &row)
        }
        AdminModel::Listing => {
            let row = listings::get(db, id).await?;
            Rendered::new(listings::describe(&row), &row)
        }
        AdminModel::ListingImage => {
            let row = listing_images::get(db, id).await?;
            Rendered::new(listing_images::describe(db, &row).await?, &row)
        }
        AdminModel::Message => {
            let row = messages::get(db, id).await?;
            Rendered::new(messages::describe(db, &row).await?, &row)
        }
        AdminModel::Review => {
            let row = reviews::get(db, id).await?;
            Rendered::new(reviews::describe(db, &row).await?, &row)
        }
        AdminModel::Notification => {
            let row = notifications::get(db, id).await?;
            Rendered::new(notifications::describe(db, &row).await?, &row)
        }
    }
}

/// Create a row, or replace the editable fields of row `id` when given.
async fn save_row(
    db: &DatabaseConnection,
    model: AdminModel,
    id: Option<i64>,
    body: Value,
) -> Result<Rendered, StoreError> {
    match model {
        AdminModel::User => {
            let form: UserForm = parse_form(body)?;
            let row = match id {
                Some(id) => users::update(db, id, form).await?,
                None => users::create(db, form).await?,
            };
            Rendered::new(users::describe(&row), &row)
        }
        AdminModel::Category => {
            let form: CategoryForm = parse_form(body)?;
            let row = match id {
                Some(id) => categories::update(db, id, form).await?,
                None => categories::create(db, form).await?,
            };
            Rendered::new(categories::describe(&row), &row)
        }
        AdminModel::Listing => {
            let form: ListingForm = parse_form(body)?;
            let row = match id {
                Some(id) => listings::update(db, id, form).await?,
                None => listings::create(db, form).await?,
            };
            Rendered::new(listings::describe(&row), &row)
        }
        AdminModel::ListingImage => {
            let form: ListingImageForm = parse_form(body)?;
            let row = match id {
                Some(id) => listing_images::update(db, id, form).await?,
                None => listing_images::create(db, form).await?,
            };
            Rendered::new(listing_images::describe(db, &row).await?, &row)
        }
        AdminModel::Message => {
            let form: MessageForm = parse_form(body)?;
            let row = match id {
                Some(id) => messages::update(db, id, form).await?,
                None => messages::create(db, form).await?,
            };
            Rendered::new(messages::describe(db, &row).await?, &row)
        }
        AdminModel::Review => {
            let form: ReviewForm = parse_form(body)?;
            let row = match id {
                Some(id) => reviews::update(db, id, form).await?,
                None => reviews::create(db, form).await?,
            };
            Rendered::new(reviews::describe(db, &row).await?, &row)
        }
        AdminModel::Notification => {
            let form: NotificationForm = parse_form(body)?;
            let row = match id {
                Some(id) => notifications::update(db, id, form).await?,
                None => notifications::create(db, form).await?,
            };
            Rendered::new(notifications::describe(db, &row).await?, &row)
        }
    }
}

async fn delete_row(db: &DatabaseConnection, model: AdminModel, id: i64) -> Result<(), StoreError> {
    match model {
        AdminModel::User => users::delete(db, id).await.map(|_| ()),
        AdminModel::Category => categories::delete(db, id).await.map(|_| ()),
        AdminModel::Listing => listings::delete(db, id).await.map(|_| ()),
        AdminModel::ListingImage => listing_images::delete(db, id).await.map(|_| ()),
        AdminModel::Message => messages::delete(db, id).await.map(|_| ()),
        AdminModel::Review => reviews::delete(db, id).await.map(|_| ()),
        AdminModel::Notification => notifications::delete(db, id).await.map(|_| ()),
    }
}

/// GET /admin/marketplace/{model}/
pub async fn list_objects(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, StoreError> {
    let admin = lookup(&path)?;
    let page = list_rows(
        &app_state.db,
        admin.model,
        query.page.unwrap_or(1),
        app_state.list_per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        model_name: admin.model_name.to_string(),
        page,
    }))
}

/// POST /admin/marketplace/{model}/
pub async fn create_object(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, StoreError> {
    let admin = lookup(&path)?;
    let saved = save_row(&app_state.db, admin.model, None, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(MutationResponse {
        success: true,
        message: format!(
            "The {} \u{201c}{}\u{201d} was added successfully.",
            admin.verbose_name, saved.repr
        ),
        data: Some(saved.data),
    }))
}

/// GET /admin/marketplace/{model}/{id}/
pub async fn get_object(
    app_state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, StoreError> {
    let (model_name, id) = path.into_inner();
    let admin = lookup(&model_name)?;
    let row = fetch_row(&app_state.db, admin.model, id).await?;

    Ok(HttpResponse::Ok().json(DetailResponse {
        model_name: admin.model_name.to_string(),
        repr: row.repr,
        data: row.data,
    }))
}

/// PUT /admin/marketplace/{model}/{id}/
pub async fn update_object(
    app_state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
    body: web::Json<Value>,
) -> Result<HttpResponse, StoreError> {
    let (model_name, id) = path.into_inner();
    let admin = lookup(&model_name)?;
    let saved = save_row(&app_state.db, admin.model, Some(id), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        success: true,
        message: format!(
            "The {} \u{201c}{}\u{201d} was changed successfully.",
            admin.verbose_name, saved.repr
        ),
        data: Some(saved.data),
    }))
}

/// DELETE /admin/marketplace/{model}/{id}/
pub async fn delete_object(
    app_state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, StoreError> {
    let (model_name, id) = path.into_inner();
    let admin = lookup(&model_name)?;

    // Rendered first: the display string of a message or image reads related rows.
    let row = fetch_row(&app_state.db, admin.model, id).await?;
    delete_row(&app_state.db, admin.model, id).await?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        success: true,
        message: format!(
            "The {} \u{201c}{}\u{201d} was deleted successfully.",
            admin.verbose_name, row.repr
        ),
        data: None,
    }))
}
