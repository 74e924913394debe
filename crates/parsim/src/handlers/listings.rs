use actix_web::{web, HttpResponse};
use entity::listing::Status;

use crate::app_state::AppState;
use crate::error::StoreError;
use crate::models::ListingsQuery;
use crate::store::listings;

/// GET /listings/
/// Public listings, newest first. Only available listings unless `status` says otherwise.
pub async fn view_listings(
    app_state: web::Data<AppState>,
    query: web::Query<ListingsQuery>,
) -> Result<HttpResponse, StoreError> {
    let query = query.into_inner();
    let page = listings::list_public(
        &app_state.db,
        query.status.unwrap_or(Status::Available),
        query.category,
        query.page.unwrap_or(1),
        app_state.list_per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /listings/{slug}/
pub async fn listing_detail(
    app_state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, StoreError> {
    let detail = listings::detail_by_slug(&app_state.db, &slug).await?;
    Ok(HttpResponse::Ok().json(detail))
}
