pub mod admin;
pub mod listings;

use actix_web::{HttpResponse, Responder};

use crate::admin::dashboard as admin_dashboard;

/// GET /admin/
/// Registered models with their change list URLs
pub async fn dashboard() -> impl Responder {
    HttpResponse::Ok().json(admin_dashboard())
}
