use crate::{app_state::AppState, config::ServeConfig, error::StoreError, handlers};
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use migration::MigratorTrait;
use sea_orm::Database;

pub async fn build_app_state(config: &ServeConfig) -> anyhow::Result<web::Data<AppState>> {
    log::info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    log::info!("Running database migrations...");
    migration::Migrator::up(&db, None).await?;
    log::info!("Database migrations completed");

    Ok(web::Data::new(AppState {
        db,
        list_per_page: config.list_per_page.max(1),
    }))
}

/// Admin and public routes, plus extractor configs that report malformed
/// input in the same error shape as the handlers.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| StoreError::InvalidPayload(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| StoreError::InvalidPayload(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| StoreError::InvalidPayload(err.to_string()).into()),
    )
    .service(
        web::scope("/admin")
            .route("/", web::get().to(handlers::dashboard))
            .route(
                "/marketplace/{model}/",
                web::get().to(handlers::admin::list_objects),
            )
            .route(
                "/marketplace/{model}/",
                web::post().to(handlers::admin::create_object),
            )
            .route(
                "/marketplace/{model}/{id}/",
                web::get().to(handlers::admin::get_object),
            )
            .route(
                "/marketplace/{model}/{id}/",
                web::put().to(handlers::admin::update_object),
            )
            .route(
                "/marketplace/{model}/{id}/",
                web::delete().to(handlers::admin::delete_object),
            ),
    )
    .service(
        web::scope("/listings")
            .route("/", web::get().to(handlers::listings::view_listings))
            .route("/{slug}/", web::get().to(handlers::listings::listing_detail)),
    );
}

pub async fn run_server(config: ServeConfig) -> anyhow::Result<()> {
    log::info!("Starting Parsim marketplace server...");

    let app_state = build_app_state(&config).await?;

    let bind_address = config.bind_address.clone();
    let cors_origins = config.cors_origin_list();

    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::DEFAULT_LIST_PER_PAGE;

    #[actix_web::test]
    async fn test_build_app_state_migrates_database() {
        let config = ServeConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            cors_origins: String::new(),
            log_level: "info".to_string(),
            list_per_page: 0,
        };

        let state = build_app_state(&config).await.unwrap();
        assert_eq!(state.list_per_page, 1);

        let page = crate::store::users::list(&state.db, 1, DEFAULT_LIST_PER_PAGE)
            .await
            .unwrap();
        assert_eq!(page.count, 0);
    }
}
