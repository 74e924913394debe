use sea_orm::DatabaseConnection;

/// Shared application state
pub struct AppState {
    /// Sea-ORM database connection pool
    pub db: DatabaseConnection,

    /// Rows per page on admin change lists and the public listings view
    pub list_per_page: u64,
}
