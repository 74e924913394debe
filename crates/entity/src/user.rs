use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Placeholder stored when no phone number was given.
pub const DEFAULT_PHONE_NUMBER: &str = "000-0000-0000";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i64,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// Designates whether the user can manage records through the admin site.
    pub is_staff: bool,

    pub is_superuser: bool,

    /// Unselect this instead of deleting accounts.
    pub is_active: bool,

    pub last_login: Option<ChronoDateTimeUtc>,

    /// Storage reference under `profile_pics/`.
    pub profile_picture: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub date_joined: ChronoDateTimeUtc,

    pub phone_number: String,

    /// Neighborhood or area
    pub geolocation: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::listing::Entity")]
    Listings,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}
