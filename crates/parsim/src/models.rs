use entity::listing::{Condition, Status};
use entity::{category, listing, listing_image};
use parsim_core::validation::FieldErrors;
use parsim_core::{slug, username};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 255;
pub const SHORT_TEXT_MAX_LEN: usize = 255;
pub const NAME_MAX_LEN: usize = 150;
pub const FILE_REF_MAX_LEN: usize = 100;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Per-field messages for rejected forms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// `?page=N` for admin change lists.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// Query string for GET /listings/
#[derive(Debug, Default, Deserialize)]
pub struct ListingsQuery {
    /// Defaults to `available`.
    pub status: Option<Status>,
    pub category: Option<i64>,
    pub page: Option<u64>,
}

/// One page of rows, ordered by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Response for GET /admin/
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub site_header: String,
    pub index_title: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub app_label: String,
    pub model_name: String,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    pub url: String,
    pub list_display: Vec<String>,
    pub fields: Vec<String>,
}

/// Response for GET /admin/marketplace/{model}/
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub model_name: String,
    #[serde(flatten)]
    pub page: Page<serde_json::Value>,
}

/// Response for GET /admin/marketplace/{model}/{id}/
#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub model_name: String,
    pub repr: String,
    pub data: serde_json::Value,
}

/// Response for create/update/delete
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Response for GET /listings/{slug}/
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingDetailResponse {
    pub listing: listing::Model,
    pub seller: String,
    pub category: Option<category::Model>,
    /// Featured image first, then upload order.
    pub images: Vec<listing_image::Model>,
}

fn default_true() -> bool {
    true
}

fn default_phone_number() -> String {
    entity::user::DEFAULT_PHONE_NUMBER.to_string()
}

/// Empty optional strings are stored as NULL.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Editable user fields. `password` is required when creating and optional on
/// change; it is hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserForm {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default = "default_phone_number")]
    pub phone_number: String,
    #[serde(default)]
    pub geolocation: Option<String>,
}

impl UserForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            profile_picture: None,
            bio: None,
            phone_number: default_phone_number(),
            geolocation: None,
        }
    }

    pub fn validate(&self, creating: bool) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if errors.required("username", &self.username) {
            errors.max_length("username", self.username.trim(), username::USERNAME_MAX_LEN);
            if let Err(msg) = username::validate_username(&self.username) {
                if username::normalize_username(&self.username).chars().count()
                    <= username::USERNAME_MAX_LEN
                {
                    errors.add("username", msg);
                }
            }
        }

        match self.password.as_deref() {
            Some(password) => {
                if let Err(msg) = parsim_core::password::validate_password(password) {
                    errors.add("password", msg);
                }
            }
            None if creating => errors.add("password", "This field is required."),
            None => {}
        }

        errors.email("email", self.email.trim());
        errors.max_length("first_name", &self.first_name, NAME_MAX_LEN);
        errors.max_length("last_name", &self.last_name, NAME_MAX_LEN);
        errors.optional_max_length(
            "profile_picture",
            self.profile_picture.as_deref(),
            FILE_REF_MAX_LEN,
        );
        errors.phone_number("phone_number", self.phone_number.trim());
        errors.optional_max_length("geolocation", self.geolocation.as_deref(), SHORT_TEXT_MAX_LEN);
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required_max_length("name", &self.name, SHORT_TEXT_MAX_LEN);
        errors
    }
}

/// Editable listing fields. When `slug` is omitted a slug is derived from the
/// title on creation and kept unchanged on later edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingForm {
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub condition: Condition,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub slug: Option<String>,
}

impl ListingForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required_max_length("title", &self.title, TITLE_MAX_LEN);
        errors.required("description", &self.description);
        errors.price("price", &self.price);
        if let Some(slug) = self.slug.as_deref() {
            if !slug::is_valid_slug(slug) {
                errors.add(
                    "slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens (at most 50).",
                );
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingImageForm {
    pub listing_id: i64,
    pub image: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl ListingImageForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required_max_length("image", &self.image, FILE_REF_MAX_LEN);
        errors.optional_max_length("alt_text", self.alt_text.as_deref(), SHORT_TEXT_MAX_LEN);
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageForm {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub listing_id: i64,
    pub content: String,
    #[serde(default)]
    pub read: bool,
}

impl MessageForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required_max_length("content", &self.content, SHORT_TEXT_MAX_LEN);
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewForm {
    pub reviewer_id: i64,
    pub seller_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ReviewForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.rating("rating", self.rating);
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationForm {
    pub user_id: i64,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
}

impl NotificationForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required_max_length("message", &self.message, SHORT_TEXT_MAX_LEN);
        errors
    }
}
