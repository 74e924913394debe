//! Admin site registry.
//!
//! Each registered model gets a change list, add, change and delete endpoint
//! under `/admin/marketplace/{model_name}/`. The descriptors here only carry
//! presentation metadata; the forms in [`crate::models`] decide what is
//! actually editable.

use crate::models::{DashboardResponse, ModelInfo};

pub const APP_LABEL: &str = "marketplace";
pub const SITE_HEADER: &str = "Parsim Admin";
pub const INDEX_TITLE: &str = "Admin Dashboard";
pub const DEFAULT_LIST_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminModel {
    User,
    Category,
    Listing,
    ListingImage,
    Message,
    Review,
    Notification,
}

#[derive(Debug)]
pub struct ModelAdmin {
    pub model: AdminModel,
    pub model_name: &'static str,
    pub verbose_name: &'static str,
    pub verbose_name_plural: &'static str,
    pub list_display: &'static [&'static str],
    /// Editable fields, in form order. Identifiers and auto-set timestamps are never listed.
    pub fields: &'static [&'static str],
}

impl ModelAdmin {
    pub fn url(&self) -> String {
        format!("/admin/{APP_LABEL}/{}/", self.model_name)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            app_label: APP_LABEL.to_string(),
            model_name: self.model_name.to_string(),
            verbose_name: self.verbose_name.to_string(),
            verbose_name_plural: self.verbose_name_plural.to_string(),
            url: self.url(),
            list_display: self.list_display.iter().map(|f| f.to_string()).collect(),
            fields: self.fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

pub static REGISTRY: &[ModelAdmin] = &[
    ModelAdmin {
        model: AdminModel::User,
        model_name: "user",
        verbose_name: "user",
        verbose_name_plural: "users",
        list_display: &["id", "username", "email", "phone_number", "is_staff", "date_joined"],
        fields: &[
            "username",
            "password",
            "email",
            "first_name",
            "last_name",
            "is_staff",
            "is_superuser",
            "is_active",
            "profile_picture",
            "bio",
            "phone_number",
            "geolocation",
        ],
    },
    ModelAdmin {
        model: AdminModel::Listing,
        model_name: "listing",
        verbose_name: "Listing",
        verbose_name_plural: "Listings",
        list_display: &["id", "title", "seller_id", "price", "status", "date_posted"],
        fields: &[
            "seller_id",
            "title",
            "description",
            "condition",
            "price",
            "category_id",
            "status",
            "slug",
        ],
    },
    ModelAdmin {
        model: AdminModel::ListingImage,
        model_name: "listingimage",
        verbose_name: "listing image",
        verbose_name_plural: "listing images",
        list_display: &["id", "listing_id", "image", "is_featured", "uploaded_at"],
        fields: &["listing_id", "image", "alt_text", "is_featured"],
    },
    ModelAdmin {
        model: AdminModel::Category,
        model_name: "category",
        verbose_name: "category",
        verbose_name_plural: "Categories",
        list_display: &["id", "name"],
        fields: &["name", "description"],
    },
    ModelAdmin {
        model: AdminModel::Message,
        model_name: "message",
        verbose_name: "message",
        verbose_name_plural: "messages",
        list_display: &["id", "sender_id", "receiver_id", "listing_id", "read", "timestamp"],
        fields: &["sender_id", "receiver_id", "listing_id", "content", "read"],
    },
    ModelAdmin {
        model: AdminModel::Review,
        model_name: "review",
        verbose_name: "review",
        verbose_name_plural: "reviews",
        list_display: &["id", "reviewer_id", "seller_id", "rating", "created_at"],
        fields: &["reviewer_id", "seller_id", "rating", "comment"],
    },
    ModelAdmin {
        model: AdminModel::Notification,
        model_name: "notification",
        verbose_name: "notification",
        verbose_name_plural: "notifications",
        list_display: &["id", "user_id", "message", "is_read", "created_at"],
        fields: &["user_id", "message", "is_read"],
    },
];

pub fn get_model_admin(model_name: &str) -> Option<&'static ModelAdmin> {
    REGISTRY
        .iter()
        .find(|m| m.model_name.eq_ignore_ascii_case(model_name))
}

pub fn dashboard() -> DashboardResponse {
    DashboardResponse {
        site_header: SITE_HEADER.to_string(),
        index_title: INDEX_TITLE.to_string(),
        models: REGISTRY.iter().map(ModelAdmin::info).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTO_FIELDS: &[&str] = &[
        "id",
        "date_joined",
        "last_login",
        "date_posted",
        "uploaded_at",
        "timestamp",
        "created_at",
        "password_hash",
    ];

    #[test]
    fn test_every_model_registered_once() {
        assert_eq!(REGISTRY.len(), 7);
        for admin in REGISTRY {
            let same_name = REGISTRY
                .iter()
                .filter(|m| m.model_name == admin.model_name)
                .count();
            assert_eq!(same_name, 1, "{} registered twice", admin.model_name);
        }
    }

    #[test]
    fn test_editable_fields_exclude_identifiers_and_timestamps() {
        for admin in REGISTRY {
            for field in admin.fields {
                assert!(
                    !AUTO_FIELDS.contains(field),
                    "{} exposes non-editable field {}",
                    admin.model_name,
                    field
                );
            }
            assert_eq!(admin.list_display.first(), Some(&"id"));
        }
    }

    #[test]
    fn test_lookup_and_urls() {
        let admin = get_model_admin("ListingImage").unwrap();
        assert_eq!(admin.model, AdminModel::ListingImage);
        assert_eq!(admin.url(), "/admin/marketplace/listingimage/");
        assert!(get_model_admin("widget").is_none());
    }

    #[test]
    fn test_dashboard() {
        let dashboard = dashboard();
        assert_eq!(dashboard.site_header, "Parsim Admin");
        assert_eq!(dashboard.index_title, "Admin Dashboard");
        let categories = dashboard
            .models
            .iter()
            .find(|m| m.model_name == "category")
            .unwrap();
        assert_eq!(categories.verbose_name_plural, "Categories");
    }
}
