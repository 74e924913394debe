pub mod category;
pub mod listing;
pub mod listing_image;
pub mod message;
pub mod notification;
pub mod review;
pub mod user;

pub use category::Entity as Category;
pub use listing::Entity as Listing;
pub use listing_image::Entity as ListingImage;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use review::Entity as Review;
pub use user::Entity as User;
