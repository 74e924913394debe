//! Storage-independent rules for the Parsim marketplace.
//!
//! Nothing in here talks to the database; the server crate runs these checks
//! before any row is written.

pub mod password;
pub mod slug;
pub mod username;
pub mod validation;

pub use validation::FieldErrors;
