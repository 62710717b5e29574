//! Request extractors.

pub mod user;

pub use user::{AuthUser, USER_ID_HEADER, USER_ROLE_HEADER};
