//! Session and authentication payload types

pub mod auth;
pub mod session;
pub mod user;

pub use auth::{LoginResponse, RefreshRequest, RefreshResponse};
pub use session::Session;
pub use user::User;
