mod account;
mod auth;
mod health_check;

pub use account::{forgot_password, list_users, me, reset_password, session, verify_email};
pub use auth::{login, logout, refresh, signup};
pub use health_check::health_check;
