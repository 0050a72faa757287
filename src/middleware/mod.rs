/// Custom middleware: bearer-token authentication, admin role gating and
/// request logging.
mod admin;
mod auth;
mod request_logger;

pub use admin::AdminMiddleware;
pub use auth::AuthMiddleware;
pub use request_logger::RequestLogger;
