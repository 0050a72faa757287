use actix_web::{web, App, HttpServer};
use actix_web::dev::Server;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{RefreshTokenStore, TokenService};
use crate::configuration::CookieSettings;
use crate::email_client::EmailClient;
use crate::middleware::{AdminMiddleware, AuthMiddleware, RequestLogger};
use crate::routes::{
    forgot_password, health_check, list_users, login, logout, me, refresh, reset_password,
    session, signup, verify_email,
};

pub fn run(
    listener: TcpListener,
    pool: PgPool,
    store: Arc<dyn RefreshTokenStore>,
    tokens: TokenService,
    email_client: EmailClient,
    cookies: CookieSettings,
) -> Result<Server, std::io::Error> {
    let pool = web::Data::new(pool);
    let store = web::Data::from(store);
    let tokens_data = web::Data::new(tokens.clone());
    let email_client = web::Data::new(email_client);
    let cookies = web::Data::new(cookies);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            // Shared state
            .app_data(pool.clone())
            .app_data(store.clone())
            .app_data(tokens_data.clone())
            .app_data(email_client.clone())
            .app_data(cookies.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            .route("/account/forgot-password", web::post().to(forgot_password))
            .route("/account/reset-password", web::post().to(reset_password))
            .route("/account/verify-email", web::get().to(verify_email))
            // Protected routes; the admin scope is additionally role-gated
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .route("/me", web::get().to(me))
                    .route("/session", web::get().to(session))
                    .service(
                        web::scope("/admin")
                            .wrap(AdminMiddleware)
                            .route("/users", web::get().to(list_users)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
