use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use todo_api::auth::{PostgresRefreshTokenStore, TokenService};
use todo_api::configuration::get_configuration;
use todo_api::email_client::{EmailClient, SenderEmail};
use todo_api::startup::run;
use todo_api::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to read configuration");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "configuration error",
            ));
        }
    };

    let tokens = match TokenService::from_settings(&configuration.tokens) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!(error = %e, "invalid token configuration");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "token configuration error",
            ));
        }
    };

    let sender = match SenderEmail::parse(configuration.email.sender.clone()) {
        Ok(sender) => sender,
        Err(e) => {
            tracing::error!(error = %e, "invalid sender email");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "email configuration error",
            ));
        }
    };
    let email_client = EmailClient::new(&configuration.email, sender);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to create connection pool");
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "database connection error",
            )
        })?;

    let store = Arc::new(PostgresRefreshTokenStore::new(pool.clone()));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, "server listening");

    run(
        listener,
        pool,
        store,
        tokens,
        email_client,
        configuration.cookies,
    )?
    .await
}
