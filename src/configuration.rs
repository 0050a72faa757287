use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub tokens: TokenSettings,
    pub cookies: CookieSettings,
    pub email: EmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// One secret/lifetime pair per token class. Every class gets an
/// independent secret so a token of one class never validates as another.
#[derive(serde::Deserialize, Clone)]
pub struct TokenClassSettings {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    pub access: TokenClassSettings,
    pub refresh: TokenClassSettings,
    pub verify_email: TokenClassSettings,
    pub reset_password: TokenClassSettings,
}

/// Cookie attributes that vary by deployment environment.
#[derive(serde::Deserialize, Clone)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    pub base_url: String,
    pub sender: String,
    pub link_base_url: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
