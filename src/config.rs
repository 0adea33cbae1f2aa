use anyhow::Context;

pub const DEFAULT_APP_ID: &str = "umkm-karir-app";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_id: String,
    pub bind_addr: String,
    pub session_minutes: i64,
    pub advisor_url: Option<String>,
    pub advisor_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite::memory:".to_owned(),
            app_id: DEFAULT_APP_ID.to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            session_minutes: 60,
            advisor_url: None,
            advisor_api_key: None,
        }
    }
}

impl Config {
    /// Reads the environment, falling back to `.env` and then to the defaults.
    pub fn from_env() -> anyhow::Result<Config> {
        let defaults = Config::default();
        let var = |key: &str| dotenv::var(key).ok().filter(|v| !v.trim().is_empty());

        let session_minutes = match var("SESSION_MINUTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SESSION_MINUTES must be a number, got {raw:?}"))?,
            None => defaults.session_minutes,
        };

        Ok(Config {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            app_id: var("APP_ID").unwrap_or(defaults.app_id),
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_minutes,
            advisor_url: var("ADVISOR_URL"),
            advisor_api_key: var("ADVISOR_API_KEY"),
        })
    }
}
