pub mod accounts;
pub mod applications;
pub mod appresult;
pub mod auth;
pub mod config;
pub mod jobs;
pub mod ledger;
pub mod live;
pub mod rooms;
pub mod session;
pub mod store;

use std::{ops::Deref, sync::Arc};

use axum::{extract::FromRef, response::{Html, IntoResponse}, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult, DomainError};
pub use config::Config;
pub use ledger::advice::Advisor;
pub use store::DocStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: DocStore,
    pub advisor: Advisor,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: DocStore, config: Config) -> AppResult<AppState> {
        let advisor = Advisor::from_config(&config)?;
        Ok(AppState {
            store,
            advisor,
            config: Arc::new(config),
        })
    }
}

/// Full application router with the session and CORS layers applied.
pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.session_minutes,
        )));

    Router::new()
        .nest("/auth", auth::router())
        .nest("/accounts", accounts::router())
        .nest("/directory", accounts::directory_router())
        .nest("/r", rooms::router())
        .nest("/jobs", jobs::router())
        .nest("/applications", applications::router())
        .nest("/ledger", ledger::router())
        .with_state(state)
        .layer(session_layer)
        .layer(CorsLayer::very_permissive())
}

/// Milliseconds since the unix epoch, the timestamp unit of every document.
pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }
}

pub struct Markdown<T>(pub T);

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>
{
    fn into_response(self) -> axum::response::Response {
        use pulldown_cmark::{Parser, Options};

        let parser = Parser::new_ext(&*self.0, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, parser);
        Html(html_output).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_field_reads_strings_only() {
        let body = json!({ "part": { "text": "hello" } });
        let part = &body["part"];
        assert_eq!(part.get_str_field("text").unwrap(), "hello");
        assert!(part.get_str_field("missing").is_err());
        assert!(body.get_str_field("part").is_err());
    }

    #[test]
    fn now_millis_is_after_2024() {
        assert!(now_millis() > 1_704_067_200_000);
    }
}
