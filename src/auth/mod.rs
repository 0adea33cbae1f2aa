//! Identity provider: binds an opaque, stable user id to the HTTP session.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use axum::{routing::{get, post}, Router};

use crate::{session::IDENTITY, AppResult, AppState, DomainError};

mod signin;
mod signout;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/anonymous", post(signin::anonymous))
        .route("/token", post(signin::token))
        .route("/signout", post(signout::signout))
        .route("/me", get(signin::me))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub alias: String,
    pub anonymous: bool,
}

impl Identity {
    pub fn anonymous() -> Identity {
        Identity {
            uid: Uuid::now_v7().simple().to_string(),
            alias: random_alias(),
            anonymous: true,
        }
    }

    /// The token itself is the identity: the issuer already vouched for it.
    pub fn from_token(token: &str) -> AppResult<Identity> {
        let uid = token.trim();
        if uid.is_empty() || uid.contains('/') {
            return Err(DomainError::invalid("sign-in token is empty or malformed").into());
        }

        Ok(Identity {
            uid: uid.to_owned(),
            alias: random_alias(),
            anonymous: false,
        })
    }
}

fn random_alias() -> String {
    let adjectives = [
        "Quick", "Brave", "Clever", "Gentle", "Bold", "Bright", "Eager", "Happy",
        "Jolly", "Lucky", "Calm", "Witty", "Golden", "Silver", "Proud", "Kind",
    ];
    let nouns = [
        "Fox", "Eagle", "Tiger", "Owl", "Falcon", "Panda", "Turtle", "Dolphin",
        "Elephant", "Rabbit", "Hawk", "Lion", "Bear", "Whale", "Phoenix", "Otter",
    ];

    let mut rng = rand::rng();
    format!(
        "{} {}",
        adjectives.choose(&mut rng).copied().unwrap_or("Quiet"),
        nouns.choose(&mut rng).copied().unwrap_or("Guest"),
    )
}

pub async fn current(session: &Session) -> AppResult<Option<Identity>> {
    Ok(session.get::<Identity>(IDENTITY).await?)
}

pub async fn signed_in(session: &Session) -> AppResult<Identity> {
    current(session).await?.ok_or(DomainError::SignedOut.into())
}
