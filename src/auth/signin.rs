use axum::{debug_handler, Json};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{session::IDENTITY, AppResult};

use super::Identity;

#[derive(Deserialize)]
pub(crate) struct TokenQuery {
    pub(crate) token: String,
}

#[debug_handler]
pub(crate) async fn anonymous(session: Session) -> AppResult<Json<Identity>> {
    if let Some(identity) = super::current(&session).await? {
        return Ok(Json(identity));
    }

    let identity = Identity::anonymous();
    session.insert(IDENTITY, &identity).await?;
    tracing::info!(uid = %identity.uid, "anonymous sign-in");

    Ok(Json(identity))
}

#[debug_handler]
pub(crate) async fn token(
    session: Session,
    Json(TokenQuery { token }): Json<TokenQuery>,
) -> AppResult<Json<Identity>> {
    let identity = Identity::from_token(&token)?;

    session.cycle_id().await?;
    session.insert(IDENTITY, &identity).await?;
    tracing::info!(uid = %identity.uid, "token sign-in");

    Ok(Json(identity))
}

#[debug_handler]
pub(crate) async fn me(session: Session) -> AppResult<Json<Option<Identity>>> {
    Ok(Json(super::current(&session).await?))
}
