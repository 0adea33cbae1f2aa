use axum::{debug_handler, http::StatusCode};
use tower_sessions::Session;

use crate::AppResult;

#[debug_handler]
pub(crate) async fn signout(session: Session) -> AppResult<StatusCode> {
    if let Some(identity) = super::current(&session).await? {
        tracing::info!(uid = %identity.uid, "signed out");
    }
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}
