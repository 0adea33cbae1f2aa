use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{store::{decode_all, DocStore}, AppResult, AppState};

use super::{active_account, Account, Role, DIRECTORY};

/// Public projection of an [`Account`], visible to every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub location: String,
}

impl From<&Account> for DirectoryEntry {
    fn from(account: &Account) -> Self {
        DirectoryEntry {
            id: account.id.clone(),
            name: account.name.clone(),
            role: account.role,
            store_name: account.store_name.clone(),
            skills: account.skills.clone(),
            location: account.location.clone(),
        }
    }
}

/// The counterparts `account` can open a chat with: everyone of the other role.
pub async fn contacts(store: &DocStore, account: &Account) -> AppResult<Vec<DirectoryEntry>> {
    let mut entries: Vec<DirectoryEntry> = decode_all(store.list(&store.public(DIRECTORY)).await?)?;
    entries.retain(|entry| entry.id != account.id && entry.role != account.role);
    entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(entries)
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_contacts(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<Json<Vec<DirectoryEntry>>> {
    let (_, account) = active_account(&store, &session).await?;
    Ok(Json(contacts(&store, &account).await?))
}
