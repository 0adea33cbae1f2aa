use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::Identity, store::DocStore, AppResult, AppState, DomainError};

use super::{account_path, active_account, directory_path, required, Account, AccountView, DirectoryEntry};

/// Fields left out are kept as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
}

impl ProfileEdit {
    fn normalized(self, account: &Account) -> Result<ProfileEdit, DomainError> {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_owned());

        let name = match self.name {
            Some(name) => Some(required("name", &name)?.to_owned()),
            None => None,
        };
        let store_name = match self.store_name {
            Some(_) if !account.is_umkm() => {
                return Err(DomainError::invalid("only UMKM accounts have a store name"));
            }
            Some(store_name) => Some(required("store name", &store_name)?.to_owned()),
            None => None,
        };

        Ok(ProfileEdit {
            name,
            store_name,
            bio: trim(self.bio),
            location: trim(self.location),
            skills: trim(self.skills),
        })
    }
}

/// Applies `edit` to the account, then mirrors the result into the directory.
pub async fn update_profile(
    store: &DocStore,
    identity: &Identity,
    account: &Account,
    edit: ProfileEdit,
) -> AppResult<Account> {
    let edit = edit.normalized(account)?;
    let path = account_path(store, identity, &account.id);
    store.update(&path, &edit).await?;

    let updated: Account = store
        .get(&path)
        .await?
        .ok_or_else(|| DomainError::NotFound("account".to_owned()))?
        .decode()?;

    if let Err(err) = store.set(&directory_path(store, &updated.id), &DirectoryEntry::from(&updated)).await {
        tracing::warn!(account_id = %updated.id, error = %err, "directory entry left stale");
    }

    tracing::info!(account_id = %updated.id, "profile updated");
    Ok(updated)
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile(
    State(store): State<DocStore>,
    session: Session,
    Json(edit): Json<ProfileEdit>,
) -> AppResult<Json<AccountView>> {
    let (identity, account) = active_account(&store, &session).await?;
    let updated = update_profile(&store, &identity, &account, edit).await?;
    Ok(Json(updated.into()))
}
