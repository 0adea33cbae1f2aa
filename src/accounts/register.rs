use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::{auth::{self, Identity}, store::DocStore, AppResult, AppState, DomainError};

use super::{accounts_path, directory_path, login::remember, required, Account, AccountView, DirectoryEntry, Role};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub skills: String,
}

pub async fn register(store: &DocStore, identity: &Identity, form: RegisterForm) -> AppResult<Account> {
    let name = required("name", &form.name)?;
    let email = required("email", &form.email)?;
    required("password", &form.password)?;

    let store_name = match form.role {
        Role::Umkm => Some(required("store name", form.store_name.as_deref().unwrap_or(""))?.to_owned()),
        Role::Seeker => None,
    };

    let accounts = accounts_path(store, identity);
    let taken = store
        .list(&accounts)
        .await?
        .iter()
        .filter_map(|doc| doc.data.get("email").and_then(Value::as_str))
        .any(|existing| existing.eq_ignore_ascii_case(email));
    if taken {
        return Err(DomainError::invalid("email is already registered").into());
    }

    let mut account = Account {
        id: String::new(),
        name: name.to_owned(),
        email: email.to_owned(),
        password: form.password.clone(),
        role: form.role,
        store_name,
        bio: form.bio.trim().to_owned(),
        location: form.location.trim().to_owned(),
        skills: form.skills.trim().to_owned(),
    };
    account.id = store.add(&accounts, &account).await?;

    if let Err(err) = store.set(&directory_path(store, &account.id), &DirectoryEntry::from(&account)).await {
        tracing::warn!(account_id = %account.id, error = %err, "directory entry not written");
    }

    remember(store, identity, &account.id).await?;
    tracing::info!(uid = %identity.uid, account_id = %account.id, role = ?account.role, "account registered");

    Ok(account)
}

#[debug_handler(state = AppState)]
pub(crate) async fn register_account(
    State(store): State<DocStore>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> AppResult<Json<AccountView>> {
    let identity = auth::signed_in(&session).await?;
    let account = register(&store, &identity, form).await?;
    Ok(Json(account.into()))
}
