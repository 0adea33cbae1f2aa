//! Registered accounts and their public directory projection.
//!
//! An [`Account`] is private to the system identity that registered it. Every
//! account has exactly one [`DirectoryEntry`] under the same id, written right
//! after the account on registration and profile edit. The two writes are
//! independent: if the second fails the directory stays stale until the next
//! successful edit.

mod directory;
mod login;
mod profile;
mod register;

use axum::{routing::{get, post, put}, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::{self, Identity}, store::DocStore, AppResult, AppState, DomainError};

pub use directory::{contacts, DirectoryEntry};
pub use login::{login, logout, restore};
pub use profile::{update_profile, ProfileEdit};
pub use register::{register, RegisterForm};

pub(crate) const ACCOUNTS: &str = "registered_accounts";
pub(crate) const AUTH_SESSION: &str = "auth_session/current";
pub(crate) const DIRECTORY: &str = "user_directory";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register_account))
        .route("/login", post(login::login_account))
        .route("/logout", post(login::logout_account))
        .route("/current", get(login::current_account))
        .route("/profile", put(profile::edit_profile))
}

pub fn directory_router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(directory::list_contacts))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Umkm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: String,
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
    /// Comma separated.
    #[serde(default)]
    pub skills: String,
}

impl Account {
    pub fn is_umkm(&self) -> bool {
        self.role == Role::Umkm
    }
}

/// What the account holder gets to see of their own record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub store_name: Option<String>,
    pub bio: String,
    pub location: String,
    pub skills: String,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        AccountView {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            store_name: account.store_name,
            bio: account.bio,
            location: account.location,
            skills: account.skills,
        }
    }
}

pub(crate) fn accounts_path(store: &DocStore, identity: &Identity) -> String {
    store.private(&identity.uid, ACCOUNTS)
}

pub(crate) fn account_path(store: &DocStore, identity: &Identity, account_id: &str) -> String {
    format!("{}/{account_id}", accounts_path(store, identity))
}

pub(crate) fn directory_path(store: &DocStore, account_id: &str) -> String {
    format!("{}/{account_id}", store.public(DIRECTORY))
}

/// Trimmed value of a required form field.
pub(crate) fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(value)
}

/// The signed-in identity together with its active account.
pub async fn active_account(store: &DocStore, session: &Session) -> AppResult<(Identity, Account)> {
    let identity = auth::signed_in(session).await?;
    let account = restore(store, &identity).await?.ok_or(DomainError::NoAccount)?;
    Ok((identity, account))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub(crate) fn form(name: &str, email: &str, role: Role) -> RegisterForm {
        RegisterForm {
            name: name.to_owned(),
            email: email.to_owned(),
            password: "secret".to_owned(),
            role,
            store_name: (role == Role::Umkm).then(|| format!("Toko {name}")),
            bio: String::new(),
            location: "Jakarta".to_owned(),
            skills: "kopi, kasir".to_owned(),
        }
    }

    /// Signs up a fresh identity with one account of the given role.
    pub(crate) async fn signup(store: &DocStore, name: &str, role: Role) -> (Identity, Account) {
        let identity = Identity::anonymous();
        let email = format!("{}@example.com", name.to_lowercase());
        let account = register(store, &identity, form(name, &email, role)).await.unwrap();
        (identity, account)
    }
}
