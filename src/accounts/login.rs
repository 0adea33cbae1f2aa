use axum::{debug_handler, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::{self, Identity}, store::DocStore, AppResult, AppState, DomainError};

use super::{account_path, accounts_path, Account, AccountView, AUTH_SESSION};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSession {
    account_id: String,
}

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    email: String,
    password: String,
}

fn session_path(store: &DocStore, identity: &Identity) -> String {
    store.private(&identity.uid, AUTH_SESSION)
}

/// Points the identity's "remember me" session at `account_id`.
pub(crate) async fn remember(store: &DocStore, identity: &Identity, account_id: &str) -> AppResult<()> {
    store
        .set(&session_path(store, identity), &AuthSession { account_id: account_id.to_owned() })
        .await?;
    Ok(())
}

pub async fn login(store: &DocStore, identity: &Identity, email: &str, password: &str) -> AppResult<Account> {
    let email = email.trim();
    let mut accounts = store.list(&accounts_path(store, identity)).await?.into_iter();

    let account = loop {
        let Some(doc) = accounts.next() else {
            return Err(DomainError::invalid("email or password is incorrect").into());
        };
        let account: Account = doc.decode()?;
        if account.email.eq_ignore_ascii_case(email) && account.password == password {
            break account;
        }
    };

    remember(store, identity, &account.id).await?;
    tracing::info!(uid = %identity.uid, account_id = %account.id, "logged in");
    Ok(account)
}

/// The account the identity was last logged in as, if any.
pub async fn restore(store: &DocStore, identity: &Identity) -> AppResult<Option<Account>> {
    let Some(doc) = store.get(&session_path(store, identity)).await? else {
        return Ok(None);
    };
    let AuthSession { account_id } = doc.decode()?;

    match store.get(&account_path(store, identity, &account_id)).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => {
            tracing::warn!(uid = %identity.uid, %account_id, "session points at a missing account");
            Ok(None)
        }
    }
}

pub async fn logout(store: &DocStore, identity: &Identity) -> AppResult<()> {
    store.delete(&session_path(store, identity)).await?;
    tracing::info!(uid = %identity.uid, "logged out");
    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn login_account(
    State(store): State<DocStore>,
    session: Session,
    Json(LoginQuery { email, password }): Json<LoginQuery>,
) -> AppResult<Json<AccountView>> {
    let identity = auth::signed_in(&session).await?;
    let account = login(&store, &identity, &email, &password).await?;
    Ok(Json(account.into()))
}

#[debug_handler(state = AppState)]
pub(crate) async fn logout_account(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<StatusCode> {
    let identity = auth::signed_in(&session).await?;
    logout(&store, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler(state = AppState)]
pub(crate) async fn current_account(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<Json<Option<AccountView>>> {
    let identity = auth::signed_in(&session).await?;
    Ok(Json(restore(&store, &identity).await?.map(AccountView::from)))
}

#[cfg(test)]
mod tests {
    use crate::accounts::{register, testing::form, RegisterForm, Role};

    use super::*;

    #[tokio::test]
    async fn login_switches_the_remembered_account() {
        let store = DocStore::memory("test").await.unwrap();
        let identity = Identity::anonymous();

        let first = register(&store, &identity, form("Sari", "sari@example.com", Role::Umkm)).await.unwrap();
        let second = register(&store, &identity, form("Budi", "budi@example.com", Role::Seeker)).await.unwrap();
        assert_eq!(restore(&store, &identity).await.unwrap().unwrap().id, second.id);

        let account = login(&store, &identity, " SARI@example.com", "secret").await.unwrap();
        assert_eq!(account.id, first.id);
        assert_eq!(restore(&store, &identity).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn wrong_password_is_a_validation_failure() {
        let store = DocStore::memory("test").await.unwrap();
        let identity = Identity::anonymous();
        register(&store, &identity, form("Sari", "sari@example.com", Role::Umkm)).await.unwrap();

        let err = login(&store, &identity, "sari@example.com", "nope").await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Invalid(_))));
    }

    #[tokio::test]
    async fn password_is_kept_exactly_as_typed() {
        let store = DocStore::memory("test").await.unwrap();
        let identity = Identity::anonymous();
        let spaced = RegisterForm {
            password: " pass phrase ".to_owned(),
            ..form("Sari", "sari@example.com", Role::Umkm)
        };
        let account = register(&store, &identity, spaced).await.unwrap();

        let logged_in = login(&store, &identity, "sari@example.com", " pass phrase ").await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(login(&store, &identity, "sari@example.com", "pass phrase").await.is_err());
    }

    #[tokio::test]
    async fn accounts_are_private_to_their_identity() {
        let store = DocStore::memory("test").await.unwrap();
        let owner = Identity::anonymous();
        let stranger = Identity::anonymous();
        register(&store, &owner, form("Sari", "sari@example.com", Role::Umkm)).await.unwrap();

        assert!(login(&store, &stranger, "sari@example.com", "secret").await.is_err());
        assert_eq!(restore(&store, &stranger).await.unwrap(), None);
    }

    #[tokio::test]
    async fn logout_forgets_the_account() {
        let store = DocStore::memory("test").await.unwrap();
        let identity = Identity::anonymous();
        register(&store, &identity, form("Sari", "sari@example.com", Role::Umkm)).await.unwrap();

        logout(&store, &identity).await.unwrap();
        assert_eq!(restore(&store, &identity).await.unwrap(), None);
    }
}
