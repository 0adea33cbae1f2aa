use axum::{debug_handler, extract::{Query, State}, http::StatusCode, Json};
use serde::Deserialize;
use time::{macros::format_description, Date, OffsetDateTime};
use tower_sessions::Session;

use crate::{
    accounts::{active_account, required, Account},
    auth::Identity,
    now_millis,
    store::{decode_all, DocStore},
    AppResult, AppState, DomainError,
};

use super::{profit_margin, sort_entries, summarize, EntryKind, LedgerEntry, Margin, Summary};

#[derive(Debug, Clone, Deserialize)]
pub struct EntryForm {
    pub kind: EntryKind,
    pub amount: i64,
    pub description: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct MarginQuery {
    cost: i64,
    price: i64,
}

fn ledger_path(store: &DocStore, identity: &Identity, account: &Account) -> String {
    store.private(&identity.uid, &format!("ledger_{}", account.id))
}

fn parse_date(date: Option<&str>) -> Result<String, DomainError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(OffsetDateTime::now_utc().date().to_string()),
        Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map(|date| date.to_string())
            .map_err(|_| DomainError::invalid(format!("date must look like 2024-05-31, got {raw:?}"))),
    }
}

pub async fn add_entry(store: &DocStore, identity: &Identity, account: &Account, form: EntryForm) -> AppResult<LedgerEntry> {
    let description = required("description", &form.description)?;
    if form.amount <= 0 {
        return Err(DomainError::invalid("amount must be greater than zero").into());
    }

    let mut entry = LedgerEntry {
        id: String::new(),
        kind: form.kind,
        amount: form.amount,
        description: description.to_owned(),
        date: parse_date(form.date.as_deref())?,
        created_at: now_millis(),
    };
    entry.id = store.add(&ledger_path(store, identity, account), &entry).await?;

    tracing::debug!(account_id = %account.id, entry_id = %entry.id, kind = ?entry.kind, "ledger entry added");
    Ok(entry)
}

/// All entries of the account, newest first.
pub async fn entries(store: &DocStore, identity: &Identity, account: &Account) -> AppResult<Vec<LedgerEntry>> {
    let mut entries: Vec<LedgerEntry> = decode_all(store.list(&ledger_path(store, identity, account)).await?)?;
    sort_entries(&mut entries);
    Ok(entries)
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let (identity, account) = active_account(&store, &session).await?;
    Ok(Json(entries(&store, &identity, &account).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn add(
    State(store): State<DocStore>,
    session: Session,
    Json(form): Json<EntryForm>,
) -> AppResult<(StatusCode, Json<LedgerEntry>)> {
    let (identity, account) = active_account(&store, &session).await?;
    let entry = add_entry(&store, &identity, &account, form).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn summary(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<Json<Summary>> {
    let (identity, account) = active_account(&store, &session).await?;
    Ok(Json(summarize(&entries(&store, &identity, &account).await?)))
}

#[debug_handler]
pub(crate) async fn margin(Query(MarginQuery { cost, price }): Query<MarginQuery>) -> Json<Margin> {
    Json(profit_margin(cost, price))
}
