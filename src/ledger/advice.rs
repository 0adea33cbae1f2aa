//! AI advice on an account's books, from a generative-text HTTP endpoint.
//!
//! One POST per request and no retry. Whatever goes wrong, the caller gets
//! [`FALLBACK`] instead of an error.

use std::{fmt::Write, time::Duration};

use axum::{debug_handler, extract::State, response::{IntoResponse, Response}};
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::{accounts::active_account, store::DocStore, AppResult, AppState, Config, GetField, Markdown};

use super::{entries, summarize, EntryKind, LedgerEntry};

pub const FALLBACK: &str = "Advice is not available right now. Please try again later.";

const RECENT_ENTRIES: usize = 10;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct Advisor {
    http_client: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
}

impl Advisor {
    pub fn from_config(config: &Config) -> AppResult<Advisor> {
        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Advisor {
            http_client,
            url: config.advisor_url.clone(),
            api_key: config.advisor_api_key.clone(),
        })
    }

    /// Free-text answer to `prompt`, or [`FALLBACK`].
    pub async fn advise(&self, prompt: &str) -> String {
        let Some(url) = &self.url else {
            tracing::debug!("no advisor configured");
            return FALLBACK.to_owned();
        };

        match self.generate(url, prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("advisor returned no text");
                FALLBACK.to_owned()
            }
            Err(err) => {
                tracing::warn!(error = %err.0, "advisor request failed");
                FALLBACK.to_owned()
            }
        }
    }

    async fn generate(&self, url: &str, prompt: &str) -> AppResult<String> {
        let mut request = self.http_client.post(url).json(&GenerateRequest {
            contents: [Content { parts: [Part { text: prompt }] }],
        });
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        extract_text(&body)
    }
}

/// Text of the first part of the first candidate.
fn extract_text(body: &Value) -> AppResult<String> {
    body.pointer("/candidates/0/content/parts/0")
        .ok_or(format!("no candidate text in {body}"))?
        .get_str_field("text")
}

fn rupiah(amount: i64) -> String {
    format!("Rp {amount}")
}

/// Prompt describing the books: totals and the most recent entries.
pub fn advice_prompt(store_name: &str, entries: &[LedgerEntry]) -> String {
    let summary = summarize(entries);
    let mut prompt = format!(
        "You are a financial advisor for a small business called \"{store_name}\". \
         Total income: {}. Total expenses: {}. Balance: {}.\n",
        rupiah(summary.income),
        rupiah(summary.expense),
        rupiah(summary.balance),
    );

    if !entries.is_empty() {
        prompt.push_str("Recent transactions:\n");
        for entry in entries.iter().take(RECENT_ENTRIES) {
            let kind = match entry.kind {
                EntryKind::Income => "income",
                EntryKind::Expense => "expense",
            };
            let _ = writeln!(prompt, "- {} {kind} {}: {}", entry.date, rupiah(entry.amount), entry.description);
        }
    }

    prompt.push_str("Give three short, practical tips to improve this business's finances, in Markdown.");
    prompt
}

#[debug_handler(state = AppState)]
pub(crate) async fn advice(
    State(store): State<DocStore>,
    State(advisor): State<Advisor>,
    session: Session,
) -> AppResult<Response> {
    let (identity, account) = active_account(&store, &session).await?;
    let entries = entries(&store, &identity, &account).await?;

    let store_name = account.store_name.as_deref().unwrap_or(&account.name);
    let text = advisor.advise(&advice_prompt(store_name, &entries)).await;

    Ok(Markdown(text).into_response())
}
