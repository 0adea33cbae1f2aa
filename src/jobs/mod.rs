//! Job postings and the live open-jobs feed.

mod feed;
mod post;

use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use crate::{store::DocStore, AppState};

pub use feed::{matches_query, open_jobs, search_jobs, subscribe_open_jobs};
pub use post::{close_job, get_job, post_job, JobForm};

pub(crate) const JOBS: &str = "jobs";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::list_jobs).post(post::new_job))
        .route("/ws", get(feed::jobs_ws))
        .route("/{job_id}/close", post(post::close))
        .route("/{job_id}/apply", post(crate::applications::apply_handler))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub umkm_id: String,
    /// Copied from the business account when the job is posted, never refreshed.
    pub store_name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub location: String,
    /// Free text, e.g. "Rp 3.000.000 / bulan".
    #[serde(default)]
    pub salary: String,
    pub status: JobStatus,
    pub created_at: i64,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }
}

pub(crate) fn jobs_path(store: &DocStore) -> String {
    store.public(JOBS)
}

pub(crate) fn job_path(store: &DocStore, job_id: &str) -> String {
    format!("{}/{job_id}", jobs_path(store))
}
