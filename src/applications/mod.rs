//! Applications from seekers to jobs, and the business's review of them.
//!
//! Status only ever moves from `pending` to `accepted` or `rejected`; both are
//! terminal.

mod apply;
mod feed;
mod review;

use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use crate::{store::DocStore, AppState};

pub(crate) use apply::apply_handler;
pub use apply::apply;
pub use feed::{applications_for, subscribe_applications};
pub use review::{review_application, Decision};

pub(crate) const APPLICATIONS: &str = "applications";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::list_applications))
        .route("/ws", get(feed::applications_ws))
        .route("/{application_id}/review", post(review::review))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        use ApplicationStatus::*;
        match self {
            Pending => "pending",
            Accepted => "accepted",
            Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != ApplicationStatus::Pending
    }

    pub fn can_become(&self, next: ApplicationStatus) -> bool {
        *self == ApplicationStatus::Pending && next.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: String,
    pub job_id: String,
    /// Copied from the job when applying.
    pub job_title: String,
    pub umkm_id: String,
    pub seeker_id: String,
    pub seeker_name: String,
    pub cv_text: String,
    pub status: ApplicationStatus,
    pub created_at: i64,
}

pub(crate) fn applications_path(store: &DocStore) -> String {
    store.public(APPLICATIONS)
}

pub(crate) fn application_path(store: &DocStore, application_id: &str) -> String {
    format!("{}/{application_id}", applications_path(store))
}
