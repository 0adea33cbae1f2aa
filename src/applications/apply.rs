use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    accounts::{active_account, Account, Role},
    jobs::get_job,
    now_millis,
    store::DocStore,
    AppResult, AppState, DomainError,
};

use super::{applications_path, Application, ApplicationStatus};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyQuery {
    cv_text: String,
}

/// Files a pending application from `seeker` to the job. A blank CV sends
/// nothing and yields `None`. Applying twice to the same job is allowed.
pub async fn apply(store: &DocStore, seeker: &Account, job_id: &str, cv_text: &str) -> AppResult<Option<Application>> {
    if seeker.role != Role::Seeker {
        return Err(DomainError::forbidden("only job seekers can apply").into());
    }
    if cv_text.trim().is_empty() {
        return Ok(None);
    }

    let job = get_job(store, job_id).await?;
    if !job.is_open() {
        return Err(DomainError::invalid("this job is no longer open").into());
    }

    let mut application = Application {
        id: String::new(),
        job_id: job.id,
        job_title: job.title,
        umkm_id: job.umkm_id,
        seeker_id: seeker.id.clone(),
        seeker_name: seeker.name.clone(),
        cv_text: cv_text.to_owned(),
        status: ApplicationStatus::Pending,
        created_at: now_millis(),
    };
    application.id = store.add(&applications_path(store), &application).await?;

    tracing::info!(application_id = %application.id, job_id = %application.job_id, seeker_id = %application.seeker_id, "application filed");
    Ok(Some(application))
}

#[debug_handler(state = AppState)]
pub(crate) async fn apply_handler(
    State(store): State<DocStore>,
    session: Session,
    Path(job_id): Path<String>,
    Json(ApplyQuery { cv_text }): Json<ApplyQuery>,
) -> AppResult<Response> {
    let (_, account) = active_account(&store, &session).await?;

    Ok(match apply(&store, &account, &job_id, &cv_text).await? {
        Some(application) => (StatusCode::CREATED, Json(application)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        accounts::testing::signup,
        applications::applications_path,
        jobs::{close_job, post_job, JobForm},
    };

    use super::*;

    async fn open_job(store: &DocStore) -> (Account, String) {
        let (_, business) = signup(store, "Sari", Role::Umkm).await;
        let form = JobForm { title: "Barista".into(), location: "Tebet".into(), ..JobForm::default() };
        let job = post_job(store, &business, form).await.unwrap();
        (business, job.id)
    }

    #[tokio::test]
    async fn application_starts_pending() {
        let store = DocStore::memory("test").await.unwrap();
        let (business, job_id) = open_job(&store).await;
        let (_, seeker) = signup(&store, "Budi", Role::Seeker).await;

        let application = apply(&store, &seeker, &job_id, "Hello").await.unwrap().unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.umkm_id, business.id);
        assert_eq!(application.job_title, "Barista");
        assert_eq!(application.seeker_name, "Budi");
    }

    #[tokio::test]
    async fn blank_cv_creates_nothing() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, job_id) = open_job(&store).await;
        let (_, seeker) = signup(&store, "Budi", Role::Seeker).await;

        for blank in ["", "  ", "\n"] {
            assert_eq!(apply(&store, &seeker, &job_id, blank).await.unwrap(), None);
        }
        assert!(store.list(&applications_path(&store)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_applications_are_kept() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, job_id) = open_job(&store).await;
        let (_, seeker) = signup(&store, "Budi", Role::Seeker).await;

        apply(&store, &seeker, &job_id, "Hello").await.unwrap().unwrap();
        apply(&store, &seeker, &job_id, "Hello again").await.unwrap().unwrap();
        assert_eq!(store.list(&applications_path(&store)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn closed_jobs_and_businesses_cannot_take_applications() {
        let store = DocStore::memory("test").await.unwrap();
        let (business, job_id) = open_job(&store).await;
        let (_, seeker) = signup(&store, "Budi", Role::Seeker).await;

        let err = apply(&store, &business, &job_id, "Hello").await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Forbidden(_))));

        close_job(&store, &business, &job_id).await.unwrap();
        let err = apply(&store, &seeker, &job_id, "Hello").await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Invalid(_))));
    }
}
