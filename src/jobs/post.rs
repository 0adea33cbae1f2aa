use axum::{debug_handler, extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    accounts::{active_account, required, Account},
    now_millis,
    store::DocStore,
    AppResult, AppState, DomainError,
};

use super::{job_path, jobs_path, Job, JobStatus};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
}

#[derive(Serialize)]
struct StatusPatch {
    status: JobStatus,
}

/// Publishes a new open job for `business`.
pub async fn post_job(store: &DocStore, business: &Account, form: JobForm) -> AppResult<Job> {
    if !business.is_umkm() {
        return Err(DomainError::forbidden("only UMKM accounts can post jobs").into());
    }
    let title = required("title", &form.title)?;

    let mut job = Job {
        id: String::new(),
        umkm_id: business.id.clone(),
        store_name: business.store_name.clone().unwrap_or_else(|| business.name.clone()),
        title: title.to_owned(),
        description: form.description.trim().to_owned(),
        requirements: form.requirements.trim().to_owned(),
        location: form.location.trim().to_owned(),
        salary: form.salary.trim().to_owned(),
        status: JobStatus::Open,
        created_at: now_millis(),
    };
    job.id = store.add(&jobs_path(store), &job).await?;

    tracing::info!(job_id = %job.id, umkm_id = %job.umkm_id, "job posted");
    Ok(job)
}

pub async fn get_job(store: &DocStore, job_id: &str) -> AppResult<Job> {
    let doc = store
        .get(&job_path(store, job_id))
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("job {job_id}")))?;
    Ok(doc.decode()?)
}

/// Takes the job off the open feed. Only its owner may close it.
pub async fn close_job(store: &DocStore, business: &Account, job_id: &str) -> AppResult<Job> {
    let mut job = get_job(store, job_id).await?;
    if job.umkm_id != business.id {
        return Err(DomainError::forbidden("only the posting business can close this job").into());
    }

    if job.is_open() {
        store
            .update(&job_path(store, job_id), &StatusPatch { status: JobStatus::Closed })
            .await?;
        job.status = JobStatus::Closed;
        tracing::info!(%job_id, "job closed");
    }
    Ok(job)
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_job(
    State(store): State<DocStore>,
    session: Session,
    Json(form): Json<JobForm>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let (_, account) = active_account(&store, &session).await?;
    let job = post_job(&store, &account, form).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn close(
    State(store): State<DocStore>,
    session: Session,
    Path(job_id): Path<String>,
) -> AppResult<Json<Job>> {
    let (_, account) = active_account(&store, &session).await?;
    Ok(Json(close_job(&store, &account, &job_id).await?))
}
