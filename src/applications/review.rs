use axum::{debug_handler, extract::{Path, State}, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{accounts::{active_account, Account}, store::DocStore, AppResult, AppState, DomainError};

use super::{application_path, Application, ApplicationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl From<Decision> for ApplicationStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => ApplicationStatus::Accepted,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ReviewQuery {
    decision: Decision,
}

#[derive(Serialize)]
struct StatusPatch {
    status: ApplicationStatus,
}

/// Records the business's verdict. The write only lands while the stored
/// status is still `pending`, so a verdict is never overwritten.
pub async fn review_application(
    store: &DocStore,
    business: &Account,
    application_id: &str,
    decision: Decision,
) -> AppResult<Application> {
    let path = application_path(store, application_id);
    let mut application: Application = store
        .get(&path)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("application {application_id}")))?
        .decode()?;

    if application.umkm_id != business.id {
        return Err(DomainError::forbidden("only the hiring business can review this application").into());
    }

    let next = ApplicationStatus::from(decision);
    if !application.status.can_become(next) {
        return Err(DomainError::AlreadyReviewed.into());
    }

    let pending = ApplicationStatus::Pending.as_str();
    if !store.update_if(&path, "status", pending, &StatusPatch { status: next }).await? {
        return Err(DomainError::AlreadyReviewed.into());
    }

    application.status = next;
    tracing::info!(%application_id, status = next.as_str(), "application reviewed");
    Ok(application)
}

#[debug_handler(state = AppState)]
pub(crate) async fn review(
    State(store): State<DocStore>,
    session: Session,
    Path(application_id): Path<String>,
    Json(ReviewQuery { decision }): Json<ReviewQuery>,
) -> AppResult<Json<Application>> {
    let (_, account) = active_account(&store, &session).await?;
    Ok(Json(review_application(&store, &account, &application_id, decision).await?))
}

#[cfg(test)]
mod tests {
    use crate::{
        accounts::{testing::signup, Role},
        applications::apply,
        jobs::{post_job, JobForm},
    };

    use super::*;

    async fn pending(store: &DocStore) -> (Account, Account, Application) {
        let (_, business) = signup(store, "Sari", Role::Umkm).await;
        let (_, seeker) = signup(store, "Budi", Role::Seeker).await;
        let job = post_job(store, &business, JobForm { title: "Barista".into(), ..JobForm::default() })
            .await
            .unwrap();
        let application = apply(store, &seeker, &job.id, "Hello").await.unwrap().unwrap();
        (business, seeker, application)
    }

    async fn stored_status(store: &DocStore, id: &str) -> ApplicationStatus {
        let application: Application = store.get(&application_path(store, id)).await.unwrap().unwrap().decode().unwrap();
        application.status
    }

    #[tokio::test]
    async fn verdicts_are_terminal() {
        let store = DocStore::memory("test").await.unwrap();
        let (business, _, application) = pending(&store).await;

        let reviewed = review_application(&store, &business, &application.id, Decision::Accept).await.unwrap();
        assert_eq!(reviewed.status, ApplicationStatus::Accepted);

        for decision in [Decision::Reject, Decision::Accept] {
            let err = review_application(&store, &business, &application.id, decision).await.unwrap_err();
            assert_eq!(err.domain(), Some(&DomainError::AlreadyReviewed));
        }
        assert_eq!(stored_status(&store, &application.id).await, ApplicationStatus::Accepted);
    }

    #[tokio::test]
    async fn only_the_hiring_business_reviews() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, seeker, application) = pending(&store).await;
        let (_, rival) = signup(&store, "Tono", Role::Umkm).await;

        for reviewer in [&seeker, &rival] {
            let err = review_application(&store, reviewer, &application.id, Decision::Reject).await.unwrap_err();
            assert!(matches!(err.domain(), Some(DomainError::Forbidden(_))));
        }
        assert_eq!(stored_status(&store, &application.id).await, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn stale_read_cannot_overwrite_a_verdict() {
        let store = DocStore::memory("test").await.unwrap();
        let (business, _, application) = pending(&store).await;

        // another reviewer got there between our read and our write
        let path = application_path(&store, &application.id);
        assert!(store
            .update_if(&path, "status", "pending", &StatusPatch { status: ApplicationStatus::Rejected })
            .await
            .unwrap());
        assert!(!store
            .update_if(&path, "status", "pending", &StatusPatch { status: ApplicationStatus::Accepted })
            .await
            .unwrap());

        let err = review_application(&store, &business, &application.id, Decision::Accept).await.unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::AlreadyReviewed));
        assert_eq!(stored_status(&store, &application.id).await, ApplicationStatus::Rejected);
    }

    #[test]
    fn decisions_deserialize_from_verbs() {
        let query: ReviewQuery = serde_json::from_str(r#"{"decision":"reject"}"#).unwrap();
        assert_eq!(query.decision, Decision::Reject);
    }
}
