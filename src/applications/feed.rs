use axum::{debug_handler, extract::{State, WebSocketUpgrade}, response::Response, Json};
use futures_util::{Stream, StreamExt};
use tower_sessions::Session;

use crate::{
    accounts::{active_account, Account, Role},
    live,
    store::{decode_all, DocStore, Document, StoreResult},
    AppResult, AppState,
};

use super::{applications_path, Application};

/// A business sees the applications to its jobs, a seeker sees their own.
fn sees(application: &Application, viewer_id: &str, role: Role) -> bool {
    match role {
        Role::Umkm => application.umkm_id == viewer_id,
        Role::Seeker => application.seeker_id == viewer_id,
    }
}

fn filter_for(docs: Vec<Document>, viewer_id: &str, role: Role) -> StoreResult<Vec<Application>> {
    let mut applications: Vec<Application> = decode_all(docs)?;
    applications.retain(|application| sees(application, viewer_id, role));
    Ok(applications)
}

pub async fn applications_for(store: &DocStore, viewer: &Account) -> AppResult<Vec<Application>> {
    Ok(filter_for(store.list(&applications_path(store)).await?, &viewer.id, viewer.role)?)
}

/// Live applications visible to `viewer`, filtered again on every snapshot.
pub fn subscribe_applications(store: &DocStore, viewer: &Account) -> impl Stream<Item = StoreResult<Vec<Application>>> + Send + 'static {
    let viewer_id = viewer.id.clone();
    let role = viewer.role;
    store
        .subscribe(&applications_path(store))
        .map(move |snapshot| snapshot.and_then(|docs| filter_for(docs, &viewer_id, role)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_applications(
    State(store): State<DocStore>,
    session: Session,
) -> AppResult<Json<Vec<Application>>> {
    let (_, account) = active_account(&store, &session).await?;
    Ok(Json(applications_for(&store, &account).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn applications_ws(
    State(store): State<DocStore>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let (_, account) = active_account(&store, &session).await?;
    let feed = subscribe_applications(&store, &account);
    Ok(ws.on_upgrade(move |socket| live::serve_feed(socket, feed)))
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use crate::{
        accounts::testing::signup,
        applications::{apply, review_application, ApplicationStatus, Decision},
        jobs::{post_job, JobForm},
    };

    use super::*;

    #[tokio::test]
    async fn each_side_sees_only_its_applications() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, sari) = signup(&store, "Sari", Role::Umkm).await;
        let (_, tono) = signup(&store, "Tono", Role::Umkm).await;
        let (_, budi) = signup(&store, "Budi", Role::Seeker).await;
        let (_, rina) = signup(&store, "Rina", Role::Seeker).await;

        let sari_job = post_job(&store, &sari, JobForm { title: "Barista".into(), ..JobForm::default() }).await.unwrap();
        let tono_job = post_job(&store, &tono, JobForm { title: "Kurir".into(), ..JobForm::default() }).await.unwrap();
        apply(&store, &budi, &sari_job.id, "Hello").await.unwrap();
        apply(&store, &rina, &tono_job.id, "Halo").await.unwrap();

        let for_sari = applications_for(&store, &sari).await.unwrap();
        assert_eq!(for_sari.len(), 1);
        assert_eq!(for_sari[0].seeker_id, budi.id);

        let for_rina = applications_for(&store, &rina).await.unwrap();
        assert_eq!(for_rina.len(), 1);
        assert_eq!(for_rina[0].job_id, tono_job.id);
    }

    #[tokio::test]
    async fn accepted_status_survives_resubscription() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, business) = signup(&store, "Sari", Role::Umkm).await;
        let (_, seeker) = signup(&store, "Budi", Role::Seeker).await;
        let job = post_job(&store, &business, JobForm { title: "Barista".into(), ..JobForm::default() }).await.unwrap();

        let application = apply(&store, &seeker, &job.id, "Hello").await.unwrap().unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);

        {
            let mut seeker_feed = pin!(subscribe_applications(&store, &seeker));
            let first = seeker_feed.next().await.unwrap().unwrap();
            assert_eq!(first[0].status, ApplicationStatus::Pending);

            review_application(&store, &business, &application.id, Decision::Accept).await.unwrap();
            let second = seeker_feed.next().await.unwrap().unwrap();
            assert_eq!(second[0].status, ApplicationStatus::Accepted);
        }

        let mut reloaded = pin!(subscribe_applications(&store, &seeker));
        let snapshot = reloaded.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, ApplicationStatus::Accepted);
    }
}
