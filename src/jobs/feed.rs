use axum::{debug_handler, extract::{Query, State, WebSocketUpgrade}, response::Response, Json};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{auth, live, store::{decode_all, DocStore, Document, StoreResult}, AppResult, AppState};

use super::{jobs_path, Job};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Case-insensitive substring match on title, store name or location.
/// A blank query matches everything.
pub fn matches_query(job: &Job, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    [&job.title, &job.store_name, &job.location]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

/// Open jobs of a snapshot that match `query`, in snapshot order.
pub fn open_jobs(docs: Vec<Document>, query: &str) -> StoreResult<Vec<Job>> {
    let mut jobs: Vec<Job> = decode_all(docs)?;
    jobs.retain(|job| job.is_open() && matches_query(job, query));
    Ok(jobs)
}

pub async fn search_jobs(store: &DocStore, query: &str) -> AppResult<Vec<Job>> {
    Ok(open_jobs(store.list(&jobs_path(store)).await?, query)?)
}

/// Live open-jobs feed narrowed by `query`, re-filtered on every snapshot.
pub fn subscribe_open_jobs(store: &DocStore, query: String) -> impl Stream<Item = StoreResult<Vec<Job>>> + Send + 'static {
    store
        .subscribe(&jobs_path(store))
        .map(move |snapshot| snapshot.and_then(|docs| open_jobs(docs, &query)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_jobs(
    State(store): State<DocStore>,
    session: Session,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Json<Vec<Job>>> {
    auth::signed_in(&session).await?;
    Ok(Json(search_jobs(&store, &q).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn jobs_ws(
    State(store): State<DocStore>,
    session: Session,
    Query(SearchQuery { q }): Query<SearchQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    auth::signed_in(&session).await?;
    let feed = subscribe_open_jobs(&store, q);
    Ok(ws.on_upgrade(move |socket| live::serve_feed(socket, feed)))
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use crate::{
        accounts::{testing::signup, Role},
        jobs::{close_job, post_job, JobForm, JobStatus},
    };

    use super::*;

    fn job(title: &str, store_name: &str, location: &str) -> Job {
        Job {
            id: "j1".into(),
            umkm_id: "b1".into(),
            store_name: store_name.into(),
            title: title.into(),
            description: String::new(),
            requirements: String::new(),
            location: location.into(),
            salary: String::new(),
            status: JobStatus::Open,
            created_at: 0,
        }
    }

    #[test]
    fn query_matches_title_store_and_location() {
        let barista = job("Barista", "Kopi Sari", "Tebet");
        assert!(matches_query(&barista, "tebet"));
        assert!(matches_query(&barista, "BARI"));
        assert!(matches_query(&barista, "kopi"));
        assert!(matches_query(&barista, "  "));
        assert!(!matches_query(&barista, "Jakarta"));
        assert!(!matches_query(&barista, "kasir"));
    }

    #[tokio::test]
    async fn search_finds_barista_in_tebet_only() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, business) = signup(&store, "Sari", Role::Umkm).await;
        let form = JobForm { title: "Barista".into(), location: "Tebet".into(), ..JobForm::default() };
        let posted = post_job(&store, &business, form).await.unwrap();

        assert_eq!(search_jobs(&store, "Tebet").await.unwrap(), vec![posted]);
        assert!(search_jobs(&store, "Jakarta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_jobs_leave_the_live_feed() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, business) = signup(&store, "Sari", Role::Umkm).await;
        let mut feed = pin!(subscribe_open_jobs(&store, String::new()));
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        let form = JobForm { title: "Kasir".into(), ..JobForm::default() };
        let job = post_job(&store, &business, form).await.unwrap();
        assert_eq!(feed.next().await.unwrap().unwrap(), vec![job.clone()]);

        close_job(&store, &business, &job.id).await.unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_feed_applies_the_search_to_each_snapshot() {
        let store = DocStore::memory("test").await.unwrap();
        let (_, business) = signup(&store, "Sari", Role::Umkm).await;
        let mut feed = pin!(subscribe_open_jobs(&store, "tebet".into()));
        feed.next().await.unwrap().unwrap();

        let elsewhere = JobForm { title: "Kurir".into(), location: "Depok".into(), ..JobForm::default() };
        post_job(&store, &business, elsewhere).await.unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        let nearby = JobForm { title: "Barista".into(), location: "Tebet".into(), ..JobForm::default() };
        let barista = post_job(&store, &business, nearby).await.unwrap();
        assert_eq!(feed.next().await.unwrap().unwrap(), vec![barista]);
    }
}
