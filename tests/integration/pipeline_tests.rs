//! Full pipeline runs: intake, scheduling, analysis, persistence, events

use crate::common::{analyzer, FIXTURE_PAGE};
use serde_json::Value;
use sitelens::config::PipelineSettings;
use sitelens::hub::{ChannelSubscriber, Hub, Subscriber};
use sitelens::pipeline::{build_scheduler, Intake, Scheduler};
use sitelens::storage::{MemoryStore, SqliteStore, Store};
use sitelens::{PageAnalyzer, Status};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    store: Arc<dyn Store>,
    intake: Intake,
    scheduler: Scheduler,
    events: Receiver<Arc<str>>,
}

async fn harness(store: Arc<dyn Store>, settings: PipelineSettings) -> Harness {
    let hub = Arc::new(Hub::new());
    let (subscriber, events) = ChannelSubscriber::channel(64);
    hub.register(subscriber as Arc<dyn Subscriber>).await;

    let analyzer: Arc<dyn PageAnalyzer> = Arc::new(analyzer());
    let scheduler = build_scheduler(&settings, Arc::clone(&store), Arc::clone(&hub), analyzer);
    let intake = Intake::new(Arc::clone(&store), hub);

    Harness {
        store,
        intake,
        scheduler,
        events,
    }
}

fn settings(timeout: Duration, pool_size: usize) -> PipelineSettings {
    PipelineSettings {
        poll_interval: Duration::from_millis(50),
        task_timeout: timeout,
        pool_size,
    }
}

/// Collects every event currently buffered
fn drain(events: &mut Receiver<Arc<str>>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(raw) = events.try_recv() {
        out.push(serde_json::from_str(&raw).expect("Event is not JSON"));
    }
    out
}

async fn mount_page(server: &MockServer, route: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FIXTURE_PAGE)
                .insert_header("content-type", "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fixture_page_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/page", Duration::ZERO).await;

    let mut h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5), 1),
    )
    .await;

    let item = h
        .intake
        .submit(&format!("{}/page/", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(item.normalized_url, format!("{}/page", mock_server.uri()));

    h.scheduler.tick().await.unwrap().wait().await;

    let stored = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored.status, Status::Done);
    assert_eq!(stored.result.page_title, "Example");
    assert_eq!(stored.result.headings.h1, 1);
    assert_eq!(stored.result.external_links, 2);
    assert_eq!(stored.result.internal_links, 1);
    assert!(stored.result.has_login_form);
    assert_eq!(stored.error_code, 0);

    let events = drain(&mut h.events);
    let statuses: Vec<&str> = events
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["queued", "running", "done"]);

    assert_eq!(events[0]["normalizedURL"], stored.normalized_url.as_str());
    assert_eq!(events[2]["id"], item.id.as_str());
    assert_eq!(events[2]["pageTitle"], "Example");
    assert_eq!(events[2]["h1"], 1);
    assert_eq!(events[2]["externalLinks"], 2);
    assert_eq!(events[2]["hasLoginForm"], true);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/slow", Duration::from_secs(5)).await;

    let mut h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_millis(300), 1),
    )
    .await;

    let item = h
        .intake
        .submit(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap();

    let started = Instant::now();
    h.scheduler.tick().await.unwrap().wait().await;
    assert!(started.elapsed() < Duration::from_secs(3));

    let stored = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored.status, Status::Error);
    assert_eq!(stored.error_reason, "Timed out");
    assert_eq!(stored.error_code, 408);

    // The abandoned analysis never writes over the timeout
    tokio::time::sleep(Duration::from_millis(300)).await;
    let stored = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored.error_reason, "Timed out");

    let terminal: Vec<Value> = drain(&mut h.events)
        .into_iter()
        .filter(|e| e["status"] == "error")
        .collect();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0]["errorReason"], "Timed out");
    assert_eq!(terminal[0]["errorCode"], 408);
}

#[tokio::test]
async fn test_pool_bounds_concurrency() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/p", Duration::from_millis(200)).await;

    let h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5), 2),
    )
    .await;

    for n in 0..5 {
        h.intake
            .submit(&format!("{}/p?n={}", mock_server.uri(), n))
            .await
            .unwrap();
    }

    let started = Instant::now();
    let report = h.scheduler.tick().await.unwrap();
    assert_eq!(report.dispatched, 5);
    let reports = report.wait().await;

    // Five 200ms pages through two slots need at least three rounds
    assert!(started.elapsed() >= Duration::from_millis(600));
    assert_eq!(reports.len(), 5);
    assert_eq!(h.store.count_by_status(Status::Done).unwrap(), 5);
    assert_eq!(h.scheduler.dispatcher().available_slots(), 2);
}

#[tokio::test]
async fn test_retry_after_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", Duration::ZERO).await;

    let h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5), 1),
    )
    .await;

    let item = h
        .intake
        .submit(&format!("{}/flaky", mock_server.uri()))
        .await
        .unwrap();

    h.scheduler.tick().await.unwrap().wait().await;
    let failed = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(failed.status, Status::Error);
    assert_eq!(failed.error_reason, "unreachable: 500 Internal Server Error");
    assert_eq!(failed.error_code, 500);

    let requeued = h.intake.request_reanalysis(&item.id).await.unwrap();
    assert_eq!(requeued.status, Status::Queued);
    assert!(requeued.error_reason.is_empty());

    h.scheduler.tick().await.unwrap().wait().await;
    let done = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(done.status, Status::Done);
    assert_eq!(done.result.page_title, "Example");
    assert!(done.error_reason.is_empty());
    assert_eq!(done.error_code, 0);
}

#[tokio::test]
async fn test_reset_while_running_discards_stale_result() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/slow", Duration::from_millis(300)).await;

    let mut h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5), 1),
    )
    .await;

    let item = h
        .intake
        .submit(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap();

    let report = h.scheduler.tick().await.unwrap();
    h.intake.request_reanalysis(&item.id).await.unwrap();
    let reports = report.wait().await;
    assert!(!reports[0].recorded);

    let stored = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored.status, Status::Queued);
    assert!(stored.result.page_title.is_empty());

    let events = drain(&mut h.events);
    assert!(events.iter().all(|e| e["status"] != "done"));

    // The next pass picks it up again
    h.scheduler.tick().await.unwrap().wait().await;
    assert_eq!(
        h.store.get(&item.id).unwrap().unwrap().status,
        Status::Done
    );
}

#[tokio::test]
async fn test_delete_while_running_is_final() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/slow", Duration::from_millis(300)).await;

    let mut h = harness(
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5), 1),
    )
    .await;

    let item = h
        .intake
        .submit(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap();

    let report = h.scheduler.tick().await.unwrap();
    assert!(h.intake.delete(&item.id).await.unwrap());
    report.wait().await;

    assert!(h.store.get(&item.id).unwrap().is_none());

    let events = drain(&mut h.events);
    let last = events.last().unwrap();
    assert_eq!(last["status"], "deleted");
    assert_eq!(last["id"], item.id.as_str());
}

#[tokio::test]
async fn test_serve_loop_with_sqlite_store() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/page", Duration::ZERO).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sitelens.db");

    let id = {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&db_path).unwrap());
        let h = harness(store, settings(Duration::from_secs(5), 2)).await;
        let scheduler = Arc::new(h.scheduler);
        let shutdown = CancellationToken::new();

        let runner = {
            let scheduler = Arc::clone(&scheduler);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run(shutdown).await })
        };

        let item = h
            .intake
            .submit(&format!("{}/page", mock_server.uri()))
            .await
            .unwrap();

        let mut status = Status::Queued;
        for _ in 0..200 {
            status = h.store.get(&item.id).unwrap().unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status, Status::Done);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .unwrap()
            .unwrap();
        item.id
    };

    // Results survive reopening the database
    let reopened = SqliteStore::new(&db_path).unwrap();
    let stored = reopened.get(&id).unwrap().unwrap();
    assert_eq!(stored.status, Status::Done);
    assert_eq!(stored.result.page_title, "Example");
    assert_eq!(stored.result.external_links, 2);
    assert!(stored.result.has_login_form);
    assert_eq!(stored.attempt, 1);
}
