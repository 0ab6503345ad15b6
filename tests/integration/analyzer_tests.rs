//! HTTP analyzer against mock servers

use crate::common::{analyzer, FIXTURE_PAGE};
use sitelens::{AnalysisError, ErrorKind, PageAnalyzer};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_analyze_fixture_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FIXTURE_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());
    let result = analyzer()
        .analyze(&url, CancellationToken::new())
        .await
        .expect("Analysis failed");

    assert_eq!(result.page_title, "Example");
    assert_eq!(result.headings.h1, 1);
    assert_eq!(result.headings.h2, 0);
    assert_eq!(result.external_links, 2);
    assert_eq!(result.internal_links, 1);
    assert_eq!(result.inaccessible_links, 0);
    assert!(result.has_login_form);
    assert_eq!(result.html_version, "HTML5");
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let err = analyzer()
        .analyze(&url, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::HttpStatusFailure);
    assert_eq!(err.error_code(), 404);
    assert_eq!(err.to_string(), "unreachable: 404 Not Found");
}

#[tokio::test]
async fn test_connection_refused_is_fetch_failure() {
    // Bind then drop a listener so its port is closed
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let err = analyzer()
        .analyze(&format!("{}/", uri), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FetchFailure);
    assert_eq!(err.error_code(), 0);
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FIXTURE_PAGE)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let url = format!("{}/", mock_server.uri());
    let result = tokio::time::timeout(Duration::from_secs(3), analyzer().analyze(&url, cancel))
        .await
        .expect("Analyzer ignored cancellation");

    assert_eq!(result.unwrap_err(), AnalysisError::Cancelled);
}
