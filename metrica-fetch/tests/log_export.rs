//! Log-export polling against a mock server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSleeper, TOKEN, builder};
use metrica_core::{DateDimension, LogExportRequest, LogResource};
use metrica_fetch::{FetchError, LogExportClient, PollPolicy};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPORT_PATH: &str = "/logs/v1/export/events.csv";

fn events_request() -> LogExportRequest {
    LogExportRequest::new(
        LogResource::Events,
        1_234_567,
        "2024-01-01 00:00:00",
        "2024-01-01 23:59:59",
        "event_name, event_timestamp",
    )
}

#[tokio::test]
async fn test_polls_until_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(202).set_body_string("not ready"))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "event_name,event_timestamp\nopen,1704067200\nclose,1704067260\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let ctx = builder(&server, sleeper.clone()).build().unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let table = client.fetch_logs(&events_request(), None).await.unwrap();

    assert_eq!(table.columns, vec!["event_name", "event_timestamp"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[1], vec!["close", "1704067260"]);

    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(10); 3]);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_client_error_fails_without_waiting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Wrong parameter: 'fields'"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let ctx = builder(&server, sleeper.clone()).build().unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let err = client.fetch_logs(&events_request(), None).await.unwrap_err();

    match err {
        FetchError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Wrong parameter: 'fields'");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_server_error_after_pending() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let ctx = builder(&server, sleeper.clone()).build().unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let err = client.fetch_logs(&events_request(), None).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(sleeper.sleeps().len(), 1);
}

#[tokio::test]
async fn test_bounded_policy_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let ctx = builder(&server, sleeper.clone())
        .poll_policy(PollPolicy::new(Duration::from_secs(5)).with_max_attempts(3))
        .build()
        .unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let err = client.fetch_logs(&events_request(), None).await.unwrap_err();

    match err {
        FetchError::PollExhausted { attempts, waited } => {
            assert_eq!(attempts, 3);
            assert_eq!(waited, Duration::from_secs(10));
        }
        other => panic!("expected PollExhausted, got {other:?}"),
    }
    assert_eq!(sleeper.sleeps().len(), 2);
}

#[tokio::test]
async fn test_query_and_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs/v1/export/installations.csv"))
        .and(header("Authorization", "OAuth explicit-token"))
        .and(query_param("application_id", "42"))
        .and(query_param("date_since", "2024-02-01 00:00:00"))
        .and(query_param("date_until", "2024-02-02 00:00:00"))
        .and(query_param("date_dimension", "receive"))
        .and(query_param("fields", "install_datetime,device_id,os_name"))
        .respond_with(ResponseTemplate::new(200).set_body_string("install_datetime,device_id,os_name\n"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let ctx = builder(&server, sleeper).build().unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let request = LogExportRequest::new(
        LogResource::Installations,
        42,
        "2024-02-01 00:00:00",
        "2024-02-02 00:00:00",
        " install_datetime ,\n\tdevice_id,  os_name ",
    )
    .with_date_dimension(DateDimension::Receive);

    let table = client
        .fetch_logs(&request, Some("explicit-token"))
        .await
        .unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns.len(), 3);
}

#[tokio::test]
async fn test_cached_token_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .and(header("Authorization", format!("OAuth {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("event_name\n"))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = builder(&server, Arc::new(RecordingSleeper::default()))
        .build()
        .unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    client.fetch_logs(&events_request(), None).await.unwrap();
}

#[tokio::test]
async fn test_blank_field_list_is_sent_and_remote_error_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .and(query_param("fields", ""))
        .respond_with(ResponseTemplate::new(400).set_body_string("Wrong parameter: 'fields'"))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = builder(&server, Arc::new(RecordingSleeper::default()))
        .build()
        .unwrap();
    let client = LogExportClient::new(Arc::new(ctx));

    let request = LogExportRequest::new(
        LogResource::Events,
        1,
        "2024-01-01 00:00:00",
        "2024-01-02 00:00:00",
        "  \n ",
    );

    match client.fetch_logs(&request, None).await.unwrap_err() {
        FetchError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Wrong parameter: 'fields'");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_download_completes_without_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("event_name\napp_launch\n")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let ctx = builder(&server, Arc::new(RecordingSleeper::default()))
        .build()
        .unwrap();
    let table = LogExportClient::new(Arc::new(ctx))
        .fetch_logs(&events_request(), None)
        .await
        .unwrap();
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn test_opt_in_deadline_aborts_slow_download() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("event_name\napp_launch\n")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let ctx = builder(&server, Arc::new(RecordingSleeper::default()))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = LogExportClient::new(Arc::new(ctx))
        .fetch_logs(&events_request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(_)));
}
