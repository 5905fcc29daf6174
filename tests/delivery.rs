mod common;

use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use bwmon::{exporter::HttpExporter, DeliveryError, Point};
use common::spawn_database;
use poem::http::StatusCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

fn point() -> Point {
    let mut point = Point {
        measurement: "bandwidth".to_string(),
        time: 1000,
        tags: Default::default(),
        fields: Default::default(),
    };
    point.tags.insert("Hostname".into(), "h1".into());
    point.tags.insert("AppName".into(), "bwmon".into());
    point.fields.insert("mean".into(), "20".into());
    point
}

async fn export(url: String) -> Result<(), DeliveryError> {
    let exporter = HttpExporter::new(url, Duration::from_secs(5));
    tokio::task::spawn_blocking(move || exporter.export(&point()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn posts_line_as_octet_stream() {
    let (url, db) = spawn_database(StatusCode::NO_CONTENT, "").await;
    export(url).await.unwrap();

    let writes = db.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].body,
        "bandwidth,Hostname=h1,AppName=bwmon mean=20 1000"
    );
    assert_eq!(
        writes[0].content_type.as_deref(),
        Some("application/octet-stream")
    );
    assert_eq!(writes[0].query.as_deref(), Some("db=bwmon"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejection_reports_status_and_body() {
    let (url, db) = spawn_database(StatusCode::SERVICE_UNAVAILABLE, "overloaded").await;
    let err = export(url).await.unwrap_err();

    match &err {
        DeliveryError::Status { status, body, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("503"), "{msg}");
    assert!(msg.contains("overloaded"), "{msg}");
    assert_eq!(db.writes().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_statuses_fail() {
    for code in [300, 404, 500] {
        let status = StatusCode::from_u16(code).unwrap();
        let (url, _db) = spawn_database(status, "nope").await;
        match export(url).await {
            Err(DeliveryError::Status { status, .. }) => assert_eq!(status, code),
            other => panic!("{code}: unexpected result {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn success_statuses_pass() {
    for code in [200, 201, 299] {
        let status = StatusCode::from_u16(code).unwrap();
        let (url, _db) = spawn_database(status, "").await;
        export(url).await.unwrap();
    }
}

#[derive(Debug, Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);
impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Exports one point with a debug-level subscriber and returns what it logged.
async fn export_logged(url: String, debug: bool) -> String {
    let captured = Captured::default();
    let logs = captured.clone();
    let exporter = HttpExporter::new(url, Duration::from_secs(5)).with_debug(debug);
    tokio::task::spawn_blocking(move || {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_ansi(false)
            .with_writer(captured)
            .finish();
        tracing::subscriber::with_default(subscriber, || exporter.export(&point()))
    })
    .await
    .unwrap()
    .unwrap();
    let logs = logs.0.lock().unwrap().clone();
    String::from_utf8(logs).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn debug_mode_logs_written_line() {
    let (url, _db) = spawn_database(StatusCode::NO_CONTENT, "").await;
    let logs = export_logged(url, true).await;
    assert!(logs.contains("wrote point"), "{logs}");
    assert!(logs.contains(&point().line()), "{logs}");
}

#[tokio::test(flavor = "multi_thread")]
async fn success_is_silent_without_debug() {
    let (url, _db) = spawn_database(StatusCode::NO_CONTENT, "").await;
    let logs = export_logged(url, false).await;
    assert!(!logs.contains("wrote point"), "{logs}");
}
