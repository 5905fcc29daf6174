#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bwmon::{source::SampleSource, SourceError};
use poem::{
    get, handler,
    http::StatusCode,
    listener::{Acceptor, Listener, TcpListener},
    middleware::AddData,
    post,
    web::Data,
    EndpointExt, Request, Route, Server,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Received {
    pub content_type: Option<String>,
    pub query: Option<String>,
    pub body: String,
}

/// Stand-in for the InfluxDB `/write` endpoint.
#[derive(Debug)]
pub struct Database {
    status: StatusCode,
    reply: String,
    writes: Mutex<Vec<Received>>,
}
impl Database {
    pub fn writes(&self) -> Vec<Received> {
        self.writes.lock().unwrap().clone()
    }
}

#[handler]
fn write(req: &Request, body: String, db: Data<&Arc<Database>>) -> (StatusCode, String) {
    db.writes.lock().unwrap().push(Received {
        content_type: req.header("content-type").map(str::to_string),
        query: req.uri().query().map(str::to_string),
        body,
    });
    (db.status, db.reply.clone())
}

pub const DOWNLOAD_SIZE: usize = 4 << 20;

#[handler]
fn download() -> Vec<u8> {
    vec![0; DOWNLOAD_SIZE]
}

pub fn download_url(write_url: &str) -> String {
    match write_url.split_once("/write") {
        Some((base, _)) => format!("{base}/download"),
        None => panic!("not a write url: {write_url}"),
    }
}

/// Returns the write URL and a handle to inspect what was received.
pub async fn spawn_database(status: StatusCode, reply: &str) -> (String, Arc<Database>) {
    let db = Arc::new(Database {
        status,
        reply: reply.to_string(),
        writes: Mutex::new(vec![]),
    });
    let app = Route::new()
        .at("/write", post(write))
        .at("/download", get(download))
        .with(AddData::new(db.clone()));
    let acceptor = TcpListener::bind("127.0.0.1:0")
        .into_acceptor()
        .await
        .unwrap();
    let addr = *acceptor.local_addr()[0].as_socket_addr().unwrap();
    tokio::spawn(Server::new_with_acceptor(acceptor).run(app));
    (format!("http://{addr}/write?db=bwmon"), db)
}

/// Replays a fixed list of samples.
#[derive(Debug, Default, Clone)]
pub struct Scripted {
    pub samples: Vec<f64>,
    pub fail_init: bool,
    pub fail_measure: bool,
}
impl SampleSource for Scripted {
    fn init(&mut self) -> Result<(), SourceError> {
        if self.fail_init {
            return Err(SourceError::Init("resolver unavailable".to_string()));
        }
        Ok(())
    }

    fn endpoints(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(vec!["http://probe.invalid/file".to_string()])
    }

    fn measure(
        &mut self,
        _endpoints: &[String],
        sink: mpsc::Sender<f64>,
    ) -> Result<(), SourceError> {
        for &sample in &self.samples {
            sink.blocking_send(sample)
                .map_err(|_| SourceError::SinkClosed)?;
        }
        if self.fail_measure {
            return Err(SourceError::Other("connection reset".to_string()));
        }
        Ok(())
    }
}
