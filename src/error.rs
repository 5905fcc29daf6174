use thiserror::Error;

/// Failures raised by a [`SampleSource`](crate::source::SampleSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sample source failed to initialize: {0}")]
    Init(String),
    #[error("no measurement endpoints available")]
    NoEndpoints,
    #[error("download from {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("sample sink closed before measurement finished")]
    SinkClosed,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("database returned {status} {reason}: {body:?}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("request to database failed: {0}")]
    Transport(String),
}

/// Everything that can abandon a single measure/aggregate/deliver cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("initialization: {0}")]
    Init(#[source] SourceError),
    #[error("measurement: {0}")]
    Measure(#[source] SourceError),
    #[error("no usable samples were collected ({dropped} non-finite dropped)")]
    EmptyStream { dropped: u64 },
    #[error("delivery: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("cycle worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line has no timestamp")]
    MissingTimestamp,
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("line has no field block")]
    MissingFields,
    #[error("empty measurement name")]
    EmptyMeasurement,
    #[error("malformed pair {0:?}")]
    MalformedPair(String),
}
