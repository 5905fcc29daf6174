//! Throughput probes.
//!
//! A [`SampleSource`] pushes kbit/s samples into a channel while it measures
//! and closes the channel by dropping the sender when it returns.

use std::{
    io::Read,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

use tokio::sync::mpsc;

use crate::{config::SourceConfig, error::SourceError};

const READ_BUF_SIZE: usize = 64 * 1024;

/// All methods block; the monitor runs them off the async runtime.
pub trait SampleSource: Send + 'static {
    fn init(&mut self) -> Result<(), SourceError>;
    fn endpoints(&mut self) -> Result<Vec<String>, SourceError>;
    fn measure(
        &mut self,
        endpoints: &[String],
        sink: mpsc::Sender<f64>,
    ) -> Result<(), SourceError>;
}

/// Downloads from a fixed list of URLs in parallel and samples the combined
/// transfer rate.
#[derive(Debug)]
pub struct DownloadSource {
    config: SourceConfig,
    client: Option<ureq::Agent>,
}
impl DownloadSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }
}
impl SampleSource for DownloadSource {
    fn init(&mut self) -> Result<(), SourceError> {
        if self.config.sample_period.is_zero() {
            return Err(SourceError::Init("sample period must be non-zero".into()));
        }
        let client = ureq::AgentBuilder::new()
            .timeout_connect(self.config.measure_for)
            .timeout_read(self.config.measure_for)
            .build();
        self.client = Some(client);
        Ok(())
    }

    fn endpoints(&mut self) -> Result<Vec<String>, SourceError> {
        if self.config.endpoints.is_empty() {
            return Err(SourceError::NoEndpoints);
        }
        Ok(self.config.endpoints.clone())
    }

    fn measure(
        &mut self,
        endpoints: &[String],
        sink: mpsc::Sender<f64>,
    ) -> Result<(), SourceError> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| SourceError::Init("measure called before init".into()))?;
        let received = AtomicU64::new(0);
        let done = AtomicBool::new(false);
        let deadline = Instant::now() + self.config.measure_for;
        let period = self.config.sample_period;

        thread::scope(|s| {
            let downloads = endpoints
                .iter()
                .map(|url| {
                    let client = &client;
                    let received = &received;
                    let done = &done;
                    s.spawn(move || download(client, url, received, done))
                })
                .collect::<Vec<_>>();

            let mut sampled = Ok(());
            let mut last_bytes = 0;
            let mut last_at = Instant::now();
            loop {
                thread::sleep(period);
                let finished = downloads.iter().all(|d| d.is_finished());
                let now = Instant::now();
                let bytes = received.load(Ordering::Relaxed);
                let rate = kbps(bytes - last_bytes, now - last_at);
                last_bytes = bytes;
                last_at = now;
                if sink.blocking_send(rate).is_err() {
                    sampled = Err(SourceError::SinkClosed);
                    break;
                }
                if finished || now >= deadline {
                    break;
                }
            }
            done.store(true, Ordering::Relaxed);

            let mut downloaded = Ok(());
            for d in downloads {
                let res = d
                    .join()
                    .unwrap_or_else(|_| Err(SourceError::Other("download thread panicked".into())));
                if downloaded.is_ok() {
                    downloaded = res;
                }
            }
            sampled.and(downloaded)
        })
    }
}

fn download(
    client: &ureq::Agent,
    url: &str,
    received: &AtomicU64,
    done: &AtomicBool,
) -> Result<(), SourceError> {
    let failed = |reason: String| SourceError::Download {
        url: url.to_string(),
        reason,
    };
    let resp = client.get(url).call().map_err(|e| failed(e.to_string()))?;
    let mut body = resp.into_reader();
    let mut buf = vec![0; READ_BUF_SIZE];
    while !done.load(Ordering::Relaxed) {
        match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                received.fetch_add(n as u64, Ordering::Relaxed);
            }
            // The deadline may cut a read short; only report errors seen before it.
            Err(_) if done.load(Ordering::Relaxed) => break,
            Err(e) => return Err(failed(e.to_string())),
        }
    }
    tracing::trace!(url, "download finished");
    Ok(())
}

/// Kilobits per second.
pub fn kbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0 / 1000.0) / secs
}
