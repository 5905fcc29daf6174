use std::time::Duration;

use crate::{error::DeliveryError, point::Point};

const CONTENT_TYPE: &str = "application/octet-stream";
const UNREADABLE_BODY: &str = "<unable to read body>";

/// Writes points to an InfluxDB `/write` URL, one line per request.
#[derive(Debug, Clone)]
pub struct HttpExporter {
    client: ureq::Agent,
    url: String,
    debug: bool,
}
impl HttpExporter {
    pub fn new(url: String, timeout: Duration) -> Self {
        // Redirects are reported as failures rather than followed.
        let client = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        Self {
            client,
            url,
            debug: false,
        }
    }

    /// Logs every successful write with the line that was sent.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Blocking I/O
    pub fn export(&self, point: &Point) -> Result<(), DeliveryError> {
        let line = point.line();
        let resp = self
            .client
            .post(&self.url)
            .set("Content-Type", CONTENT_TYPE)
            .send_string(&line);
        let resp = match resp {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => return Err(rejected(resp)),
            Err(e) => return Err(DeliveryError::Transport(e.to_string())),
        };
        if !is_success(resp.status()) {
            return Err(rejected(resp));
        }
        if self.debug {
            tracing::debug!(
                status = resp.status(),
                reason = resp.status_text(),
                %line,
                "wrote point"
            );
        }
        Ok(())
    }
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn rejected(resp: ureq::Response) -> DeliveryError {
    let status = resp.status();
    let reason = resp.status_text().to_string();
    let body = resp
        .into_string()
        .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
    DeliveryError::Status {
        status,
        reason,
        body,
    }
}
