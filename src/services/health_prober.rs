use crate::error::{FleetError, Result};
use crate::models::HealthReport;
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// GET-based liveness check. Probing never returns an error: every failure
/// ends up in `HealthReport::error` with `healthy = false`.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: Client,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::from_builder(Client::builder(), timeout)
    }

    fn from_builder(builder: ClientBuilder, timeout: Duration) -> Result<Self> {
        let client = builder
            .timeout(timeout)
            .build()
            .map_err(|e| FleetError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub async fn probe(&self, url: &str) -> HealthReport {
        let started = Instant::now();
        // the client timeout covers connect + body; this one bounds the
        // whole exchange
        let result = tokio::time::timeout(self.timeout, self.client.get(url).send()).await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let report = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                HealthReport {
                    healthy: status.is_success(),
                    response_time_ms,
                    status_code: Some(status.as_u16()),
                    error: (!status.is_success())
                        .then(|| format!("unexpected HTTP status {}", status)),
                }
            }
            Ok(Err(e)) => HealthReport {
                healthy: false,
                response_time_ms,
                status_code: None,
                error: Some(describe(&e)),
            },
            Err(_) => HealthReport {
                healthy: false,
                response_time_ms,
                status_code: None,
                error: Some(format!("timed out after {}s", self.timeout.as_secs_f64())),
            },
        };
        debug!(url, healthy = report.healthy, response_time_ms, "health probe");
        report
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_builder() {
        format!("invalid URL: {}", err)
    } else {
        err.to_string()
    }
}
