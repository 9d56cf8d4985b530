//! Webhook delivery.
//!
//! [`Notifier::notify`] performs one bounded delivery attempt and reports
//! the outcome. [`Notifier::dispatch`] wraps it in a detached Tokio task
//! for the ingest path, which must never wait on the sink: the outcome
//! only shows up in the logs.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::Record;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::payload::build_message;

/// Outcome of a successful [`Notifier::notify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the message.
    Sent,
    /// No sink is configured; nothing was sent.
    Disabled,
}

/// Delivers record notifications to the configured webhook sink.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    username: String,
    timeout: Duration,
}

impl Notifier {
    /// Build a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the HTTP client cannot be
    /// initialised.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            username: config.username.clone(),
            timeout: config.timeout,
        })
    }

    /// Whether a sink is configured.
    pub const fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Deliver one notification, bounded by the configured timeout.
    ///
    /// No retries are attempted.
    pub async fn notify(&self, record: &Record) -> Result<Delivery, RelayError> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Ok(Delivery::Disabled);
        };

        let message = build_message(record, &self.username);
        let send = async {
            let response = self
                .client
                .post(url)
                .json(&message)
                .send()
                .await
                .map_err(|e| RelayError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read error body".to_owned());
                return Err(RelayError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(Delivery::Sent)
        };

        timeout(self.timeout, send)
            .await
            .map_err(|_elapsed| RelayError::Timeout {
                timeout_ms: self.timeout.as_millis(),
            })?
    }

    /// Deliver in a detached task and return immediately.
    ///
    /// Failures are logged and discarded. The handle is only useful to
    /// tests; callers on the request path drop it.
    pub fn dispatch(self: &Arc<Self>, record: Record) -> JoinHandle<()> {
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            match notifier.notify(&record).await {
                Ok(Delivery::Sent) => info!(
                    job_id = record.job_id,
                    display_name = record.display_name,
                    "webhook notified"
                ),
                Ok(Delivery::Disabled) => debug!(job_id = record.job_id, "webhook disabled, skipping"),
                Err(e) => warn!(
                    error = %e,
                    job_id = record.job_id,
                    "webhook delivery failed"
                ),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use beacon_core::{Candidate, RecordStore};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    use super::*;

    fn record() -> Record {
        RecordStore::default().insert(Candidate::new("Tralalero", "job-1").with_value(2_500))
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Sink that accepts every message and forwards the body to `tx`.
    async fn recording_sink() -> (SocketAddr, mpsc::UnboundedReceiver<serde_json::Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let router = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    tx.send(body).unwrap();
                    StatusCode::NO_CONTENT
                }
            }),
        );
        (serve(router).await, rx)
    }

    fn notifier_for(addr: SocketAddr, timeout: Duration) -> Notifier {
        let config = RelayConfig::default()
            .with_webhook_url(format!("http://{addr}/hook"))
            .with_timeout(timeout);
        Notifier::new(&config).unwrap()
    }

    #[tokio::test]
    async fn disabled_without_sink() {
        let notifier = Notifier::new(&RelayConfig::default()).unwrap();
        assert!(!notifier.is_enabled());
        assert_eq!(notifier.notify(&record()).await.unwrap(), Delivery::Disabled);
    }

    #[tokio::test]
    async fn delivers_message_to_sink() {
        let (addr, mut rx) = recording_sink().await;
        let notifier = notifier_for(addr, Duration::from_secs(5));

        assert_eq!(notifier.notify(&record()).await.unwrap(), Delivery::Sent);

        let body = rx.recv().await.unwrap();
        assert_eq!(body["username"], "JX-NOTIFIER");
        assert_eq!(body["embeds"][0]["fields"][1]["value"], "$2.5K/s");
    }

    #[tokio::test]
    async fn dispatch_runs_detached() {
        let (addr, mut rx) = recording_sink().await;
        let notifier = Arc::new(notifier_for(addr, Duration::from_secs(5)));

        let handle = notifier.dispatch(record());
        handle.await.unwrap();
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::BAD_REQUEST, "bad embed") }),
        );
        let addr = serve(router).await;
        let notifier = notifier_for(addr, Duration::from_secs(5));

        let err = notifier.notify(&record()).await.unwrap_err();
        assert!(matches!(err, RelayError::Status { status: 400, ref body } if body == "bad embed"));
    }

    #[tokio::test]
    async fn slow_sink_times_out() {
        let router = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::NO_CONTENT
            }),
        );
        let addr = serve(router).await;
        let notifier = notifier_for(addr, Duration::from_millis(50));

        let err = notifier.notify(&record()).await.unwrap_err();
        // Either layer may fire first; both bound the attempt.
        assert!(matches!(err, RelayError::Timeout { .. } | RelayError::Request(_)));
    }

    #[tokio::test]
    async fn unreachable_sink_is_an_error_not_a_panic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let notifier = Arc::new(notifier_for(addr, Duration::from_secs(1)));

        assert!(matches!(
            notifier.notify(&record()).await,
            Err(RelayError::Request(_))
        ));
        // The detached path swallows the same failure.
        notifier.dispatch(record()).await.unwrap();
    }
}
