//! Domain event emission.
//!
//! The auth service publishes `USER_LOGIN` every time it hands out a session.
//! [`HttpEventPublisher`] posts events to a webhook-style endpoint;
//! [`LogEventPublisher`] only writes them to the log and is used when no
//! endpoint is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub const USER_LOGIN: &str = "USER_LOGIN";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event transport failed: {0}")]
    Transport(String),
    #[error("event endpoint rejected event with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &str, payload: Value, metadata: HashMap<String, String>) -> Result<(), EventError>;
}

/// Wire shape posted by [`HttpEventPublisher`]
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a> {
    pub event: &'a str,
    pub payload: &'a Value,
    pub metadata: &'a HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

pub struct HttpEventPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventPublisher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EventError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EventError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: &str, payload: Value, metadata: HashMap<String, String>) -> Result<(), EventError> {
        let body = EventEnvelope { event, payload: &payload, metadata: &metadata, occurred_at: Utc::now() };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EventError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EventError::Rejected(status.as_u16()));
        }
        debug!(event, endpoint = %self.endpoint, "event delivered");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: &str, payload: Value, metadata: HashMap<String, String>) -> Result<(), EventError> {
        let subject = payload.get("id").and_then(Value::as_str).unwrap_or("-");
        info!(event, subject, metadata = ?metadata, "domain_event");
        Ok(())
    }
}

pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct PublishedEvent {
        pub event: String,
        pub payload: Value,
        pub metadata: HashMap<String, String>,
    }

    /// Keeps every published event in memory; can be switched to fail.
    #[derive(Default)]
    pub struct RecordingEventPublisher {
        events: Mutex<Vec<PublishedEvent>>,
        fail: AtomicBool,
    }

    impl RecordingEventPublisher {
        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn events(&self) -> Vec<PublishedEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingEventPublisher {
        async fn publish(&self, event: &str, payload: Value, metadata: HashMap<String, String>) -> Result<(), EventError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EventError::Transport("event bus unavailable".into()));
            }
            self.events
                .lock()
                .map_err(|_| EventError::Transport("recorder poisoned".into()))?
                .push(PublishedEvent { event: event.to_string(), payload, metadata });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    type Inbox = Arc<Mutex<Vec<Value>>>;

    async fn spawn_sink(status: StatusCode) -> (String, Inbox) {
        let inbox: Inbox = Arc::default();
        let app = Router::new()
            .route(
                "/events",
                post(move |State(inbox): State<Inbox>, Json(body): Json<Value>| async move {
                    inbox.lock().unwrap().push(body);
                    status
                }),
            )
            .with_state(inbox.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/events"), inbox)
    }

    #[tokio::test]
    async fn http_publisher_posts_envelope() {
        let (url, inbox) = spawn_sink(StatusCode::ACCEPTED).await;
        let publisher = HttpEventPublisher::new(url, Duration::from_secs(5)).unwrap();

        publisher
            .publish(USER_LOGIN, json!({"id": "42", "email": "a@x.com"}), HashMap::new())
            .await
            .unwrap();

        let received = inbox.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["event"], USER_LOGIN);
        assert_eq!(received[0]["payload"]["email"], "a@x.com");
        assert_eq!(received[0]["metadata"], json!({}));
        assert!(received[0]["occurred_at"].is_string());
    }

    #[tokio::test]
    async fn http_publisher_reports_rejection() {
        let (url, _inbox) = spawn_sink(StatusCode::INTERNAL_SERVER_ERROR).await;
        let publisher = HttpEventPublisher::new(url, Duration::from_secs(5)).unwrap();
        let err = publisher.publish(USER_LOGIN, json!({}), HashMap::new()).await.unwrap_err();
        assert!(matches!(err, EventError::Rejected(500)));
    }

    #[tokio::test]
    async fn http_publisher_reports_unreachable_endpoint() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let publisher = HttpEventPublisher::new(format!("http://{addr}/events"), Duration::from_secs(2)).unwrap();
        let err = publisher.publish(USER_LOGIN, json!({}), HashMap::new()).await.unwrap_err();
        assert!(matches!(err, EventError::Transport(_)));
    }

    #[tokio::test]
    async fn log_publisher_never_fails() {
        assert!(LogEventPublisher.publish(USER_LOGIN, json!({"id": "1"}), HashMap::new()).await.is_ok());
    }
}
