//! Chat webhook notifications.
//!
//! # Responsibilities
//! - Forward EVENT and ERROR records to an incoming webhook as MessageCards
//! - Never block or fail the code that logged the record
//!
//! # Design Decisions
//! - The line formatter hands each stamped record to [`NotifyQueue`], so the
//!   card and the stdout line carry the same timestamp
//! - The queue is bounded; a slow webhook costs dropped cards, not memory
//! - Delivery failures are logged locally under [`NOTIFY_TARGET`] and dropped
//! - Only this crate's own records are forwarded

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::observability::logging::{LogLevel, LogRecord, NOTIFY_TARGET};
use crate::observability::metrics;

const CARD_TITLE: &str = "🚀 Health Check Notification";
const ERROR_COLOR: &str = "FF0000";
const OK_COLOR: &str = "00FF00";

/// A log record queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl From<LogRecord> for Notification {
    fn from(record: LogRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            level: record.level,
            message: record.message,
        }
    }
}

/// Legacy Office 365 connector card.
#[derive(Debug, Clone, Serialize)]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: &'static str,
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub summary: &'static str,
    #[serde(rename = "themeColor")]
    pub theme_color: &'static str,
    pub title: &'static str,
    pub text: String,
}

impl From<&Notification> for MessageCard {
    fn from(n: &Notification) -> Self {
        let theme_color = if n.level == LogLevel::Error {
            ERROR_COLOR
        } else {
            OK_COLOR
        };
        Self {
            card_type: "MessageCard",
            context: "http://schema.org/extensions",
            summary: CARD_TITLE,
            theme_color,
            title: CARD_TITLE,
            text: format!("[{}] **{}**: {}", n.timestamp, n.level, n.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook responded with {0}")]
    Status(reqwest::StatusCode),
}

/// Posts cards to one webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let res = self
            .client
            .post(&self.url)
            .json(&MessageCard::from(notification))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(NotifyError::Status(res.status()));
        }
        Ok(())
    }
}

enum Command {
    Send(Notification),
    Flush(oneshot::Sender<()>),
}

/// Cards waiting for the worker before new ones are dropped.
pub const QUEUE_CAPACITY: usize = 256;

/// Sending side of the delivery queue, fed by the line formatter.
///
/// Never blocks: when the worker falls behind, cards are dropped and counted.
#[derive(Debug, Clone)]
pub struct NotifyQueue {
    tx: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
}

impl NotifyQueue {
    fn channel(capacity: usize) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (queue, rx)
    }

    /// Queue `record` if it belongs on the webhook. Returns `true` if queued.
    pub fn offer(&self, target: &str, record: &LogRecord) -> bool {
        if target == NOTIFY_TARGET || !target.starts_with("endpoint_sentinel") {
            return false;
        }
        if !record.level.is_notifiable() {
            return false;
        }

        match self.tx.try_send(Command::Send(record.clone().into())) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_notification_dropped();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Cards dropped since the worker last reported.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle to the delivery task.
#[derive(Clone)]
pub struct NotifyHandle {
    tx: mpsc::Sender<Command>,
}

impl NotifyHandle {
    /// Wait until everything queued so far has been attempted.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

/// Start the delivery task. Must be called inside a Tokio runtime.
pub fn spawn_notifier(notifier: WebhookNotifier) -> (NotifyQueue, NotifyHandle, JoinHandle<()>) {
    spawn_with_capacity(notifier, QUEUE_CAPACITY)
}

fn spawn_with_capacity(notifier: WebhookNotifier, capacity: usize) -> (NotifyQueue, NotifyHandle, JoinHandle<()>) {
    let (queue, mut rx) = NotifyQueue::channel(capacity);
    let handle = NotifyHandle {
        tx: queue.tx.clone(),
    };
    let dropped = queue.dropped.clone();

    let task = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Send(notification) => {
                    if let Err(e) = notifier.send(&notification).await {
                        tracing::info!(target: NOTIFY_TARGET, "Failed to send Teams notification: {}", e);
                    }
                }
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
            }

            let lost = dropped.swap(0, Ordering::Relaxed);
            if lost > 0 {
                tracing::info!(target: NOTIFY_TARGET, "Notification queue full, dropped {} cards", lost);
            }
        }
    });

    (queue, handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::capture::LogCapture;
    use crate::observability::logging::{Clock, JsonLine};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification(level: LogLevel, message: &str) -> Notification {
        Notification {
            timestamp: "2024-05-01 10:00:00.123".into(),
            level,
            message: message.into(),
        }
    }

    #[test]
    fn test_card_shape() {
        let card = MessageCard::from(&notification(LogLevel::Error, "Failed to patch endpoints"));
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["@type"], "MessageCard");
        assert_eq!(json["@context"], "http://schema.org/extensions");
        assert_eq!(json["themeColor"], "FF0000");
        assert_eq!(json["title"], CARD_TITLE);
        assert_eq!(
            json["text"],
            "[2024-05-01 10:00:00.123] **ERROR**: Failed to patch endpoints"
        );

        let card = MessageCard::from(&notification(LogLevel::Event, "ok"));
        assert_eq!(card.theme_color, "00FF00");
    }

    fn drain(rx: &mut mpsc::Receiver<Command>) -> Vec<Notification> {
        let mut queued = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            if let Command::Send(n) = cmd {
                queued.push(n);
            }
        }
        queued
    }

    #[test]
    fn test_queue_accepts_only_event_and_error() {
        let (queue, mut rx) = NotifyQueue::channel(16);
        let capture = LogCapture::with_format(JsonLine::new(Clock::utc()).with_notifier(queue));

        tracing::debug!("Sleeping for 0.01 seconds...");
        tracing::info!("PORT                 : 9092");
        crate::log_event!("Finished updating Kubernetes endpoints.");
        tracing::error!("Failed to patch endpoints: boom");
        tracing::info!(target: NOTIFY_TARGET, "Failed to send Teams notification: x");
        tracing::error!(target: "hyper::proto", "connection reset");
        drop(capture);

        let forwarded: Vec<_> = drain(&mut rx).into_iter().map(|n| (n.level, n.message)).collect();
        assert_eq!(
            forwarded,
            vec![
                (LogLevel::Event, "Finished updating Kubernetes endpoints.".to_string()),
                (LogLevel::Error, "Failed to patch endpoints: boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_card_and_line_share_timestamp() {
        let (queue, mut rx) = NotifyQueue::channel(16);
        let capture = LogCapture::with_format(JsonLine::new(Clock::utc()).with_notifier(queue));

        for i in 0..20 {
            tracing::error!("Failed to patch endpoints: attempt {}", i);
        }

        let lines = capture.lines();
        let queued = drain(&mut rx);
        assert_eq!(lines.len(), 20);
        assert_eq!(queued.len(), 20);
        for (line, card) in lines.iter().zip(&queued) {
            assert_eq!(line["timestamp"], card.timestamp.as_str());
            assert_eq!(line["message"], card.message.as_str());
        }
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let (queue, mut rx) = NotifyQueue::channel(2);
        let record = |message: &str| LogRecord {
            timestamp: "2024-05-01 10:00:00.123".into(),
            level: LogLevel::Event,
            message: message.into(),
        };

        assert!(queue.offer(crate::observability::EVENT_TARGET, &record("a")));
        assert!(queue.offer(crate::observability::EVENT_TARGET, &record("b")));
        assert!(!queue.offer(crate::observability::EVENT_TARGET, &record("c")));
        assert!(!queue.offer(crate::observability::EVENT_TARGET, &record("d")));
        assert_eq!(queue.dropped(), 2);

        let kept: Vec<_> = drain(&mut rx).into_iter().map(|n| n.message).collect();
        assert_eq!(kept, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_worker_resets_drop_count_after_reporting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let (queue, handle, _task) = spawn_with_capacity(WebhookNotifier::new(server.uri()), 1);
        let record = LogRecord {
            timestamp: "2024-05-01 10:00:00.123".into(),
            level: LogLevel::Error,
            message: "x".into(),
        };
        for _ in 0..50 {
            queue.offer(crate::observability::EVENT_TARGET, &record);
        }
        assert!(queue.dropped() > 0);

        handle.flush().await;
        assert_eq!(queue.dropped(), 0);
        assert!(server.received_requests().await.unwrap().len() < 50);
    }

    #[tokio::test]
    async fn test_posts_card_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "@type": "MessageCard",
                "themeColor": "00FF00",
                "text": "[2024-05-01 10:00:00.123] **EVENT**: Finished updating Kubernetes endpoints."
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        notifier
            .send(&notification(LogLevel::Event, "Finished updating Kubernetes endpoints."))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_post_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri());
        let err = notifier
            .send(&notification(LogLevel::Error, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Status(s) if s.as_u16() == 400));
    }

    #[tokio::test]
    async fn test_worker_delivers_before_flush_returns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let (queue, handle, _task) = spawn_notifier(WebhookNotifier::new(server.uri()));
        queue.tx.send(Command::Send(notification(LogLevel::Event, "a"))).await.unwrap();
        queue.tx.send(Command::Send(notification(LogLevel::Error, "b"))).await.unwrap();
        handle.flush().await;

        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_stop_worker() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let (queue, handle, task) = spawn_notifier(WebhookNotifier::new(url));
        queue.tx.send(Command::Send(notification(LogLevel::Error, "x"))).await.unwrap();
        handle.flush().await;
        assert!(!task.is_finished());
    }
}
