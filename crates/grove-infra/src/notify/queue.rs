//! In-process notification queue.
//!
//! `notify` only enqueues; a pool of worker tasks hands each notification to
//! the mailer and retries failed deliveries with a linear backoff.
//! Queued notifications are lost on process restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use grove_core::ports::{Mailer, Notification, Notifier, NotifyError};

/// Notification queue configuration.
#[derive(Debug, Clone)]
pub struct NotifyQueueConfig {
    /// Maximum queued notifications.
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
    /// Delivery attempts before a notification is dropped.
    pub max_attempts: u32,
    /// Delay before the first retry; later retries wait proportionally longer.
    pub retry_backoff: Duration,
}

impl Default for NotifyQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            workers: 2,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl NotifyQueueConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: std::env::var("NOTIFY_QUEUE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            workers: std::env::var("NOTIFY_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.workers),
            max_attempts: std::env::var("NOTIFY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            ..defaults
        }
    }
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyStats {
    pub pending: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    delivered: AtomicUsize,
    failed: AtomicUsize,
}

struct Envelope {
    notification: Notification,
    attempts: u32,
}

/// Notifier backed by an mpsc channel and worker tasks.
pub struct QueuedNotifier {
    sender: mpsc::Sender<Envelope>,
    counters: Arc<Counters>,
}

impl QueuedNotifier {
    /// Create the queue and spawn its workers. Must be called within a Tokio runtime.
    pub fn start(config: NotifyQueueConfig, mailer: Arc<dyn Mailer>) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(1));
        let receiver = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());
        let config = Arc::new(config);

        for worker_id in 0..config.workers.max(1) {
            tokio::spawn(worker(
                worker_id,
                receiver.clone(),
                tx.downgrade(),
                mailer.clone(),
                counters.clone(),
                config.clone(),
            ));
        }

        Self {
            sender: tx,
            counters,
        }
    }

    pub fn stats(&self) -> NotifyStats {
        NotifyStats {
            pending: self.counters.pending.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let envelope = Envelope {
            notification,
            attempts: 0,
        };

        // Count first: a worker may finish before try_send returns.
        let pending = self.counters.pending.fetch_add(1, Ordering::Relaxed) + 1;

        if let Err(e) = self.sender.try_send(envelope) {
            self.counters.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
            });
        }

        tracing::debug!(pending, "Notification queued");
        Ok(())
    }
}

async fn worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    retry_sender: mpsc::WeakSender<Envelope>,
    mailer: Arc<dyn Mailer>,
    counters: Arc<Counters>,
    config: Arc<NotifyQueueConfig>,
) {
    tracing::debug!(worker = worker_id, "Notification worker started");

    loop {
        let envelope = {
            let mut rx = receiver.lock().await;
            rx.recv().await
        };
        let Some(mut envelope) = envelope else {
            tracing::debug!(worker = worker_id, "Notification worker shutting down");
            break;
        };

        envelope.attempts += 1;
        match mailer.send(&envelope.notification).await {
            Ok(()) => {
                counters.pending.fetch_sub(1, Ordering::Relaxed);
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::info!(worker = worker_id, attempts = envelope.attempts, "Notification delivered");
            }
            Err(e) if envelope.attempts < config.max_attempts => {
                tracing::warn!(
                    worker = worker_id,
                    attempt = envelope.attempts,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "Notification delivery failed, will retry"
                );
                let delay = config.retry_backoff * envelope.attempts;
                let retry_sender = retry_sender.clone();
                let counters = counters.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let sent = match retry_sender.upgrade() {
                        Some(sender) => sender.send(envelope).await.is_ok(),
                        None => false,
                    };
                    if !sent {
                        counters.pending.fetch_sub(1, Ordering::Relaxed);
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::error!("Failed to re-enqueue notification for retry");
                    }
                });
            }
            Err(e) => {
                counters.pending.fetch_sub(1, Ordering::Relaxed);
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    worker = worker_id,
                    attempts = envelope.attempts,
                    error = %e,
                    "Notification dropped after max retries"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::ports::NotificationKind;
    use std::sync::atomic::AtomicU32;

    /// Fails the first `failures` deliveries, then records the rest.
    struct FlakyMailer {
        failures: u32,
        calls: AtomicU32,
        delivered: Mutex<Vec<Notification>>,
    }

    impl FlakyMailer {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicU32::new(0),
                delivered: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(NotifyError::Delivery("smtp down".to_string()));
            }
            self.delivered.lock().await.push(notification.clone());
            Ok(())
        }
    }

    fn approval() -> Notification {
        Notification {
            email: "author@example.com".to_string(),
            name: "Author".to_string(),
            kind: NotificationKind::PostApproved {
                title: "Hello".to_string(),
                slug: "hello".to_string(),
            },
        }
    }

    fn config(max_attempts: u32) -> NotifyQueueConfig {
        NotifyQueueConfig {
            max_size: 10,
            workers: 1,
            max_attempts,
            retry_backoff: Duration::from_millis(10),
        }
    }

    async fn settle(queue: &QueuedNotifier) -> NotifyStats {
        for _ in 0..500 {
            let stats = queue.stats();
            if stats.pending == 0 {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        queue.stats()
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_queued_notification() {
        let mailer = FlakyMailer::new(0);
        let queue = QueuedNotifier::start(config(3), mailer.clone());

        queue.notify(approval()).await.unwrap();
        let stats = settle(&queue).await;

        assert_eq!(stats.delivered, 1);
        assert_eq!(mailer.delivered.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_delivered() {
        let mailer = FlakyMailer::new(2);
        let queue = QueuedNotifier::start(config(3), mailer.clone());

        queue.notify(approval()).await.unwrap();
        let stats = settle(&queue).await;

        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let mailer = FlakyMailer::new(u32::MAX);
        let queue = QueuedNotifier::start(config(2), mailer.clone());

        queue.notify(approval()).await.unwrap();
        let stats = settle(&queue).await;

        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 2);
    }
}
