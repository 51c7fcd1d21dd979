use std::sync::Arc;

use crate::{
    domain::ChatId, messaging::port::MessagingPort, store::SubscriptionStore, Result,
};

/// One recipient that could not be reached during a broadcast.
#[derive(Clone, Debug)]
pub struct DeliveryFailure {
    pub chat_id: ChatId,
    pub error: String,
}

/// Outcome of a broadcast whose recipient list was read successfully.
#[derive(Clone, Debug, Default)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failures.len()
    }
}

/// Fans one HTML message out to every subscribed chat.
pub struct Broadcaster {
    store: Arc<dyn SubscriptionStore>,
    messenger: Arc<dyn MessagingPort>,
}

impl Broadcaster {
    pub fn new(store: Arc<dyn SubscriptionStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { store, messenger }
    }

    /// Send `html` once to each subscription.
    ///
    /// Fails only when the subscription list cannot be read. A failed send is logged and
    /// recorded in the report; the remaining chats are still attempted and nothing is retried.
    pub async fn broadcast(&self, html: &str) -> Result<BroadcastReport> {
        let subscriptions = self.store.list_all().await?;
        let mut report = BroadcastReport::default();

        for sub in &subscriptions {
            match self.messenger.send_html(sub.chat(), html).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(chat_id = sub.chat_id, error = %e, "failed to send to group");
                    report.failures.push(DeliveryFailure {
                        chat_id: sub.chat(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failures.len(),
            "broadcast finished"
        );
        Ok(report)
    }
}
