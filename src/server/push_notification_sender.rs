//! Push-notification delivery — fans a task's current state out to every
//! registered webhook, signing each POST per [`push_notification_auth`].
//!
//! Grounded on `trysoma-soma/crates/a2a-rs/src/tasks/base_push_notification_sender.rs`'s
//! `BasePushNotificationSender`: one `reqwest::Client`, look up the configs
//! for a task, `join_all` the deliveries, log (don't fail the task) on a
//! per-URL error.
//!
//! [`push_notification_auth`]: super::push_notification_auth

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::A2AResult;
use crate::types::Task;

use super::push_notification_auth::PushNotificationAuth;
use super::task_store::TaskStore;

/// Default outbound push-delivery timeout (§5).
const PUSH_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends push notifications carrying a task's latest state to every webhook
/// registered for that task.
///
/// Delivery failures are logged, not propagated — per §7, "push delivery
/// failure... does not affect task state."
#[async_trait]
pub trait PushNotificationSender: Send + Sync {
    /// Deliver the task's current state to every configured webhook.
    async fn send_notification(&self, task: &Task) -> A2AResult<()>;
}

/// Default [`PushNotificationSender`]: signs each delivery with
/// [`PushNotificationAuth`] and POSTs the task JSON to every URL registered
/// in the [`TaskStore`] for that task.
pub struct DefaultPushNotificationSender {
    http: reqwest::Client,
    auth: Arc<PushNotificationAuth>,
    task_store: Arc<dyn TaskStore>,
}

impl DefaultPushNotificationSender {
    /// Build a sender over the given signer and task store.
    pub fn new(auth: Arc<PushNotificationAuth>, task_store: Arc<dyn TaskStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            task_store,
        }
    }

    async fn dispatch_one(&self, task: &Task, url: &str) -> bool {
        let body = match serde_json::to_vec(task) {
            Ok(b) => b,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to serialize task for push delivery");
                return false;
            }
        };

        let jwt = match self.auth.sign(&body) {
            Ok(jwt) => jwt,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to sign push notification");
                return false;
            }
        };

        let result = tokio::time::timeout(
            PUSH_DELIVERY_TIMEOUT,
            self.http
                .post(url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {jwt}"))
                .body(body)
                .send(),
        )
        .await;

        match result {
            Ok(Ok(response)) if response.status().is_success() => {
                debug!(task_id = %task.id, url, "push notification delivered");
                true
            }
            Ok(Ok(response)) => {
                warn!(
                    task_id = %task.id,
                    url,
                    status = %response.status(),
                    "push notification rejected by receiver"
                );
                false
            }
            Ok(Err(e)) => {
                warn!(task_id = %task.id, url, error = %e, "push notification delivery failed");
                false
            }
            Err(_) => {
                warn!(task_id = %task.id, url, "push notification delivery timed out");
                false
            }
        }
    }
}

#[async_trait]
impl PushNotificationSender for DefaultPushNotificationSender {
    async fn send_notification(&self, task: &Task) -> A2AResult<()> {
        let configs = self.task_store.list_push(&task.id).await?;
        if configs.is_empty() {
            return Ok(());
        }

        let deliveries = configs
            .iter()
            .map(|config| self.dispatch_one(task, &config.push_notification_config.url));
        let results = futures::future::join_all(deliveries).await;

        if !results.iter().all(|ok| *ok) {
            warn!(task_id = %task.id, "some push notifications failed to deliver");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::task_store::InMemoryTaskStore;
    use crate::types::{PushNotificationConfig, Task, TaskPushNotificationConfig, TaskStatus};

    #[tokio::test]
    async fn send_notification_is_a_noop_with_no_configs() {
        let auth = Arc::new(PushNotificationAuth::generate().unwrap());
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let sender = DefaultPushNotificationSender::new(auth, store);

        let task = Task {
            id: "t1".to_string(),
            context_id: "c1".to_string(),
            kind: "task".to_string(),
            status: TaskStatus::new(crate::types::TaskState::Submitted),
            artifacts: None,
            history: None,
            metadata: None,
        };

        sender.send_notification(&task).await.unwrap();
    }

    #[tokio::test]
    async fn send_notification_reports_configured_but_unreachable_url() {
        let auth = Arc::new(PushNotificationAuth::generate().unwrap());
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        store
            .set_push(
                "t1",
                TaskPushNotificationConfig {
                    id: None,
                    task_id: "t1".to_string(),
                    push_notification_config: PushNotificationConfig {
                        id: None,
                        url: "http://127.0.0.1:1".to_string(),
                        token: None,
                        authentication: None,
                    },
                    tenant: None,
                },
            )
            .await
            .unwrap();

        let sender = DefaultPushNotificationSender::new(auth, Arc::clone(&store));
        let task = Task {
            id: "t1".to_string(),
            context_id: "c1".to_string(),
            kind: "task".to_string(),
            status: TaskStatus::new(crate::types::TaskState::Completed),
            artifacts: None,
            history: None,
            metadata: None,
        };

        // Must not error the caller — per §7, delivery failure is logged only.
        sender.send_notification(&task).await.unwrap();
    }
}
