use super::ProfileProvisioner;
use crate::models::UserCreatedEvent;
use crate::services::metrics::record_user_created_event;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Sending half handed to the hook endpoint.
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<UserCreatedEvent>,
}

impl EventQueue {
    /// Accepts the event without waiting for it to be provisioned.
    pub fn enqueue(&self, event: UserCreatedEvent) -> Result<(), AppError> {
        match self.tx.try_send(event) {
            Ok(()) => {
                record_user_created_event("accepted");
                Ok(())
            }
            Err(TrySendError::Full(event)) => {
                record_user_created_event("rejected");
                tracing::warn!(uid = %event.uid, "User-created queue full, rejecting event");
                Err(AppError::ServiceUnavailable("Event queue full".to_string()))
            }
            Err(TrySendError::Closed(event)) => {
                record_user_created_event("rejected");
                tracing::warn!(uid = %event.uid, "User-created queue closed, rejecting event");
                Err(AppError::ServiceUnavailable("Event queue closed".to_string()))
            }
        }
    }
}

/// Drains the queue, running one provisioning task per event.
///
/// At most `queue_size` tasks run at once. While every worker is busy the
/// dispatcher stops receiving, so further events wait in the channel and,
/// once it is full, the hook answers 503.
pub struct EventDispatcher {
    provisioner: ProfileProvisioner,
    rx: mpsc::Receiver<UserCreatedEvent>,
    workers: Arc<Semaphore>,
}

impl EventDispatcher {
    pub fn new(provisioner: ProfileProvisioner, queue_size: usize) -> (Self, EventQueue) {
        let queue_size = queue_size.max(1);
        let (tx, rx) = mpsc::channel(queue_size);
        let workers = Arc::new(Semaphore::new(queue_size));
        (
            Self {
                provisioner,
                rx,
                workers,
            },
            EventQueue { tx },
        )
    }

    /// Runs until every [`EventQueue`] clone is dropped, then waits for
    /// in-flight provisioning to finish.
    pub async fn run(mut self) {
        tracing::info!("User-created event dispatcher started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                event = self.rx.recv(), if self.workers.available_permits() > 0 => match event {
                    Some(event) => {
                        // Only this loop acquires, so a free permit is still free here.
                        let Ok(permit) = self.workers.clone().acquire_owned().await else {
                            break;
                        };
                        tracing::debug!(uid = %event.uid, "Dispatching user-created event");
                        let provisioner = self.provisioner.clone();
                        in_flight.spawn(async move {
                            provisioner.handle(event).await;
                            drop(permit);
                        });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Provisioning task panicked");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Provisioning task panicked");
            }
        }

        tracing::info!("User-created event dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{DocumentStore, MemoryStore};

    #[tokio::test]
    async fn provisions_queued_events_and_drains_on_close() {
        let store = MemoryStore::new();
        let provisioner = ProfileProvisioner::new(Arc::new(store.clone()));
        let (dispatcher, queue) = EventDispatcher::new(provisioner, 8);
        let handle = tokio::spawn(dispatcher.run());

        queue.enqueue(UserCreatedEvent::new("u1")).unwrap();
        queue.enqueue(UserCreatedEvent::new("u2")).unwrap();
        drop(queue);

        handle.await.unwrap();
        assert!(store.get_profile("u1").await.unwrap().is_some());
        assert!(store.get_inventory("u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn full_queue_is_rejected() {
        let provisioner = ProfileProvisioner::new(Arc::new(MemoryStore::new()));
        let (_dispatcher, queue) = EventDispatcher::new(provisioner, 1);

        queue.enqueue(UserCreatedEvent::new("u1")).unwrap();
        let err = queue.enqueue(UserCreatedEvent::new("u2")).unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn closed_queue_is_rejected() {
        let provisioner = ProfileProvisioner::new(Arc::new(MemoryStore::new()));
        let (dispatcher, queue) = EventDispatcher::new(provisioner, 4);
        drop(dispatcher);

        let err = queue.enqueue(UserCreatedEvent::new("u1")).unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }
}
