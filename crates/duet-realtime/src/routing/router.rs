//! Message router: validate, persist once, then deliver.

use std::sync::Arc;

use thiserror::Error;

use duet_core::error::{AppError, ErrorKind};
use duet_core::types::id::UserId;
use duet_database::ChatStore;
use duet_entity::message::ChatMessage;

use super::validator::{ChatPayload, ValidationError, validate};
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;

/// Outcome of routing one chat message.
#[derive(Debug, Clone)]
pub struct RoutedMessage {
    /// The message as persisted.
    pub message: ChatMessage,
    /// `new_message` was queued to the receiver.
    pub delivered_to_receiver: bool,
    /// `message_sent` was queued to the sender.
    pub confirmed_to_sender: bool,
}

/// Why a chat message was not routed.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Payload broke a validation rule; nothing was persisted.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The store write failed; nothing was delivered.
    #[error("failed to persist message: {0}")]
    Store(#[source] AppError),
}

/// Validates, persists, and delivers chat messages.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn ChatStore>,
    metrics: Arc<EngineMetrics>,
}

impl MessageRouter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn ChatStore>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            registry,
            store,
            metrics,
        }
    }

    /// Route a payload sent by `authenticated`.
    ///
    /// A receiver with no user record is a `receiverId` violation. The
    /// receiver gets `new_message` only if bound and live. The sender gets
    /// `message_sent` on its bound connection whenever that is live.
    pub async fn route(
        &self,
        authenticated: UserId,
        payload: &ChatPayload,
    ) -> Result<RoutedMessage, RouteError> {
        let new_message =
            validate(payload, authenticated).map_err(|e| self.reject(authenticated, e))?;

        match self.store.get_user(new_message.receiver_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(self.reject(
                    authenticated,
                    ValidationError::single("receiverId", "no such user"),
                ));
            }
            Err(e) => return Err(self.store_failure(authenticated, e)),
        }

        let message = self
            .store
            .create_message(new_message)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => self.reject(
                    authenticated,
                    ValidationError::single("senderId", "no such user"),
                ),
                _ => self.store_failure(authenticated, e),
            })?;
        self.metrics.record_persisted();

        let delivered_to_receiver = self.deliver(
            message.receiver_id,
            OutboundEvent::NewMessage {
                message: message.clone(),
            },
        );
        let confirmed_to_sender = self.deliver(
            message.sender_id,
            OutboundEvent::MessageSent {
                message: message.clone(),
            },
        );

        tracing::debug!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            delivered_to_receiver,
            confirmed_to_sender,
            "Routed chat message"
        );

        Ok(RoutedMessage {
            message,
            delivered_to_receiver,
            confirmed_to_sender,
        })
    }

    fn reject(&self, sender_id: UserId, error: ValidationError) -> RouteError {
        self.metrics.record_validation_failure();
        tracing::info!(%sender_id, error = %error, "Rejected chat message");
        RouteError::Invalid(error)
    }

    fn store_failure(&self, sender_id: UserId, error: AppError) -> RouteError {
        self.metrics.record_store_failure();
        tracing::warn!(%sender_id, error = %error, "Failed to persist chat message");
        RouteError::Store(error)
    }

    fn deliver(&self, user_id: UserId, event: OutboundEvent) -> bool {
        let delivered = match self.registry.lookup(user_id) {
            Some(handle) if handle.is_alive() => handle.send(event).is_ok(),
            _ => false,
        };
        self.metrics.record_delivery(delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_database::MemoryChatStore;
    use duet_entity::message::MessageType;
    use duet_entity::user::CreateUser;
    use tokio::sync::mpsc;

    use crate::connection::handle::ConnectionHandle;

    struct Fixture {
        store: Arc<MemoryChatStore>,
        registry: Arc<ConnectionRegistry>,
        router: MessageRouter,
        alice: UserId,
        bob: UserId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryChatStore::new());
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let user = store
                .create_user(CreateUser {
                    username: name.to_string(),
                    password_hash: String::new(),
                    display_name: None,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let registry = Arc::new(ConnectionRegistry::new());
        let router = MessageRouter::new(
            registry.clone(),
            store.clone(),
            Arc::new(EngineMetrics::new()),
        );
        Fixture {
            store,
            registry,
            router,
            alice: ids[0],
            bob: ids[1],
        }
    }

    fn connect(
        registry: &ConnectionRegistry,
        user: UserId,
    ) -> mpsc::Receiver<OutboundEvent> {
        let (tx, rx) = mpsc::channel(8);
        registry.bind(user, Arc::new(ConnectionHandle::new(tx)));
        rx
    }

    fn payload(to: UserId, content: &str) -> ChatPayload {
        ChatPayload {
            receiver_id: Some(to.to_string()),
            content: Some(content.to_string()),
            message_type: Some("text".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_both_online_receive_identical_message() {
        let f = fixture().await;
        let mut alice_rx = connect(&f.registry, f.alice);
        let mut bob_rx = connect(&f.registry, f.bob);

        let routed = f.router.route(f.alice, &payload(f.bob, "hi")).await.unwrap();
        assert!(routed.delivered_to_receiver);
        assert!(routed.confirmed_to_sender);
        assert!(!routed.message.is_read);
        assert_eq!(routed.message.message_type, MessageType::Text);

        assert_eq!(
            bob_rx.recv().await,
            Some(OutboundEvent::NewMessage {
                message: routed.message.clone()
            })
        );
        assert_eq!(
            alice_rx.recv().await,
            Some(OutboundEvent::MessageSent {
                message: routed.message.clone()
            })
        );
        assert_eq!(f.store.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_offline_receiver_still_persists_and_confirms() {
        let f = fixture().await;
        let mut alice_rx = connect(&f.registry, f.alice);

        let routed = f.router.route(f.alice, &payload(f.bob, "later")).await.unwrap();
        assert!(!routed.delivered_to_receiver);
        assert!(routed.confirmed_to_sender);
        assert!(matches!(
            alice_rx.recv().await,
            Some(OutboundEvent::MessageSent { .. })
        ));
        assert_eq!(f.store.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_dead_receiver_is_skipped() {
        let f = fixture().await;
        let bob_rx = connect(&f.registry, f.bob);
        drop(bob_rx);

        let routed = f.router.route(f.alice, &payload(f.bob, "hello?")).await.unwrap();
        assert!(!routed.delivered_to_receiver);
        assert!(!routed.confirmed_to_sender);
    }

    #[tokio::test]
    async fn test_invalid_payload_persists_nothing() {
        let f = fixture().await;
        let mut bob_rx = connect(&f.registry, f.bob);

        let err = f
            .router
            .route(f.alice, &payload(f.bob, &"x".repeat(1001)))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Invalid(ref v) if v.has_field("content")));
        assert_eq!(f.store.message_count().await, 0);
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_receiver_is_a_validation_failure() {
        let f = fixture().await;
        let mut alice_rx = connect(&f.registry, f.alice);
        let metrics = Arc::new(EngineMetrics::new());
        let router = MessageRouter::new(f.registry.clone(), f.store.clone(), metrics.clone());

        let err = router
            .route(f.alice, &payload(UserId::new(), "anyone there?"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Invalid(ref v) if v.has_field("receiverId")));
        assert_eq!(f.store.message_count().await, 0);
        assert!(alice_rx.try_recv().is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.validation_failures, 1);
        assert_eq!(snapshot.store_failures, 0);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_a_validation_failure() {
        let f = fixture().await;
        let stranger = UserId::new();

        let err = f
            .router
            .route(stranger, &payload(f.bob, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Invalid(ref v) if v.has_field("senderId")));
        assert_eq!(f.store.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_delivers_nothing() {
        let f = fixture().await;
        let mut alice_rx = connect(&f.registry, f.alice);
        let mut bob_rx = connect(&f.registry, f.bob);
        f.store.set_unavailable(true);

        let err = f.router.route(f.alice, &payload(f.bob, "hi")).await.unwrap_err();
        assert!(matches!(err, RouteError::Store(ref e) if e.is_store_failure()));
        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_err());
    }
}
