use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::EventError,
    lockout::AccountId,
    permit::{Permit, PermitId, PermitStatus},
};

/// Represents events that can be emitted by the event bus
///
/// Events notify interested parties about changes in the system state:
/// permit lifecycle changes (creation, status transitions) and
/// security-related events (login failures, account lockouts). They feed
/// audit logging and operational alerting; no component in this crate
/// depends on a handler running.
#[derive(Debug, Clone)]
pub enum Event {
    // Permit lifecycle events
    PermitCreated(Permit),

    /// Emitted after a transition is persisted. Idempotent no-op
    /// transitions are not re-emitted.
    PermitStatusChanged {
        permit_id: PermitId,
        from: PermitStatus,
        to: PermitStatus,
        timestamp: DateTime<Utc>,
    },

    // Security events for brute force protection
    /// Emitted when a login attempt fails.
    LoginFailed {
        account_id: AccountId,
        /// Consecutive failed attempts after this one
        failed_attempts: i64,
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an account becomes locked due to too many failed
    /// attempts. Security-critical; should trigger alerts.
    AccountLocked {
        account_id: AccountId,
        failed_attempts: i64,
        locked_until: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a successful login clears prior failures.
    AccountUnlocked {
        account_id: AccountId,
        timestamp: DateTime<Utc>,
    },
}

/// A trait for handling events emitted by the event bus
///
/// Implementors can be registered with the [`EventBus`] to receive and
/// process events. The handler is called asynchronously for each event
/// emitted; a handler error is propagated back through the bus.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &Event) -> Result<(), EventError>;
}

/// Event bus that can emit events and register event handlers
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus with no handlers
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register an event handler with the event bus
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to all registered handlers
    pub async fn emit(&self, event: &Event) -> Result<(), EventError> {
        for handler in self.handlers.read().await.iter() {
            handler.handle_event(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            Err(EventError::HandlerError("boom".to_string()))
        }
    }

    fn sample_event() -> Event {
        Event::AccountUnlocked {
            account_id: AccountId::new_random(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_all_handlers() {
        let bus = EventBus::new();
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
        });
        bus.register(handler.clone()).await;
        bus.register(Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
        }))
        .await;

        bus.emit(&sample_event()).await.unwrap();
        bus.emit(&sample_event()).await.unwrap();
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let bus = EventBus::new();
        bus.register(Arc::new(FailingHandler)).await;

        let result = bus.emit(&sample_event()).await;
        assert!(matches!(result, Err(EventError::HandlerError(_))));
    }
}
