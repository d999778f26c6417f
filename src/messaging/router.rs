use super::MessageType;
use crate::types::message::InboundMessage;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with every inbound message of the registered type
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync + 'static>;

/// Callback invoked with `true` on connect and `false` on disconnect
pub type StatusHandler = Arc<dyn Fn(bool) + Send + Sync + 'static>;

#[derive(Default)]
struct Registrations {
    next_id: u64,
    messages: HashMap<MessageType, Vec<(u64, MessageHandler)>>,
    status: Vec<(u64, StatusHandler)>,
}

impl Registrations {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Handler table shared by the client and its router.
///
/// Registrations are kept in insertion order per message type and are
/// identified by a unique id, so registering the same closure twice yields
/// two independent registrations. The table is never cleared on reconnect.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: Mutex<Registrations>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registrations> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_message_handler(
        self: &Arc<Self>,
        kind: MessageType,
        handler: MessageHandler,
    ) -> Subscription {
        let kind = kind.normalize();
        let mut inner = self.lock();
        let id = inner.next_id();
        inner
            .messages
            .entry(kind.clone())
            .or_default()
            .push((id, handler));

        Subscription {
            registry: Arc::downgrade(self),
            slot: Slot::Message(kind),
            id,
        }
    }

    pub fn add_status_handler(self: &Arc<Self>, handler: StatusHandler) -> Subscription {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.status.push((id, handler));

        Subscription {
            registry: Arc::downgrade(self),
            slot: Slot::Status,
            id,
        }
    }

    fn remove(&self, slot: &Slot, id: u64) -> bool {
        let mut inner = self.lock();
        match slot {
            Slot::Message(kind) => {
                let Some(handlers) = inner.messages.get_mut(kind) else {
                    return false;
                };
                let before = handlers.len();
                handlers.retain(|(handler_id, _)| *handler_id != id);
                let removed = handlers.len() != before;
                if handlers.is_empty() {
                    inner.messages.remove(kind);
                }
                removed
            }
            Slot::Status => {
                let before = inner.status.len();
                inner.status.retain(|(handler_id, _)| *handler_id != id);
                inner.status.len() != before
            }
        }
    }

    /// Snapshot of the handlers for `kind`, in registration order
    pub fn message_handlers(&self, kind: &MessageType) -> Vec<MessageHandler> {
        let kind = kind.clone().normalize();
        self.lock()
            .messages
            .get(&kind)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub fn status_handlers(&self) -> Vec<StatusHandler> {
        self.lock()
            .status
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn handler_count(&self, kind: &MessageType) -> usize {
        self.lock().messages.get(kind).map_or(0, Vec::len)
    }

    /// Invokes every status handler. The table lock is released first so
    /// handlers may call back into the client.
    pub fn notify_status(&self, connected: bool) {
        for handler in self.status_handlers() {
            if catch_unwind(AssertUnwindSafe(|| handler(connected))).is_err() {
                tracing::error!("Status handler panicked (connected={})", connected);
            }
        }
    }
}

enum Slot {
    Message(MessageType),
    Status,
}

/// Handle returned by `on` / `on_status_change`.
///
/// Dropping the handle keeps the registration alive; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    registry: Weak<HandlerRegistry>,
    slot: Slot,
    id: u64,
}

impl Subscription {
    /// Removes this registration and only this one.
    ///
    /// Returns `false` if it was already removed or the client is gone.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.slot, self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = match &self.slot {
            Slot::Message(kind) => kind.as_str(),
            Slot::Status => "status",
        };
        f.debug_struct("Subscription")
            .field("slot", &slot)
            .field("id", &self.id)
            .finish()
    }
}

/// Routes incoming frames to registered handlers
pub struct MessageRouter {
    handlers: Arc<HandlerRegistry>,
}

impl MessageRouter {
    pub fn new(handlers: Arc<HandlerRegistry>) -> Self {
        Self { handlers }
    }

    /// Parses a text frame and routes it. Malformed frames are logged and
    /// dropped.
    pub fn route_text(&self, text: &str) {
        match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => self.route(&message),
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, text);
            }
        }
    }

    /// Routes a message to every handler registered for its type
    pub fn route(&self, message: &InboundMessage) {
        let handlers = self.handlers.message_handlers(&message.kind);
        if handlers.is_empty() {
            tracing::debug!("No handlers for message type {}", message.kind);
            return;
        }

        tracing::debug!(
            "Dispatching {} message id={} to {} handler(s)",
            message.kind,
            message.id,
            handlers.len()
        );

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(message))).is_err() {
                tracing::error!(
                    "Handler for message type {} panicked on id={}",
                    message.kind,
                    message.id
                );
            }
        }
    }
}
