use crate::messaging::HandlerRegistry;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::sync::watch;

/// Delivers connection status changes one at a time, in the order they were
/// recorded.
///
/// Transitions are recorded with [`push`](Self::push) while the client's
/// state lock is held, which fixes their order. [`flush`](Self::flush) runs
/// without that lock: whichever caller holds the delivery lock drains the
/// queue, and every other caller leaves its value for that one. A status
/// handler that causes another transition sees it after the current round,
/// never interleaved with it.
pub struct StatusNotifier {
    pending: Mutex<VecDeque<bool>>,
    delivering: Mutex<()>,
    tx: watch::Sender<bool>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            pending: Mutex::new(VecDeque::new()),
            delivering: Mutex::new(()),
            tx,
        }
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<bool>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a transition for the next flush
    pub fn push(&self, connected: bool) {
        self.pending().push_back(connected);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Delivers recorded transitions to the watch channel and the status
    /// handlers. Returns at once if another caller is already delivering.
    pub fn flush(&self, handlers: &HandlerRegistry) {
        loop {
            let guard = match self.delivering.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };

            loop {
                // Bind first so the queue lock is released before handlers run
                let next = self.pending().pop_front();
                let Some(connected) = next else { break };
                self.tx.send_replace(connected);
                handlers.notify_status(connected);
            }
            drop(guard);

            // A value pushed after the last pop but before the unlock is ours
            if self.pending().is_empty() {
                return;
            }
        }
    }
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder(registry: &Arc<HandlerRegistry>) -> Arc<Mutex<Vec<bool>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.add_status_handler(Arc::new(move |connected| {
            sink.lock().unwrap().push(connected);
        }));
        seen
    }

    #[test]
    fn test_flush_delivers_in_push_order() {
        let registry = Arc::new(HandlerRegistry::new());
        let seen = recorder(&registry);
        let notifier = StatusNotifier::new();
        let rx = notifier.subscribe();

        notifier.push(true);
        notifier.push(false);
        notifier.flush(&registry);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!*rx.borrow());

        notifier.flush(&registry);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_transition_from_handler_waits_for_current_round() {
        let registry = Arc::new(HandlerRegistry::new());
        let notifier = Arc::new(StatusNotifier::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        {
            let notifier_ref = Arc::clone(&notifier);
            let registry_ref = Arc::downgrade(&registry);
            let order = Arc::clone(&order);
            registry.add_status_handler(Arc::new(move |connected| {
                order.lock().unwrap().push(("first", connected));
                if connected {
                    notifier_ref.push(false);
                    if let Some(registry) = registry_ref.upgrade() {
                        notifier_ref.flush(&registry);
                    }
                }
            }));
        }
        {
            let order = Arc::clone(&order);
            registry.add_status_handler(Arc::new(move |connected| {
                order.lock().unwrap().push(("second", connected));
            }));
        }

        notifier.push(true);
        notifier.flush(&registry);

        assert_eq!(
            *order.lock().unwrap(),
            vec![
                ("first", true),
                ("second", true),
                ("first", false),
                ("second", false),
            ]
        );
    }
}
