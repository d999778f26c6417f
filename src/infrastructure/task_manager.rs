use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Role of a background task owned by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Handshake followed by the read/dispatch loop
    Connection,
    /// Periodic ping sender
    Heartbeat,
    /// Pending backoff timer
    Reconnect,
}

/// Manages background tasks with proper lifecycle handling.
///
/// At most one task per [`TaskKind`] is tracked; spawning a new task of a
/// kind aborts the previous one.
#[derive(Default)]
pub struct TaskManager {
    handles: HashMap<TaskKind, JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task and track it under `kind`
    pub fn spawn<F>(&mut self, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }

    /// Abort the task of the given kind, if any
    pub fn abort(&mut self, kind: TaskKind) {
        if let Some(handle) = self.handles.remove(&kind) {
            handle.abort();
        }
    }

    /// Stop tracking a task without aborting it
    pub fn release(&mut self, kind: TaskKind) {
        self.handles.remove(&kind);
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_tracking(&self, kind: TaskKind) -> bool {
        self.handles
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_replaces_and_aborts_previous() {
        let mut tasks = TaskManager::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        tasks.spawn(TaskKind::Heartbeat, async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(());
        });
        tasks.spawn(TaskKind::Heartbeat, async {});

        // The first task was aborted, so its sender is dropped without sending
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_abort_all_clears_everything() {
        let mut tasks = TaskManager::new();
        tasks.spawn(TaskKind::Connection, std::future::pending());
        tasks.spawn(TaskKind::Reconnect, std::future::pending());
        assert!(tasks.is_tracking(TaskKind::Connection));

        tasks.abort_all();

        assert!(!tasks.is_tracking(TaskKind::Connection));
        assert!(!tasks.is_tracking(TaskKind::Reconnect));
    }
}
