// Infrastructure module - Core background services and utilities
pub mod heartbeat;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatManager;
pub use task_manager::{TaskKind, TaskManager};
pub use timer::Timer;
