// Messaging module - Message tags, handler registry and routing
pub mod event;
pub mod router;

pub use event::MessageType;
pub use router::{HandlerRegistry, MessageHandler, MessageRouter, StatusHandler, Subscription};
