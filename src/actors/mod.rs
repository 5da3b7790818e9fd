//! Background actors
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle that sends commands over an mpsc channel.
//!
//! ## Actor Types
//!
//! - **RetentionActor**: Periodically deletes components that stopped reporting
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Events**: The store publishes [`messages::ChangeEvent`]s on a broadcast channel
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod messages;
pub mod retention;
