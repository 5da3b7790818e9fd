//! Route handlers, grouped by resource

pub mod components;
pub mod health;
pub mod scopes;
pub mod stats;
pub mod summary;
