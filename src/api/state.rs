//! API shared state

use crate::actors::retention::RetentionHandle;
use crate::store::ComponentStore;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// The component store every route reads from and writes to
    pub store: ComponentStore,

    /// Handle to the retention actor, for stats
    pub retention: RetentionHandle,
}

impl ApiState {
    pub fn new(store: ComponentStore, retention: RetentionHandle) -> Self {
        Self { store, retention }
    }
}
