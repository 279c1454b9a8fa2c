//! A thread-safe handle to a protocol instance.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    bridge::RelayBridge, call::Call, context::CallContext, errors::ProtocolResult,
    output::CallOutput,
};

/// A cloneable handle that serializes every call on the underlying [`RelayBridge`].
///
/// Each call runs inside one critical section from its first check to its last write, so two
/// callers can never both pass the same availability check.
#[derive(Debug, Clone)]
pub struct SharedBridge {
    inner: Arc<Mutex<RelayBridge>>,
}

impl SharedBridge {
    /// Wraps `bridge`.
    pub fn new(bridge: RelayBridge) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bridge)),
        }
    }

    /// Executes `call` atomically.
    pub fn execute(&self, ctx: &CallContext, call: Call) -> ProtocolResult<CallOutput> {
        self.inner.lock().execute(ctx, call)
    }

    /// Runs `f` against a consistent view of the instance.
    pub fn read<R>(&self, f: impl FnOnce(&RelayBridge) -> R) -> R {
        f(&self.inner.lock())
    }
}

impl From<RelayBridge> for SharedBridge {
    fn from(bridge: RelayBridge) -> Self {
        Self::new(bridge)
    }
}
