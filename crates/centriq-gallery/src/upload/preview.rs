use std::collections::HashMap;

use bytes::Bytes;
use centriq_core::models::PreviewHandle;

/// Live preview handles of queued items.
///
/// A handle resolves to the item's source bytes until it is revoked. The
/// pipeline revokes a handle when its item leaves the queue, so `live_count`
/// drops back to zero once a batch is cleared.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next: u64,
    live: HashMap<PreviewHandle, Bytes>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, data: Bytes) -> PreviewHandle {
        self.next += 1;
        let handle = PreviewHandle(self.next);
        self.live.insert(handle, data);
        handle
    }

    pub fn resolve(&self, handle: PreviewHandle) -> Option<Bytes> {
        self.live.get(&handle).cloned()
    }

    /// Release a handle. Returns false if it was already revoked.
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
