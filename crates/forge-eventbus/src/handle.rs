// SPDX-License-Identifier: MIT

//! The return value of `subscribe`: an idempotent, safe-to-drop unsubscribe
//! token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use crate::bus::{Inner, SubscriberKey};

/// Handle returned by [`crate::EventBus::subscribe`]. Calling
/// [`unsubscribe`](Self::unsubscribe) more than once, or on a
/// [`Self::noop`] handle, is a no-op.
pub struct UnsubscribeHandle {
    target: Option<(Weak<Inner>, SubscriberKey, u64)>,
    done: AtomicBool,
}

impl UnsubscribeHandle {
    pub(crate) fn new(bus: Weak<Inner>, key: SubscriberKey, id: u64) -> Self {
        UnsubscribeHandle { target: Some((bus, key, id)), done: AtomicBool::new(false) }
    }

    /// A handle that does nothing when unsubscribed, for callers that want
    /// an unsubscribe handle without an active subscription behind it.
    pub fn noop() -> Self {
        UnsubscribeHandle { target: None, done: AtomicBool::new(false) }
    }

    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some((bus, key, id)) = &self.target else { return };
        let Some(inner) = bus.upgrade() else { return };
        if let Some(list) = inner.subscribers.write().get_mut(key) {
            list.retain(|s| s.id != *id);
        }
    }
}
