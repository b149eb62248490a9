// SPDX-License-Identifier: MIT

//! Panic capture shared by every crate that runs caller-supplied code under
//! `catch_unwind` (worker supervision, scheduler fires, event bus handlers).
//! `catch_unwind` recovers the payload but not a backtrace, so a process-wide
//! hook stashes one per thread at the moment the panic fires; the recovering
//! task reads it back immediately after `catch_unwind` returns.

use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Installs the backtrace-capturing panic hook, once per process. Safe to
/// call from every crate that needs it; only the first call takes effect.
pub fn install_hook() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = std::backtrace::Backtrace::force_capture();
            LAST_BACKTRACE.with(|cell| *cell.borrow_mut() = Some(backtrace.to_string()));
            previous(info);
        }));
    });
}

/// Returns the backtrace captured by the most recent panic on this thread,
/// consuming it. Call immediately after a `catch_unwind` that recovered one.
pub fn take_backtrace() -> String {
    LAST_BACKTRACE.with(|cell| cell.borrow_mut().take()).unwrap_or_else(|| "<no backtrace>".into())
}

/// Renders a `catch_unwind` payload into a human-readable message.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
