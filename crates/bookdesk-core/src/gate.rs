//! Deferred execution of destructive commands behind an explicit prompt.
//!
//! A `ConfirmationGate` holds at most one pending action. The caller shows a
//! blocking prompt while the gate is visible; `confirm` runs the action once
//! and keeps the gate busy until it settles, so repeated confirmations are
//! ignored. The list scroll position is captured when the prompt opens and
//! handed back when it closes.

use std::sync::{Mutex, MutexGuard};

use futures::future::BoxFuture;
use tracing::debug;

/// A deferred command. Its own failures are reported by whatever it drives
/// (the synchronizer's `error` flag), never by the gate.
pub type GateAction = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Text shown on the blocking prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub body: String,
}

impl Prompt {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Result of a call to [`ConfirmationGate::confirm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The stored action ran to completion.
    Ran,
    /// Nothing pending, or an action is already running.
    Ignored,
}

#[derive(Default)]
struct GateState {
    visible: bool,
    busy: bool,
    action: Option<GateAction>,
    prompt: Option<Prompt>,
    pinned_scroll: Option<usize>,
    restored_scroll: Option<usize>,
}

impl GateState {
    fn close(&mut self) {
        self.visible = false;
        self.action = None;
        self.prompt = None;
        self.restored_scroll = self.pinned_scroll.take();
    }
}

#[derive(Default)]
pub struct ConfirmationGate {
    state: Mutex<GateState>,
}

/// Clears `busy` and closes the gate when the running action settles,
/// including when its future is dropped part way.
struct BusyGuard<'a> {
    gate: &'a ConfirmationGate,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.lock();
        state.busy = false;
        state.close();
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `action` and open the prompt, pinning `scroll`.
    ///
    /// Replaces a pending, not yet confirmed action. Refused while an
    /// action is running.
    pub fn request(&self, prompt: Prompt, scroll: usize, action: GateAction) -> bool {
        let mut state = self.lock();
        if state.busy {
            debug!("Gate busy, refusing new request");
            return false;
        }
        if !state.visible {
            state.pinned_scroll = Some(scroll);
            state.restored_scroll = None;
        }
        debug!(title = %prompt.title, "Confirmation requested");
        state.visible = true;
        state.prompt = Some(prompt);
        state.action = Some(action);
        true
    }

    /// Run the stored action and close the gate once it settles.
    pub async fn confirm(&self) -> Confirmation {
        let action = {
            let mut state = self.lock();
            if !state.visible || state.busy {
                debug!(busy = state.busy, "Ignoring confirmation");
                return Confirmation::Ignored;
            }
            match state.action.take() {
                Some(action) => {
                    state.busy = true;
                    action
                }
                None => {
                    state.close();
                    return Confirmation::Ignored;
                }
            }
        };

        let _guard = BusyGuard { gate: self };
        action().await;
        Confirmation::Ran
    }

    /// Close the prompt without running the action.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.busy || !state.visible {
            return false;
        }
        debug!("Confirmation cancelled");
        state.close();
        true
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn prompt(&self) -> Option<Prompt> {
        self.lock().prompt.clone()
    }

    /// Scroll position to hold the page at while the prompt is open.
    pub fn pinned_scroll(&self) -> Option<usize> {
        self.lock().pinned_scroll
    }

    /// Scroll position captured when the last prompt opened, once.
    pub fn take_restored_scroll(&self) -> Option<usize> {
        self.lock().restored_scroll.take()
    }
}
