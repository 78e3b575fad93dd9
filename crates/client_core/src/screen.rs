use std::sync::Arc;

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::controller::{ClientContext, FetchController, LoadOutcome, Resource, ViewState};

/// A mounted screen. Owns the task of its in-flight request; dropping the
/// screen aborts that task so a late response can never touch the state of
/// a screen that is gone.
pub struct Screen<R: Resource> {
    controller: Arc<FetchController<R>>,
    inflight: Mutex<Option<JoinHandle<LoadOutcome>>>,
}

impl<R: Resource> Screen<R> {
    /// Mounts the screen without loading; forms submit through `trigger`.
    pub fn idle(resource: R, ctx: ClientContext) -> Self {
        Self {
            controller: Arc::new(FetchController::new(resource, ctx)),
            inflight: Mutex::new(None),
        }
    }

    /// Mounts the screen and starts its first load. Must be called inside a
    /// tokio runtime.
    pub fn mount(resource: R, ctx: ClientContext) -> Self {
        let screen = Self::idle(resource, ctx);
        screen.trigger();
        screen
    }

    pub fn controller(&self) -> &FetchController<R> {
        &self.controller
    }

    pub fn state(&self) -> ViewState<R::Data> {
        self.controller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<R::Data>> {
        self.controller.subscribe()
    }

    /// Starts a load in the background. Returns `false` when a request is
    /// already in flight.
    pub fn trigger(&self) -> bool {
        // Held by `settle` only while a request is in flight.
        let Ok(mut inflight) = self.inflight.try_lock() else {
            return false;
        };
        if inflight.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }
        let controller = Arc::clone(&self.controller);
        *inflight = Some(tokio::spawn(async move { controller.load().await }));
        true
    }

    pub fn retry(&self) -> bool {
        self.trigger()
    }

    /// Waits for the current request to finish. `None` when nothing was in
    /// flight or the task was aborted. The task stays owned by the screen
    /// while waiting, so unmounting still aborts it if this future is dropped.
    pub async fn settle(&self) -> Option<LoadOutcome> {
        let mut inflight = self.inflight.lock().await;
        let outcome = inflight.as_mut()?.await.ok();
        *inflight = None;
        outcome
    }

    /// Same as dropping the screen.
    pub fn unmount(self) {}
}

impl<R: Resource> Drop for Screen<R> {
    fn drop(&mut self) {
        if let Some(task) = self.inflight.get_mut().take() {
            if !task.is_finished() {
                task.abort();
                self.controller.mark_cancelled();
                debug!(endpoint = %self.controller.resource().endpoint(), "aborted in-flight request on unmount");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
