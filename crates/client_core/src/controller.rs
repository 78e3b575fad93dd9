//! Session-bound fetch controller: one request per load, its outcome
//! reconciled into the screen's view state.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::error::ViewError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::{Endpoint, MarketplaceApi},
    classify::classify,
    error::ClientError,
    navigation::Navigator,
    session::SessionContext,
};

/// Collaborators shared by every screen of a running client.
#[derive(Clone)]
pub struct ClientContext {
    pub api: Arc<dyn MarketplaceApi>,
    pub session: Arc<SessionContext>,
    pub navigator: Navigator,
    pub booking_redirect_delay: Duration,
}

/// What a screen renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ViewError>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(ViewError),
    /// A request for this screen was already in flight; nothing was sent.
    Busy,
}

/// The data need of one screen.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Data: Clone + Send + Sync + 'static;

    fn endpoint(&self) -> Endpoint;

    /// Issues the request. Local validation must happen before any call on
    /// `ctx.api`.
    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError>;

    /// Runs after the success state has been published.
    async fn on_success(&self, _data: &Self::Data, _ctx: &ClientContext) {}
}

pub struct FetchController<R: Resource> {
    resource: R,
    ctx: ClientContext,
    state: watch::Sender<ViewState<R::Data>>,
}

impl<R: Resource> FetchController<R> {
    pub fn new(resource: R, ctx: ClientContext) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            resource,
            ctx,
            state,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn state(&self) -> ViewState<R::Data> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<R::Data>> {
        self.state.subscribe()
    }

    pub async fn load(&self) -> LoadOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            state.error = None;
            true
        });
        let endpoint = self.resource.endpoint();
        if !started {
            debug!(%endpoint, "load ignored: request already in flight");
            return LoadOutcome::Busy;
        }

        let mut guard = LoadingGuard {
            state: &self.state,
            armed: true,
        };
        info!(%endpoint, "loading");
        match self.resource.fetch(&self.ctx).await {
            Ok(data) => {
                self.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.loading = false;
                    state.error = None;
                });
                guard.armed = false;
                info!(%endpoint, "load succeeded");
                self.resource.on_success(&data, &self.ctx).await;
                LoadOutcome::Loaded
            }
            Err(err) => {
                let view_error = classify(endpoint, &err);
                warn!(%endpoint, kind = ?view_error.kind, error = %err, "load failed");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(view_error.clone());
                });
                guard.armed = false;
                LoadOutcome::Failed(view_error)
            }
        }
    }

    /// User-initiated re-run of `load` with the same parameters.
    pub async fn retry(&self) -> LoadOutcome {
        self.load().await
    }

    /// Clears the loading flag after the in-flight request was aborted.
    pub(crate) fn mark_cancelled(&self) {
        clear_loading(&self.state);
    }
}

fn clear_loading<T>(state: &watch::Sender<ViewState<T>>) {
    state.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
}

/// Clears `loading` when a `load` future is dropped before it published an
/// outcome.
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<ViewState<T>>,
    armed: bool,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            clear_loading(self.state);
            debug!("load dropped before completion");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
