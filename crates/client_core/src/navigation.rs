use shared::domain::DesignId;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    DesignDetails { id: DesignId },
    Booking { design_id: DesignId },
}

/// Side effects published by controllers for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Push `Route` on top of the current screen.
    Navigate(Route),
    /// Replace the current screen with `Route`.
    Replace(Route),
    Notice(String),
}

#[derive(Clone)]
pub struct Navigator {
    events: broadcast::Sender<ClientEvent>,
}

impl Navigator {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: ClientEvent) {
        debug!(?event, "publishing client event");
        // Nobody listening is fine: headless callers ignore navigation.
        let _ = self.events.send(event);
    }

    pub fn navigate(&self, route: Route) {
        self.publish(ClientEvent::Navigate(route));
    }

    pub fn replace(&self, route: Route) {
        self.publish(ClientEvent::Replace(route));
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.publish(ClientEvent::Notice(message.into()));
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
