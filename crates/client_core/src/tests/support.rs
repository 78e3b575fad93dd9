//! In-process `MarketplaceApi` double shared by the controller, resource and
//! screen tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{Credential, DesignId},
    protocol::{
        BookingReceipt, BookingRequest, Design, LoginRequest, LogoutResponse, Notification,
        RegisterRequest, TokenResponse,
    },
};
use tokio::sync::Notify;

use crate::{
    api::{Endpoint, MarketplaceApi},
    controller::ClientContext,
    credential_store::{CredentialStore, MemoryCredentialStore},
    error::ClientError,
    navigation::Navigator,
    session::SessionContext,
};

pub(crate) const REDIRECT_DELAY: Duration = Duration::from_millis(40);

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(Value),
    Status(u16, Option<&'static str>),
    Timeout,
    Unreachable,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    replies: Mutex<HashMap<Endpoint, VecDeque<Reply>>>,
    calls: Mutex<Vec<Endpoint>>,
    credentials: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
    gate: Option<Arc<Notify>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call parks until the returned `Notify` is signalled once per call.
    pub(crate) fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let api = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (api, gate)
    }

    /// Queues replies for `endpoint`; the last one keeps answering.
    pub(crate) fn on(self, endpoint: Endpoint, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .expect("replies")
            .entry(endpoint)
            .or_default()
            .extend(replies);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    pub(crate) fn credentials_seen(&self) -> Vec<String> {
        self.credentials.lock().expect("credentials").clone()
    }

    pub(crate) fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().expect("bodies").clone()
    }

    /// Resolves once at least `count` calls reached the fake.
    pub(crate) async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.call_count() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("call never arrived");
    }

    fn next_reply(&self, endpoint: Endpoint) -> Reply {
        let mut replies = self.replies.lock().expect("replies");
        let queue = replies
            .get_mut(&endpoint)
            .unwrap_or_else(|| panic!("no reply scripted for {endpoint}"));
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.unwrap_or_else(|| panic!("no reply scripted for {endpoint}"))
    }

    async fn answer<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        credential: Option<&Credential>,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        self.calls.lock().expect("calls").push(endpoint);
        if let Some(credential) = credential {
            self.credentials
                .lock()
                .expect("credentials")
                .push(credential.expose().to_string());
        }
        if let Some(body) = body {
            self.bodies.lock().expect("bodies").push(body);
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let reply = self.next_reply(endpoint);

        match reply {
            Reply::Json(value) => Ok(serde_json::from_value(value).expect("scripted reply")),
            Reply::Status(status, detail) => Err(ClientError::Status {
                endpoint,
                status,
                detail: detail.map(str::to_string),
            }),
            Reply::Timeout => Err(ClientError::Timeout { endpoint }),
            Reply::Unreachable => Err(ClientError::Unreachable {
                endpoint,
                reason: "connection refused".into(),
            }),
        }
    }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
    async fn list_designs(&self, credential: &Credential) -> Result<Vec<Design>, ClientError> {
        self.answer(Endpoint::ListDesigns, Some(credential), None)
            .await
    }

    async fn get_design(
        &self,
        credential: &Credential,
        id: DesignId,
    ) -> Result<Design, ClientError> {
        self.answer(Endpoint::GetDesign(id), Some(credential), None)
            .await
    }

    async fn create_booking(
        &self,
        credential: &Credential,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ClientError> {
        let body = serde_json::to_value(request).expect("booking body");
        self.answer(Endpoint::CreateBooking, Some(credential), Some(body))
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ClientError> {
        let body = serde_json::to_value(request).expect("login body");
        self.answer(Endpoint::Login, None, Some(body)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ClientError> {
        let body = serde_json::to_value(request).expect("register body");
        self.answer(Endpoint::Register, None, Some(body)).await
    }

    async fn logout(&self, credential: &Credential) -> Result<LogoutResponse, ClientError> {
        self.answer(Endpoint::Logout, Some(credential), None).await
    }

    async fn list_bookings(
        &self,
        credential: &Credential,
    ) -> Result<Vec<BookingReceipt>, ClientError> {
        self.answer(Endpoint::ListBookings, Some(credential), None)
            .await
    }

    async fn list_notifications(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Notification>, ClientError> {
        self.answer(Endpoint::ListNotifications, Some(credential), None)
            .await
    }
}

pub(crate) fn design(id: i64) -> Value {
    json!({
        "id": id,
        "designer": {"username": "mira", "first_name": "Mira", "last_name": "Sol"},
        "title": format!("Design {id}"),
        "description": "Open plan",
        "features": "3D renders",
        "price": "450.00",
        "image": ""
    })
}

pub(crate) struct Harness {
    pub(crate) ctx: ClientContext,
    pub(crate) api: Arc<FakeApi>,
    pub(crate) store: Arc<MemoryCredentialStore>,
}

impl Harness {
    pub(crate) async fn new(api: FakeApi, token: Option<&str>) -> Self {
        let store = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_credential(Credential::new(token)),
            None => MemoryCredentialStore::new(),
        });
        let session = SessionContext::restore(store.clone())
            .await
            .expect("restore");
        let api = Arc::new(api);
        let ctx = ClientContext {
            api: api.clone(),
            session: Arc::new(session),
            navigator: Navigator::new(),
            booking_redirect_delay: REDIRECT_DELAY,
        };
        Self { ctx, api, store }
    }

    pub(crate) async fn stored_token(&self) -> Option<String> {
        self.store
            .load()
            .await
            .expect("load")
            .map(|credential| credential.expose().to_string())
    }
}
