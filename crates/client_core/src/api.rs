use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Credential, DesignId},
    error::server_detail,
    protocol::{
        BookingReceipt, BookingRequest, Design, Listing, LoginRequest, LogoutResponse,
        Notification, RegisterRequest, TokenResponse,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{config::Settings, error::ClientError};

/// Remote operations consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListDesigns,
    GetDesign(DesignId),
    CreateBooking,
    Login,
    Register,
    Logout,
    ListBookings,
    ListNotifications,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::ListDesigns
            | Endpoint::GetDesign(_)
            | Endpoint::ListBookings
            | Endpoint::ListNotifications => Method::GET,
            Endpoint::CreateBooking | Endpoint::Login | Endpoint::Register | Endpoint::Logout => {
                Method::POST
            }
        }
    }

    /// Path relative to the API base url.
    pub fn path(self) -> String {
        match self {
            Endpoint::ListDesigns => "api/designs/".to_string(),
            Endpoint::GetDesign(id) => format!("api/designs/{id}/"),
            Endpoint::CreateBooking | Endpoint::ListBookings => "api/bookings/".to_string(),
            Endpoint::Login => "api-token-auth/".to_string(),
            Endpoint::Register => "api/register/".to_string(),
            Endpoint::Logout => "api/logout/".to_string(),
            Endpoint::ListNotifications => "api/notifications/".to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method(), self.path())
    }
}

#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn list_designs(&self, credential: &Credential) -> Result<Vec<Design>, ClientError>;
    async fn get_design(
        &self,
        credential: &Credential,
        id: DesignId,
    ) -> Result<Design, ClientError>;
    async fn create_booking(
        &self,
        credential: &Credential,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ClientError>;
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ClientError>;
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ClientError>;
    async fn logout(&self, credential: &Credential) -> Result<LogoutResponse, ClientError>;
    async fn list_bookings(
        &self,
        credential: &Credential,
    ) -> Result<Vec<BookingReceipt>, ClientError>;
    async fn list_notifications(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Notification>, ClientError>;
}

/// reqwest-backed client for the marketplace REST API.
pub struct MarketplaceClient {
    http: Client,
    base_url: Url,
}

impl MarketplaceClient {
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.base_url()?, settings.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(
        &self,
        endpoint: Endpoint,
        credential: Option<&Credential>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base_url
            .join(&endpoint.path())
            .map_err(|err| ClientError::Transport {
                endpoint,
                reason: err.to_string(),
            })?;
        let builder = self.http.request(endpoint.method(), url);
        Ok(match credential {
            Some(credential) => builder.header(AUTHORIZATION, credential.authorization_header()),
            None => builder,
        })
    }

    async fn send_raw(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<Vec<u8>, ClientError> {
        debug!(%endpoint, "sending marketplace request");
        let response = builder
            .send()
            .await
            .map_err(|err| map_send_error(endpoint, err))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .bytes()
                .await
                .ok()
                .and_then(|body| serde_json::from_slice::<serde_json::Value>(&body).ok())
                .and_then(|body| server_detail(&body));
            warn!(%endpoint, status = status.as_u16(), ?detail, "marketplace request rejected");
            return Err(ClientError::Status {
                endpoint,
                status: status.as_u16(),
                detail,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| map_body_error(endpoint, err))?;
        debug!(%endpoint, status = status.as_u16(), bytes = body.len(), "marketplace request succeeded");
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send_raw(endpoint, builder).await?;
        serde_json::from_slice(&body).map_err(|err| ClientError::Decode {
            endpoint,
            reason: err.to_string(),
        })
    }

    async fn fetch_listing<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        credential: &Credential,
    ) -> Result<Vec<T>, ClientError> {
        let builder = self.request(endpoint, Some(credential))?;
        let listing: Listing<T> = self.send_json(endpoint, builder).await?;
        Ok(listing.into_items())
    }
}

#[async_trait]
impl MarketplaceApi for MarketplaceClient {
    async fn list_designs(&self, credential: &Credential) -> Result<Vec<Design>, ClientError> {
        self.fetch_listing(Endpoint::ListDesigns, credential).await
    }

    async fn get_design(
        &self,
        credential: &Credential,
        id: DesignId,
    ) -> Result<Design, ClientError> {
        let endpoint = Endpoint::GetDesign(id);
        let builder = self.request(endpoint, Some(credential))?;
        self.send_json(endpoint, builder).await
    }

    async fn create_booking(
        &self,
        credential: &Credential,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ClientError> {
        let endpoint = Endpoint::CreateBooking;
        let builder = self.request(endpoint, Some(credential))?.json(request);
        self.send_json(endpoint, builder).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ClientError> {
        let endpoint = Endpoint::Login;
        let builder = self.request(endpoint, None)?.json(request);
        self.send_json(endpoint, builder).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ClientError> {
        let endpoint = Endpoint::Register;
        let builder = self.request(endpoint, None)?.json(request);
        self.send_json(endpoint, builder).await
    }

    async fn logout(&self, credential: &Credential) -> Result<LogoutResponse, ClientError> {
        let endpoint = Endpoint::Logout;
        let builder = self.request(endpoint, Some(credential))?;
        let body = self.send_raw(endpoint, builder).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(LogoutResponse::default());
        }
        serde_json::from_slice(&body).map_err(|err| ClientError::Decode {
            endpoint,
            reason: err.to_string(),
        })
    }

    async fn list_bookings(
        &self,
        credential: &Credential,
    ) -> Result<Vec<BookingReceipt>, ClientError> {
        self.fetch_listing(Endpoint::ListBookings, credential).await
    }

    async fn list_notifications(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Notification>, ClientError> {
        self.fetch_listing(Endpoint::ListNotifications, credential)
            .await
    }
}

/// Failures before any response arrived.
fn map_send_error(endpoint: Endpoint, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout { endpoint }
    } else if err.is_builder() {
        ClientError::Transport {
            endpoint,
            reason: err.to_string(),
        }
    } else {
        ClientError::Unreachable {
            endpoint,
            reason: err.to_string(),
        }
    }
}

/// Failures while reading a body the server already started sending.
fn map_body_error(endpoint: Endpoint, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout { endpoint }
    } else {
        ClientError::Transport {
            endpoint,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
