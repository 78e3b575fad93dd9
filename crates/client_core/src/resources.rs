//! One `Resource` per screen of the marketplace client.

use async_trait::async_trait;
use shared::{
    domain::{Credential, DesignId},
    protocol::{BookingReceipt, Design, Notification, RegisteredUser, TokenResponse},
};
use tracing::{info, warn};

use crate::{
    api::Endpoint,
    controller::{ClientContext, Resource},
    error::ClientError,
    navigation::Route,
    validation::{BookingForm, LoginForm, RegisterForm},
};

pub const BOOKING_CONFIRMED_MESSAGE: &str = "Booking confirmed successfully!";

fn non_empty<T>(endpoint: Endpoint, items: Vec<T>) -> Result<Vec<T>, ClientError> {
    if items.is_empty() {
        Err(ClientError::Empty { endpoint })
    } else {
        Ok(items)
    }
}

/// Home screen: every design visible to the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct DesignList;

#[async_trait]
impl Resource for DesignList {
    type Data = Vec<Design>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::ListDesigns
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let credential = ctx.session.credential().await?;
        let designs = ctx.api.list_designs(&credential).await?;
        non_empty(self.endpoint(), designs)
    }
}

#[derive(Debug, Clone)]
pub struct DesignDetail {
    pub id: DesignId,
}

#[async_trait]
impl Resource for DesignDetail {
    type Data = Design;

    fn endpoint(&self) -> Endpoint {
        Endpoint::GetDesign(self.id)
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let credential = ctx.session.credential().await?;
        ctx.api.get_design(&credential, self.id).await
    }
}

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub form: BookingForm,
}

#[async_trait]
impl Resource for CreateBooking {
    type Data = BookingReceipt;

    fn endpoint(&self) -> Endpoint {
        Endpoint::CreateBooking
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let request = self.form.validate()?;
        let credential = ctx.session.credential().await?;
        ctx.api.create_booking(&credential, &request).await
    }

    async fn on_success(&self, receipt: &Self::Data, ctx: &ClientContext) {
        info!(design = %receipt.design, booking = ?receipt.id, "booking confirmed");
        ctx.navigator.notice(BOOKING_CONFIRMED_MESSAGE);
        tokio::time::sleep(ctx.booking_redirect_delay).await;
        ctx.navigator.navigate(Route::Home);
    }
}

/// Result of a login or registration. The token itself stays in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub username: String,
    pub user: Option<RegisteredUser>,
}

async fn adopt_token(
    ctx: &ClientContext,
    endpoint: Endpoint,
    username: String,
    response: TokenResponse,
) -> Result<SignedIn, ClientError> {
    if response.token.trim().is_empty() {
        return Err(ClientError::Empty { endpoint });
    }
    ctx.session
        .establish(Credential::new(response.token))
        .await?;
    Ok(SignedIn {
        username,
        user: response.user,
    })
}

#[derive(Debug, Clone)]
pub struct Login {
    pub form: LoginForm,
}

#[async_trait]
impl Resource for Login {
    type Data = SignedIn;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Login
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let request = self.form.validate()?;
        let response = ctx.api.login(&request).await?;
        adopt_token(ctx, self.endpoint(), request.username, response).await
    }

    async fn on_success(&self, _: &Self::Data, ctx: &ClientContext) {
        ctx.navigator.replace(Route::Home);
    }
}

#[derive(Debug, Clone)]
pub struct Register {
    pub form: RegisterForm,
}

#[async_trait]
impl Resource for Register {
    type Data = SignedIn;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Register
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let request = self.form.validate()?;
        let response = ctx.api.register(&request).await?;
        adopt_token(ctx, self.endpoint(), request.username, response).await
    }

    async fn on_success(&self, _: &Self::Data, ctx: &ClientContext) {
        ctx.navigator.replace(Route::Home);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MyBookings;

#[async_trait]
impl Resource for MyBookings {
    type Data = Vec<BookingReceipt>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::ListBookings
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let credential = ctx.session.credential().await?;
        let bookings = ctx.api.list_bookings(&credential).await?;
        non_empty(self.endpoint(), bookings)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Notifications;

#[async_trait]
impl Resource for Notifications {
    type Data = Vec<Notification>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::ListNotifications
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let credential = ctx.session.credential().await?;
        let notifications = ctx.api.list_notifications(&credential).await?;
        non_empty(self.endpoint(), notifications)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignedOut {
    /// Server acknowledgement, `None` when nothing was sent.
    pub detail: Option<String>,
}

/// Ends the session. The local credential is removed even when the server
/// rejects or never receives the logout call.
#[derive(Debug, Clone, Default)]
pub struct Logout;

#[async_trait]
impl Resource for Logout {
    type Data = SignedOut;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Logout
    }

    async fn fetch(&self, ctx: &ClientContext) -> Result<Self::Data, ClientError> {
        let credential = match ctx.session.credential().await {
            Ok(credential) => credential,
            Err(ClientError::MissingCredential) => return Ok(SignedOut::default()),
            Err(err) => return Err(err),
        };
        let remote = ctx.api.logout(&credential).await;
        if let Err(err) = &remote {
            warn!(error = %err, "server logout failed; clearing local session anyway");
        }
        ctx.session.sign_out().await?;
        Ok(SignedOut {
            detail: remote?.detail,
        })
    }

    async fn on_success(&self, _: &Self::Data, ctx: &ClientContext) {
        ctx.navigator.replace(Route::Login);
    }
}

#[cfg(test)]
#[path = "tests/resources_tests.rs"]
mod tests;
