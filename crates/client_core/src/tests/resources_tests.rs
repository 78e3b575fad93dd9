use super::*;

use std::time::Instant;

use serde_json::json;
use shared::error::ErrorKind;
use tokio::sync::broadcast::error::TryRecvError;

use crate::{
    controller::{FetchController, LoadOutcome},
    navigation::ClientEvent,
    test_support::{FakeApi, Harness, Reply, REDIRECT_DELAY},
};

fn booking_form(date: &str, price: &str) -> BookingForm {
    BookingForm {
        booking_date: date.into(),
        negotiated_price: price.into(),
        notes: "north-facing".into(),
        ..BookingForm::new(DesignId(4))
    }
}

#[tokio::test]
async fn booking_notice_then_navigates_home_after_delay() {
    let api = FakeApi::new().on(
        Endpoint::CreateBooking,
        [Reply::Json(json!({
            "id": 9,
            "client": 2,
            "design": 4,
            "negotiated_price": "200.00",
            "status": "pending",
            "notes": "north-facing",
            "booking_date": "2999-08-10"
        }))],
    );
    let harness = Harness::new(api, Some("abc123")).await;
    let mut events = harness.ctx.navigator.subscribe();
    let controller = FetchController::new(
        CreateBooking {
            form: booking_form("2999-08-10", "200"),
        },
        harness.ctx.clone(),
    );

    let started = Instant::now();
    assert_eq!(controller.load().await, LoadOutcome::Loaded);

    assert!(started.elapsed() >= REDIRECT_DELAY);
    assert_eq!(
        events.try_recv().expect("notice"),
        ClientEvent::Notice(BOOKING_CONFIRMED_MESSAGE.to_string())
    );
    assert_eq!(
        events.try_recv().expect("navigate"),
        ClientEvent::Navigate(Route::Home)
    );
    assert_eq!(
        harness.api.bodies(),
        vec![json!({
            "design": 4,
            "booking_date": "2999-08-10",
            "negotiated_price": 200.0,
            "notes": "north-facing"
        })]
    );
    assert_eq!(controller.state().data.expect("receipt").id.map(|id| id.0), Some(9));
}

#[tokio::test]
async fn past_booking_date_is_rejected_locally() {
    let harness = Harness::new(FakeApi::new(), Some("abc123")).await;
    let controller = FetchController::new(
        CreateBooking {
            form: booking_form("2000-01-01", ""),
        },
        harness.ctx.clone(),
    );

    controller.load().await;

    assert_eq!(
        controller.state().error.expect("error").message,
        "Booking date cannot be in the past."
    );
    assert_eq!(harness.api.call_count(), 0);
}

#[tokio::test]
async fn failed_booking_does_not_navigate() {
    let api = FakeApi::new().on(
        Endpoint::CreateBooking,
        [Reply::Status(400, Some("Design is not available."))],
    );
    let harness = Harness::new(api, Some("abc123")).await;
    let mut events = harness.ctx.navigator.subscribe();
    let controller = FetchController::new(
        CreateBooking {
            form: booking_form("2999-08-10", ""),
        },
        harness.ctx.clone(),
    );

    controller.load().await;

    assert_eq!(
        controller.state().error.expect("error").message,
        "Design is not available."
    );
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn login_replaces_route_only_after_token_is_stored() {
    let api = FakeApi::new().on(
        Endpoint::Login,
        [Reply::Json(json!({"token": "abc123"}))],
    );
    let harness = Harness::new(api, None).await;
    let mut events = harness.ctx.navigator.subscribe();
    let controller = FetchController::new(
        Login {
            form: LoginForm {
                username: "ana".into(),
                password: "secret".into(),
            },
        },
        harness.ctx.clone(),
    );

    controller.load().await;

    assert_eq!(events.recv().await.expect("event"), ClientEvent::Replace(Route::Home));
    assert_eq!(harness.stored_token().await.as_deref(), Some("abc123"));
    assert_eq!(
        controller.state().data,
        Some(SignedIn {
            username: "ana".into(),
            user: None
        })
    );
}

#[tokio::test]
async fn login_without_token_is_an_error() {
    let api = FakeApi::new().on(Endpoint::Login, [Reply::Json(json!({"token": ""}))]);
    let harness = Harness::new(api, None).await;
    let mut events = harness.ctx.navigator.subscribe();
    let controller = FetchController::new(
        Login {
            form: LoginForm {
                username: "ana".into(),
                password: "secret".into(),
            },
        },
        harness.ctx.clone(),
    );

    controller.load().await;

    assert_eq!(
        controller.state().error.expect("error").kind,
        ErrorKind::NoResults
    );
    assert_eq!(harness.stored_token().await, None);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn register_sends_role_and_signs_in() {
    let api = FakeApi::new().on(
        Endpoint::Register,
        [Reply::Json(json!({
            "token": "fresh",
            "user": {"id": 12, "username": "ana", "email": "ana@example.com", "role": "designer"}
        }))],
    );
    let harness = Harness::new(api, None).await;
    let controller = FetchController::new(
        Register {
            form: RegisterForm {
                username: "ana".into(),
                password: "secret".into(),
                email: "ana@example.com".into(),
                role: "designer".into(),
            },
        },
        harness.ctx.clone(),
    );

    assert_eq!(controller.load().await, LoadOutcome::Loaded);

    assert_eq!(harness.api.bodies()[0]["role"], json!("designer"));
    assert_eq!(harness.stored_token().await.as_deref(), Some("fresh"));
    let signed_in = controller.state().data.expect("signed in");
    assert_eq!(signed_in.user.expect("user").username, "ana");
}

#[tokio::test]
async fn logout_clears_local_session_even_when_server_fails() {
    let api = FakeApi::new().on(Endpoint::Logout, [Reply::Status(500, None)]);
    let harness = Harness::new(api, Some("abc123")).await;
    let mut events = harness.ctx.navigator.subscribe();
    let controller = FetchController::new(Logout, harness.ctx.clone());

    controller.load().await;

    assert_eq!(
        controller.state().error.expect("error").kind,
        ErrorKind::ServerError(500)
    );
    assert_eq!(harness.stored_token().await, None);
    assert!(!harness.ctx.session.is_signed_in().await);
    assert_eq!(harness.api.credentials_seen(), vec!["abc123".to_string()]);

    controller.retry().await;
    assert_eq!(harness.api.call_count(), 1);
    assert_eq!(events.recv().await.expect("event"), ClientEvent::Replace(Route::Login));
}

#[tokio::test]
async fn logout_acknowledged_by_server() {
    let api = FakeApi::new().on(
        Endpoint::Logout,
        [Reply::Json(json!({"detail": "Successfully logged out."}))],
    );
    let harness = Harness::new(api, Some("abc123")).await;
    let controller = FetchController::new(Logout, harness.ctx.clone());

    controller.load().await;

    assert_eq!(
        controller.state().data.expect("signed out").detail.as_deref(),
        Some("Successfully logged out.")
    );
    assert_eq!(harness.stored_token().await, None);
}

#[tokio::test]
async fn empty_bookings_and_notifications_have_own_messages() {
    let api = FakeApi::new()
        .on(Endpoint::ListBookings, [Reply::Json(json!([]))])
        .on(
            Endpoint::ListNotifications,
            [Reply::Json(json!({"count": 0, "results": []}))],
        );
    let harness = Harness::new(api, Some("abc123")).await;

    let bookings = FetchController::new(MyBookings, harness.ctx.clone());
    bookings.load().await;
    assert_eq!(bookings.state().error.expect("error").message, "No bookings yet.");

    let notifications = FetchController::new(Notifications, harness.ctx.clone());
    notifications.load().await;
    assert_eq!(
        notifications.state().error.expect("error").message,
        "No notifications."
    );
}

#[tokio::test]
async fn notifications_are_listed() {
    let api = FakeApi::new().on(
        Endpoint::ListNotifications,
        [Reply::Json(json!([
            {"id": 1, "message": "Booking confirmed", "is_read": false},
            {"id": 2, "message": "New design posted", "is_read": true}
        ]))],
    );
    let harness = Harness::new(api, Some("abc123")).await;
    let controller = FetchController::new(Notifications, harness.ctx.clone());

    controller.load().await;

    let notifications = controller.state().data.expect("notifications");
    assert_eq!(notifications.len(), 2);
    assert!(!notifications[0].is_read);
}
