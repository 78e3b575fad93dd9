//! Maps every client failure onto exactly one view-state error.

use shared::error::{ErrorKind, ViewError};

use crate::{api::Endpoint, error::ClientError};

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: Invalid or expired token.";
pub const SIGNED_OUT_MESSAGE: &str = "You are not signed in. Please log in.";
pub const NETWORK_MESSAGE: &str = "Network error. Ensure the server is reachable.";

struct EndpointMessages {
    not_found: &'static str,
    invalid_data: &'static str,
    timeout: &'static str,
    empty: &'static str,
    fallback: &'static str,
}

fn messages(endpoint: Endpoint) -> EndpointMessages {
    match endpoint {
        Endpoint::ListDesigns => EndpointMessages {
            not_found: "API endpoint not found. Check server URL.",
            invalid_data: "Invalid request for designs.",
            timeout: "Request timed out. Check your network or server.",
            empty: "No designs found.",
            fallback: "Failed to load designs. Please try again.",
        },
        Endpoint::GetDesign(_) => EndpointMessages {
            not_found: "Design not found.",
            invalid_data: "Invalid design request.",
            timeout: "Request timed out.",
            empty: "No Design Found.",
            fallback: "Failed to load design details.",
        },
        Endpoint::CreateBooking => EndpointMessages {
            not_found: "Booking endpoint not found.",
            invalid_data: "Invalid booking data.",
            timeout: "Request timed out.",
            empty: "Booking was not confirmed.",
            fallback: "Failed to confirm booking.",
        },
        Endpoint::Login => EndpointMessages {
            not_found: "Login endpoint not found. Check server URL.",
            invalid_data: "Invalid credentials or server error.",
            timeout: "Request timed out.",
            empty: "Login response did not include a token.",
            fallback: "Login failed. Invalid credentials or server error.",
        },
        Endpoint::Register => EndpointMessages {
            not_found: "Registration endpoint not found. Check server URL.",
            invalid_data: "Registration failed: invalid data.",
            timeout: "Request timed out.",
            empty: "Registration response did not include a token.",
            fallback: "Registration failed.",
        },
        Endpoint::Logout => EndpointMessages {
            not_found: "Logout endpoint not found.",
            invalid_data: "Invalid logout request.",
            timeout: "Request timed out.",
            empty: "Logout was not acknowledged.",
            fallback: "Failed to sign out on the server.",
        },
        Endpoint::ListBookings => EndpointMessages {
            not_found: "Bookings endpoint not found.",
            invalid_data: "Invalid request for bookings.",
            timeout: "Request timed out.",
            empty: "No bookings yet.",
            fallback: "Failed to load bookings.",
        },
        Endpoint::ListNotifications => EndpointMessages {
            not_found: "Notifications endpoint not found.",
            invalid_data: "Invalid request for notifications.",
            timeout: "Request timed out.",
            empty: "No notifications.",
            fallback: "Failed to load notifications.",
        },
    }
}

/// Classification of an HTTP error status.
pub fn classify_status(endpoint: Endpoint, status: u16, detail: Option<&str>) -> ViewError {
    let messages = messages(endpoint);
    match status {
        401 => ViewError::new(ErrorKind::Unauthorized, UNAUTHORIZED_MESSAGE),
        404 => ViewError::new(ErrorKind::NotFound, messages.not_found),
        400 => ViewError::new(
            ErrorKind::BadRequest,
            detail
                .filter(|detail| !detail.trim().is_empty())
                .unwrap_or(messages.invalid_data),
        ),
        other => ViewError::new(ErrorKind::ServerError(other), format!("Server error: {other}")),
    }
}

/// Classification of any failure raised while loading `endpoint`.
pub fn classify(endpoint: Endpoint, err: &ClientError) -> ViewError {
    let messages = messages(endpoint);
    match err {
        ClientError::Status { status, detail, .. } => {
            classify_status(endpoint, *status, detail.as_deref())
        }
        ClientError::Timeout { .. } => ViewError::new(ErrorKind::Timeout, messages.timeout),
        ClientError::Unreachable { .. } => {
            ViewError::new(ErrorKind::NetworkUnreachable, NETWORK_MESSAGE)
        }
        ClientError::MissingCredential => {
            ViewError::new(ErrorKind::Unauthorized, SIGNED_OUT_MESSAGE)
        }
        ClientError::Empty { .. } => ViewError::new(ErrorKind::NoResults, messages.empty),
        ClientError::Validation(invalid) => {
            ViewError::new(ErrorKind::Validation, invalid.to_string())
        }
        ClientError::Store(_) if endpoint == Endpoint::Logout => ViewError::new(
            ErrorKind::Unknown,
            "Could not remove the stored session from this device.",
        ),
        ClientError::Store(_) => ViewError::new(
            ErrorKind::Unknown,
            "Could not save your session on this device. Please try again.",
        ),
        ClientError::Decode { .. } | ClientError::Transport { .. } => {
            ViewError::new(ErrorKind::Unknown, messages.fallback)
        }
    }
}

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod tests;
