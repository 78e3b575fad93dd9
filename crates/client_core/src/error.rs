use std::path::PathBuf;

use thiserror::Error;

use crate::api::Endpoint;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        detail: Option<String>,
    },
    #[error("{endpoint} timed out before the server responded")]
    Timeout { endpoint: Endpoint },
    #[error("could not reach the server for {endpoint}: {reason}")]
    Unreachable { endpoint: Endpoint, reason: String },
    #[error("unexpected response body from {endpoint}: {reason}")]
    Decode { endpoint: Endpoint, reason: String },
    #[error("{endpoint} request failed: {reason}")]
    Transport { endpoint: Endpoint, reason: String },
    #[error("not signed in: no stored credential")]
    MissingCredential,
    #[error("{endpoint} returned no results")]
    Empty { endpoint: Endpoint },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Form input rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Both fields are required.")]
    MissingCredentials,
    #[error("Please enter a booking date.")]
    MissingBookingDate,
    #[error("Booking date must use the YYYY-MM-DD format.")]
    MalformedBookingDate,
    #[error("Booking date cannot be in the past.")]
    BookingDateInPast,
    #[error("Negotiated price must be a valid number.")]
    InvalidPrice,
    #[error("Username and password are required.")]
    MissingRegistrationFields,
    #[error("Role must be 'client' or 'designer'.")]
    InvalidRole,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write credential file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}
