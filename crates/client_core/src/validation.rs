use chrono::NaiveDate;
use shared::{
    domain::{DesignId, Role},
    protocol::{BookingRequest, LoginRequest, RegisterRequest},
};

use crate::error::ValidationError;

const BOOKING_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(LoginRequest {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    /// Free text as typed; blank means `client`.
    pub role: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingRegistrationFields);
        }
        let role = if self.role.trim().is_empty() {
            Role::default()
        } else {
            self.role
                .parse::<Role>()
                .map_err(|_| ValidationError::InvalidRole)?
        };
        Ok(RegisterRequest {
            username: username.to_string(),
            password: self.password.clone(),
            email: self.email.trim().to_string(),
            role,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BookingForm {
    pub design: DesignId,
    pub booking_date: String,
    pub negotiated_price: String,
    pub notes: String,
}

impl BookingForm {
    pub fn new(design: DesignId) -> Self {
        Self {
            design,
            booking_date: String::new(),
            negotiated_price: String::new(),
            notes: String::new(),
        }
    }

    pub fn validate(&self) -> Result<BookingRequest, ValidationError> {
        self.validate_on(chrono::Local::now().date_naive())
    }

    /// Validates against an explicit `today` so the past-date rule is
    /// deterministic.
    pub fn validate_on(&self, today: NaiveDate) -> Result<BookingRequest, ValidationError> {
        let raw_date = self.booking_date.trim();
        if raw_date.is_empty() {
            return Err(ValidationError::MissingBookingDate);
        }
        let booking_date = NaiveDate::parse_from_str(raw_date, BOOKING_DATE_FORMAT)
            .map_err(|_| ValidationError::MalformedBookingDate)?;
        if booking_date < today {
            return Err(ValidationError::BookingDateInPast);
        }

        let raw_price = self.negotiated_price.trim();
        let negotiated_price = if raw_price.is_empty() {
            None
        } else {
            let price = raw_price
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidPrice)?;
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::InvalidPrice);
            }
            Some(price)
        };

        Ok(BookingRequest {
            design: self.design,
            booking_date: Some(booking_date),
            negotiated_price,
            notes: self.notes.clone(),
        })
    }
}
