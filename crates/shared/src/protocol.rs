use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{BookingId, BookingStatus, DesignId, NotificationId, Role, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignerSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl DesignerSummary {
    /// Full name when the designer filled it in, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "decimal_string")]
    pub price: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub features: String,
    pub designer: DesignerSummary,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Design {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Design"
        } else {
            &self.title
        }
    }

    pub fn display_price(&self) -> String {
        match self.price.as_deref() {
            Some(price) if !price.is_empty() => format!("${price}"),
            _ => "$N/A".to_string(),
        }
    }
}

/// List endpoints answer either with a bare array or with a paginated page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Plain(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub design: DesignId,
    pub booking_date: Option<NaiveDate>,
    pub negotiated_price: Option<f64>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingReceipt {
    #[serde(default)]
    pub id: Option<BookingId>,
    #[serde(default)]
    pub client: Option<UserId>,
    pub design: DesignId,
    #[serde(default, deserialize_with = "decimal_string")]
    pub negotiated_price: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub booking_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: Role,
}

/// Body of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<RegisteredUser>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Decimal fields arrive as strings (`"200.00"`) but older payloads carry
/// plain numbers; both are normalized to their textual form.
fn decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Timestamps are informational: RFC 3339 values are kept, naive ones
/// (no offset) are read as UTC, anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(raw)) = value else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| naive.and_utc()))
}
