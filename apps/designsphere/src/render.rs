use std::fmt::Write as _;

use client_core::{
    resources::{SignedIn, SignedOut},
    ClientEvent, Route,
};
use serde_json::{json, Value};
use shared::protocol::{BookingReceipt, Design, Notification};

/// Terminal rendering of a screen's data.
pub trait View {
    fn text(&self) -> String;
    fn json(&self) -> Value;
}

impl View for Vec<Design> {
    fn text(&self) -> String {
        let mut out = String::new();
        for design in self {
            let _ = writeln!(
                out,
                "{:>5}  {:<32}  {:>10}  by {}",
                design.id,
                design.display_title(),
                design.display_price(),
                design.designer.display_name()
            );
        }
        out
    }

    fn json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl View for Design {
    fn text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.display_title());
        let _ = writeln!(out, "Designer: {}", self.designer.display_name());
        let _ = writeln!(out, "Price:    {}", self.display_price());
        if !self.description.trim().is_empty() {
            let _ = writeln!(out, "\n{}", self.description.trim());
        }
        if !self.features.trim().is_empty() {
            let _ = writeln!(out, "\nFeatures: {}", self.features.trim());
        }
        if !self.image.is_empty() {
            let _ = writeln!(out, "Image:    {}", self.image);
        }
        out
    }

    fn json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl View for BookingReceipt {
    fn text(&self) -> String {
        let date = self
            .booking_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".into());
        let price = self.negotiated_price.as_deref().unwrap_or("-");
        let id = self
            .id
            .map(|id| format!("#{id}"))
            .unwrap_or_else(|| "(unnumbered)".into());
        format!(
            "Booking {id}: design {} on {date}, price {price}, status {:?}\n",
            self.design, self.status
        )
    }

    fn json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl View for Vec<BookingReceipt> {
    fn text(&self) -> String {
        self.iter().map(View::text).collect()
    }

    fn json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl View for Vec<Notification> {
    fn text(&self) -> String {
        let mut out = String::new();
        for notification in self {
            let marker = if notification.is_read { ' ' } else { '*' };
            let _ = writeln!(out, "{marker} {}", notification.message);
        }
        out
    }

    fn json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl View for SignedIn {
    fn text(&self) -> String {
        format!("Signed in as {}.\n", self.username)
    }

    fn json(&self) -> Value {
        json!({
            "username": self.username,
            "user_id": self.user.as_ref().map(|user| user.id.0),
        })
    }
}

impl View for SignedOut {
    fn text(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{detail}\n"),
            None => "Signed out.\n".to_string(),
        }
    }

    fn json(&self) -> Value {
        json!({ "detail": self.detail })
    }
}

/// One line per navigation event; routes only show up with `RUST_LOG=debug`.
pub fn event_line(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::Notice(message) => Some(message.clone()),
        ClientEvent::Navigate(route) | ClientEvent::Replace(route) => {
            tracing::debug!(route = route_name(route), "navigation requested");
            None
        }
    }
}

fn route_name(route: &Route) -> &'static str {
    match route {
        Route::Login => "login",
        Route::Register => "register",
        Route::Home => "home",
        Route::DesignDetails { .. } => "design-details",
        Route::Booking { .. } => "booking",
    }
}
