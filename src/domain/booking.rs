//! Booking step that precedes card entry: the offer popup and its form.

use crate::error::{Result, SessionError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PAYMENT_PATH: &str = "/payment";

pub const FIRST_SLOT_HOUR: u32 = 6;
pub const LAST_SLOT_HOUR: u32 = 24;

pub const LOCATIONS: [&str; 10] = [
    "Fischerinsel 5, 10179 Berlin",
    "Wikingerweg 14, 20537 Hamburg",
    "Baaderstraße 76, 80469 München",
    "Follerstraße 96, 50676 Köln",
    "Gutleutstraße 176, 60327 Frankfurt am Main",
    "Hohe Str. 12, 70174 Stuttgart",
    "Königsallee, 40215 Düsseldorf",
    "Große Heimstraße 54, 44137 Dortmund",
    "Rüttenscheider Str. 131, 45130 Essen",
    "Faulenstraße 71, 28195 Bremen",
];

/// Hourly slots from `6:00` to `24:00`.
pub fn time_slots() -> Vec<String> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .map(|hour| format!("{hour}:00"))
        .collect()
}

/// A bookable session as advertised in the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOffer {
    pub title: String,
    pub hours: u32,
    pub price: Decimal,
}

impl BookingOffer {
    pub fn duration_label(&self) -> String {
        format!("Sitzungsdauer: {} Stunden", self.hours)
    }

    pub fn button_label(&self) -> String {
        format!("Buchen - {} €", self.price.normalize())
    }
}

/// Raw popup input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingForm {
    pub name: String,
    pub phone: String,
    pub date: String,
    pub time_slot: String,
    pub location: String,
}

/// A validated booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub location: String,
}

/// Where the client navigates after booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}

fn required(value: &str, label: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SessionError::ValidationError(format!("{label} is required")));
    }
    Ok(value.to_string())
}

impl BookingForm {
    pub fn validate(&self) -> Result<BookingRequest> {
        let name = required(&self.name, "Vorname")?;
        let phone = required(&self.phone, "Telefonnummer")?;
        let date = required(&self.date, "Datum")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| SessionError::ValidationError(format!("Datum: {e}")))?;

        let time_slot = required(&self.time_slot, "Zeit")?;
        if !time_slots().contains(&time_slot) {
            return Err(SessionError::ValidationError(format!(
                "Unknown time slot: {time_slot}"
            )));
        }

        let location = required(&self.location, "Stadt")?;
        if !LOCATIONS.contains(&location.as_str()) {
            return Err(SessionError::ValidationError(format!(
                "Unknown location: {location}"
            )));
        }

        Ok(BookingRequest {
            name,
            phone,
            date,
            time_slot,
            location,
        })
    }

    /// Validates the form and returns the redirect into the payment step.
    pub fn submit(&self, offer: &BookingOffer) -> Result<(BookingRequest, Redirect)> {
        let request = self.validate()?;
        let redirect = Redirect {
            path: PAYMENT_PATH.to_string(),
            query: vec![("price".to_string(), offer.price.normalize().to_string())],
        };
        Ok((request, redirect))
    }
}
