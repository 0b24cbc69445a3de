use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::FlightOffer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn from_str_loose(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(Error::Validation(format!("invalid booking status: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: String,
}

impl Passenger {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("passenger name is required".into()));
        }
        if self.surname.trim().is_empty() {
            return Err(Error::Validation("passenger surname is required".into()));
        }
        if !validate_email(&self.email) {
            return Err(Error::InvalidEmail(self.email.clone()));
        }
        if !validate_phone(&self.phone) {
            return Err(Error::InvalidPhone(self.phone.clone()));
        }
        Ok(())
    }
}

/// Body of `POST /bookings/full`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRequest {
    pub flight: FlightOffer,
    pub booking: BookingInfo,
    pub passenger: Passenger,
}

impl BookingRequest {
    pub fn new(flight: FlightOffer, passenger: Passenger) -> Self {
        Self {
            flight,
            booking: BookingInfo::default(),
            passenger,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.flight.departure_segments().is_empty() {
            return Err(Error::Validation("selected flight has no departure segments".into()));
        }
        self.passenger.validate()
    }
}

pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot in the domain must have text on both sides.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Separators are ignored and a `+` or `00` country prefix is allowed.
pub fn validate_phone(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    let digits = cleaned
        .strip_prefix('+')
        .or_else(|| cleaned.strip_prefix("00"))
        .unwrap_or(cleaned.as_str());
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}
