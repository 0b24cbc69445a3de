use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Error;

pub const MAX_PER_CATEGORY: u32 = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn from_str_loose(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "economy" => Ok(Self::Economy),
            "premium-economy" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            _ => Err(Error::Validation(format!("invalid travel class: {s}"))),
        }
    }
}

/// Body of `POST /flights/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    pub origin_location_code: String,
    pub destination_location_code: String,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub travel_class: TravelClass,
}

impl FlightSearchRequest {
    pub fn one_way(origin: &str, destination: &str, departure_date: &str) -> Self {
        Self {
            origin_location_code: origin.trim().to_uppercase(),
            destination_location_code: destination.trim().to_uppercase(),
            departure_date: departure_date.to_string(),
            return_date: None,
            adults: 1,
            children: 0,
            infants: 0,
            travel_class: TravelClass::Economy,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_location(&self.origin_location_code)?;
        validate_location(&self.destination_location_code)?;

        if self.origin_location_code == self.destination_location_code {
            return Err(Error::Validation("origin and destination must differ".into()));
        }

        let departure = parse_date(&self.departure_date)?;
        if let Some(ref ret) = self.return_date {
            let ret_date = parse_date(ret)?;
            if ret_date < departure {
                return Err(Error::Validation(format!(
                    "return date {ret} is before departure date {}",
                    self.departure_date
                )));
            }
        }

        if !(1..=MAX_PER_CATEGORY).contains(&self.adults) {
            return Err(Error::Validation(format!(
                "adults must be between 1 and {MAX_PER_CATEGORY}"
            )));
        }
        if self.children > MAX_PER_CATEGORY {
            return Err(Error::Validation(format!(
                "children cannot exceed {MAX_PER_CATEGORY}"
            )));
        }
        if self.infants > MAX_PER_CATEGORY {
            return Err(Error::Validation(format!(
                "infants cannot exceed {MAX_PER_CATEGORY}"
            )));
        }
        if self.infants > self.adults {
            return Err(Error::Validation("infants cannot exceed number of adults".into()));
        }

        Ok(())
    }
}

fn validate_location(code: &str) -> Result<(), Error> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::InvalidAirport(code.to_string()));
    }
    Ok(())
}

pub fn parse_date(date: &str) -> Result<NaiveDate, Error> {
    if date.len() != 10 {
        return Err(Error::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| Error::InvalidDate(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_class_accepts_form_ids() {
        assert_eq!(
            TravelClass::from_str_loose("premium_economy").unwrap(),
            TravelClass::PremiumEconomy
        );
        assert_eq!(TravelClass::from_str_loose("Business").unwrap(), TravelClass::Business);
        assert!(TravelClass::from_str_loose("coach").is_err());
    }

    #[test]
    fn travel_class_wire_format() {
        let json = serde_json::to_value(TravelClass::PremiumEconomy).unwrap();
        assert_eq!(json, "PREMIUM_ECONOMY");
    }

    #[test]
    fn parse_date_requires_padding() {
        assert!(parse_date("2026-3-1").is_err());
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
    }
}
