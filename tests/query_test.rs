use viaggi::error::Error;
use viaggi::query::{FlightSearchRequest, TravelClass};

fn make_valid_request() -> FlightSearchRequest {
    FlightSearchRequest::one_way("FCO", "LHR", "2026-03-01")
}

#[test]
fn valid_request_passes() {
    assert!(make_valid_request().validate().is_ok());
}

#[test]
fn constructor_normalizes_codes() {
    let req = FlightSearchRequest::one_way(" fco", "lhr ", "2026-03-01");
    assert_eq!(req.origin_location_code, "FCO");
    assert_eq!(req.destination_location_code, "LHR");
    assert!(req.validate().is_ok());
}

#[test]
fn rejects_lowercase_airport() {
    let mut req = make_valid_request();
    req.origin_location_code = "fco".into();
    assert!(matches!(req.validate(), Err(Error::InvalidAirport(_))));
}

#[test]
fn rejects_too_short_airport() {
    let mut req = make_valid_request();
    req.origin_location_code = "FC".into();
    assert!(req.validate().is_err());
}

#[test]
fn rejects_too_long_airport() {
    let mut req = make_valid_request();
    req.destination_location_code = "LHRX".into();
    assert!(req.validate().is_err());
}

#[test]
fn rejects_numeric_airport() {
    let mut req = make_valid_request();
    req.origin_location_code = "F1O".into();
    assert!(req.validate().is_err());
}

#[test]
fn rejects_same_origin_and_destination() {
    let req = FlightSearchRequest::one_way("FCO", "FCO", "2026-03-01");
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("must differ"));
}

#[test]
fn rejects_bad_date_format() {
    let mut req = make_valid_request();
    req.departure_date = "01-03-2026".into();
    assert!(matches!(req.validate(), Err(Error::InvalidDate(_))));
}

#[test]
fn rejects_impossible_date() {
    let mut req = make_valid_request();
    req.departure_date = "2026-02-30".into();
    assert!(matches!(req.validate(), Err(Error::InvalidDate(_))));
}

#[test]
fn rejects_unpadded_date() {
    let mut req = make_valid_request();
    req.departure_date = "2026-3-1".into();
    assert!(req.validate().is_err());
}

#[test]
fn return_date_must_not_precede_departure() {
    let mut req = make_valid_request();
    req.return_date = Some("2026-02-28".into());
    assert!(req.validate().is_err());

    req.return_date = Some("2026-03-01".into());
    assert!(req.validate().is_ok());
}

#[test]
fn rejects_zero_adults() {
    let mut req = make_valid_request();
    req.adults = 0;
    assert!(req.validate().is_err());
}

#[test]
fn rejects_too_many_adults() {
    let mut req = make_valid_request();
    req.adults = 10;
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("between 1 and 9"));
}

#[test]
fn rejects_too_many_children() {
    let mut req = make_valid_request();
    req.children = 10;
    assert!(req.validate().is_err());
}

#[test]
fn infants_cannot_exceed_adults() {
    let mut req = make_valid_request();
    req.adults = 1;
    req.infants = 2;
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("infants cannot exceed"));
}

#[test]
fn infants_equal_to_adults_pass() {
    let mut req = make_valid_request();
    req.adults = 2;
    req.infants = 2;
    req.children = 3;
    assert!(req.validate().is_ok());
}

#[test]
fn travel_class_from_str_loose() {
    assert_eq!(TravelClass::from_str_loose("economy").unwrap(), TravelClass::Economy);
    assert_eq!(
        TravelClass::from_str_loose("Premium-Economy").unwrap(),
        TravelClass::PremiumEconomy
    );
    assert_eq!(TravelClass::from_str_loose("BUSINESS").unwrap(), TravelClass::Business);
    assert_eq!(TravelClass::from_str_loose("first").unwrap(), TravelClass::First);
    assert!(TravelClass::from_str_loose("cargo").is_err());
}

#[test]
fn request_body_shape() {
    let mut req = make_valid_request();
    req.travel_class = TravelClass::PremiumEconomy;
    req.adults = 2;
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["originLocationCode"], "FCO");
    assert_eq!(json["destinationLocationCode"], "LHR");
    assert_eq!(json["departureDate"], "2026-03-01");
    assert_eq!(json["adults"], 2);
    assert_eq!(json["travelClass"], "PREMIUM_ECONOMY");
    assert!(json.get("returnDate").is_none());
}

#[test]
fn round_trip_body_carries_return_date() {
    let mut req = make_valid_request();
    req.return_date = Some("2026-03-08".into());
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["returnDate"], "2026-03-08");
}
