use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treats an explicit `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a JSON number or a numeric string; anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    /// Minutes on the ground before this segment. Only set from the second segment on.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub layover_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
}

impl Segment {
    pub fn carrier(&self) -> Option<&str> {
        self.airline_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.air_line.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default, deserialize_with = "nullable")]
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<String>,
}

impl Itinerary {
    /// `None` for an itinerary without segments.
    pub fn stops(&self) -> Option<usize> {
        self.segments.len().checked_sub(1)
    }

    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_itinerary: Option<Itinerary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_itinerary: Option<Itinerary>,
    /// Everything else the API sends, kept so the offer can be posted back verbatim on booking.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightOffer {
    pub fn departure_segments(&self) -> &[Segment] {
        self.departure_itinerary
            .as_ref()
            .map(|i| i.segments.as_slice())
            .unwrap_or_default()
    }

    pub fn total_duration(&self) -> Option<&str> {
        self.departure_itinerary
            .as_ref()
            .and_then(|i| i.total_duration.as_deref())
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_itinerary
            .as_ref()
            .is_some_and(|i| !i.segments.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportOption {
    pub label: String,
    pub value: String,
}

/// Envelope every endpoint of the travel API answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_fields_deserialize() {
        let offer: FlightOffer = serde_json::from_value(json!({
            "departureItinerary": { "segments": null },
            "returnItinerary": null
        }))
        .unwrap();
        assert_eq!(offer.price, None);
        assert!(offer.departure_segments().is_empty());
        assert!(!offer.is_round_trip());
    }

    #[test]
    fn price_as_string_is_accepted() {
        let offer: FlightOffer = serde_json::from_value(json!({ "price": "129.90" })).unwrap();
        assert_eq!(offer.price, Some(129.9));

        let offer: FlightOffer = serde_json::from_value(json!({ "price": "n/a" })).unwrap();
        assert_eq!(offer.price, None);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "price": 100,
            "travelClass": "ECONOMY",
            "departureItinerary": {
                "totalDuration": "2h 5m",
                "segments": [{ "from": "FCO", "to": "LHR", "airLine": "AZ", "flightNumber": "AZ204" }]
            }
        });
        let offer: FlightOffer = serde_json::from_value(raw).unwrap();
        assert_eq!(offer.extra.get("travelClass"), Some(&json!("ECONOMY")));

        let back = serde_json::to_value(&offer).unwrap();
        assert_eq!(back["travelClass"], "ECONOMY");
        assert_eq!(back["departureItinerary"]["segments"][0]["airLine"], "AZ");
    }

    #[test]
    fn carrier_prefers_airline_name() {
        let seg = Segment {
            air_line: Some("AZ".into()),
            airline_name: Some("ITA Airways".into()),
            ..Default::default()
        };
        assert_eq!(seg.carrier(), Some("ITA Airways"));

        let seg = Segment {
            air_line: Some("AZ".into()),
            airline_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(seg.carrier(), Some("AZ"));
    }

    #[test]
    fn stops_counts_segments_minus_one() {
        let it = Itinerary {
            segments: vec![Segment::default(), Segment::default()],
            total_duration: None,
        };
        assert_eq!(it.stops(), Some(1));
        assert_eq!(Itinerary::default().stops(), None);
    }
}
