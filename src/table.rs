use chrono::{DateTime, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::model::{FlightOffer, Itinerary};

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.fract() == 0.0 => format!("€{p:.0}"),
        Some(p) => format!("€{p:.2}"),
        None => String::new(),
    }
}

/// `dd/mm HH:MM` in the timestamp's own offset; unparseable input is shown as is.
pub fn format_time(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%d/%m %H:%M").to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt.format("%d/%m %H:%M").to_string();
        }
    }
    raw.to_string()
}

pub fn format_stops(itinerary: &Itinerary) -> String {
    match itinerary.stops() {
        None => String::new(),
        Some(0) => "direct".to_string(),
        Some(n) => {
            let via: Vec<&str> = itinerary.segments[..n]
                .iter()
                .filter_map(|s| s.to.as_deref())
                .collect();
            if via.is_empty() {
                format!("{n} stop")
            } else {
                format!("{n} stop ({})", via.join(", "))
            }
        }
    }
}

fn route(itinerary: &Itinerary) -> String {
    let Some(first) = itinerary.first() else {
        return String::new();
    };
    std::iter::once(first.from.as_deref().unwrap_or("?"))
        .chain(
            itinerary
                .segments
                .iter()
                .map(|s| s.to.as_deref().unwrap_or("?")),
        )
        .collect::<Vec<_>>()
        .join(" → ")
}

fn times(itinerary: &Itinerary) -> String {
    let depart = format_time(itinerary.first().and_then(|s| s.departure_time.as_deref()));
    let arrive = format_time(itinerary.last().and_then(|s| s.arrival_time.as_deref()));
    format!("{depart} → {arrive}")
}

fn summary(itinerary: &Itinerary) -> String {
    format!("{} | {}", route(itinerary), times(itinerary))
}

pub fn render(offers: &[&FlightOffer]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Airline", "Flight", "Route", "Depart", "Arrive", "Duration", "Stops", "Return", "Price",
        ]);

    let empty = Itinerary::default();
    for offer in offers {
        let outbound = offer.departure_itinerary.as_ref().unwrap_or(&empty);
        let first = outbound.first();

        let airline = first.and_then(|s| s.carrier()).unwrap_or_default();
        let flight = first
            .and_then(|s| s.flight_number.as_deref())
            .unwrap_or_default();
        let depart = format_time(first.and_then(|s| s.departure_time.as_deref()));
        let arrive = format_time(outbound.last().and_then(|s| s.arrival_time.as_deref()));
        let duration = outbound.total_duration.clone().unwrap_or_default();

        let ret = match offer.return_itinerary.as_ref() {
            Some(it) if offer.is_round_trip() => summary(it),
            _ => String::new(),
        };

        table.add_row(vec![
            airline.to_string(),
            flight.to_string(),
            route(outbound),
            depart,
            arrive,
            duration,
            format_stops(outbound),
            ret,
            format_price(offer.price),
        ]);
    }

    table.to_string()
}

/// One offer per line: `price | route | duration | stops | airline | times`.
pub fn compact_line(offer: &FlightOffer) -> String {
    let empty = Itinerary::default();
    let outbound = offer.departure_itinerary.as_ref().unwrap_or(&empty);
    let airline = outbound
        .first()
        .and_then(|s| s.carrier())
        .unwrap_or_default();
    let mut line = format!(
        "{} | {} | {} | {} | {airline} | {}",
        format_price(offer.price),
        route(outbound).replace(" → ", ">"),
        outbound.total_duration.as_deref().unwrap_or_default(),
        format_stops(outbound),
        times(outbound),
    );
    if let Some(ret) = offer.return_itinerary.as_ref().filter(|_| offer.is_round_trip()) {
        line.push_str(" || return ");
        line.push_str(&summary(ret));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;

    fn seg(from: &str, to: &str) -> Segment {
        Segment {
            from: Some(from.into()),
            to: Some(to.into()),
            departure_time: Some("2026-03-01T08:15:00".into()),
            arrival_time: Some("2026-03-01T10:40:00+01:00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn price_drops_zero_cents() {
        assert_eq!(format_price(Some(599.0)), "€599");
        assert_eq!(format_price(Some(89.5)), "€89.50");
        assert_eq!(format_price(None), "");
    }

    #[test]
    fn time_formats() {
        assert_eq!(format_time(Some("2026-03-01T08:15:00")), "01/03 08:15");
        assert_eq!(format_time(Some("2026-03-01T10:40:00+01:00")), "01/03 10:40");
        assert_eq!(format_time(Some("soon")), "soon");
        assert_eq!(format_time(None), "");
    }

    #[test]
    fn stops_list_connections() {
        let it = Itinerary {
            segments: vec![seg("FCO", "MUC"), seg("MUC", "JFK")],
            total_duration: Some("11h 20m".into()),
        };
        assert_eq!(format_stops(&it), "1 stop (MUC)");
        assert_eq!(route(&it), "FCO → MUC → JFK");
    }

    #[test]
    fn return_leg_shown_only_for_round_trips() {
        let outbound = Itinerary {
            segments: vec![seg("FCO", "LHR")],
            total_duration: Some("2h 25m".into()),
        };
        let mut offer = FlightOffer {
            price: Some(129.0),
            departure_itinerary: Some(outbound),
            return_itinerary: Some(Itinerary::default()),
            ..Default::default()
        };
        assert!(!compact_line(&offer).contains("|| return"));

        offer.return_itinerary = Some(Itinerary {
            segments: vec![seg("LHR", "FCO")],
            total_duration: None,
        });
        assert!(compact_line(&offer).contains("|| return LHR → FCO"));
    }

    #[test]
    fn render_tolerates_empty_offer() {
        let offer = FlightOffer::default();
        let out = render(&[&offer]);
        assert!(out.contains("Airline"));
    }
}
