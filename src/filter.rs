//! Client-side filtering, sorting and paging of a fetched offer list.
//!
//! [`derive`] is a pure function of the offer list and a [`FilterState`].
//! [`ResultView`] owns the state the way a results screen does: it resets
//! the price bound on every new list, puts the user back on page 1 when a
//! filter changes, and tells an observer whenever the filtered count moves.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::model::FlightOffer;
use crate::pagination::{self, PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopClass {
    Direct,
    One,
    TwoPlus,
}

impl StopClass {
    pub fn from_stops(stops: usize) -> Self {
        match stops {
            0 => Self::Direct,
            1 => Self::One,
            _ => Self::TwoPlus,
        }
    }

    /// `None` when the offer has no departure segments to count.
    pub fn of(offer: &FlightOffer) -> Option<Self> {
        offer
            .departure_itinerary
            .as_ref()
            .and_then(|i| i.stops())
            .map(Self::from_stops)
    }

    pub fn from_str_loose(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "nonstop" | "0" => Ok(Self::Direct),
            "one" | "1" => Ok(Self::One),
            "two-plus" | "twoplus" | "2+" | "2" => Ok(Self::TwoPlus),
            other => Err(Error::Validation(format!(
                "invalid stop class: {other} (expected direct, one or two-plus)"
            ))),
        }
    }
}

impl fmt::Display for StopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::One => write!(f, "1 stop"),
            Self::TwoPlus => write!(f, "2+ stops"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    None,
    Price,
    Duration,
    Departure,
}

impl SortKey {
    pub fn from_str_loose(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "price" => Ok(Self::Price),
            "duration" => Ok(Self::Duration),
            "departure" => Ok(Self::Departure),
            other => Err(Error::Validation(format!(
                "invalid sort key: {other} (expected none, price, duration or departure)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub max_price_selected: f64,
    /// Empty means every stop class passes.
    pub stops_allowed: BTreeSet<StopClass>,
    pub sort_key: SortKey,
    pub current_page: usize,
    pub max_duration_hours: Option<u32>,
    pub max_layover_hours: Option<u32>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            max_price_selected: f64::INFINITY,
            stops_allowed: BTreeSet::new(),
            sort_key: SortKey::None,
            current_page: 1,
            max_duration_hours: None,
            max_layover_hours: None,
        }
    }
}

impl FilterState {
    pub fn for_offers(offers: &[FlightOffer]) -> Self {
        Self {
            max_price_selected: max_observed_price(offers),
            ..Self::default()
        }
    }
}

pub fn max_observed_price(offers: &[FlightOffer]) -> f64 {
    offers
        .iter()
        .filter_map(|o| o.price)
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max)
}

/// Leading hour count of a `"<H>h <M>m"` duration. Minutes are ignored.
pub fn parse_duration_hours(duration: &str) -> Option<u32> {
    let bytes = duration.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if bytes.get(i) == Some(&b'h') {
                return duration[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Milliseconds since the epoch. Offsets are honoured; naive times are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn duration_key(offer: &FlightOffer) -> u32 {
    offer
        .total_duration()
        .and_then(parse_duration_hours)
        .unwrap_or(0)
}

fn departure_key(offer: &FlightOffer) -> i64 {
    offer
        .departure_segments()
        .first()
        .and_then(|s| s.departure_time.as_deref())
        .and_then(parse_timestamp)
        .unwrap_or(0)
}

fn compare_price(a: &FlightOffer, b: &FlightOffer) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn passes(offer: &FlightOffer, state: &FilterState) -> bool {
    if let Some(price) = offer.price {
        if price > state.max_price_selected {
            return false;
        }
    }

    if !state.stops_allowed.is_empty() {
        if let Some(class) = StopClass::of(offer) {
            if !state.stops_allowed.contains(&class) {
                return false;
            }
        }
    }

    if let Some(max) = state.max_duration_hours {
        if offer
            .total_duration()
            .and_then(parse_duration_hours)
            .is_some_and(|h| h > max)
        {
            return false;
        }
    }

    if let Some(max) = state.max_layover_hours {
        let too_long = offer
            .departure_segments()
            .iter()
            .skip(1)
            .filter_map(|s| s.layover_duration)
            .any(|minutes| (minutes / 60.0).floor() > f64::from(max));
        if too_long {
            return false;
        }
    }

    true
}

pub fn filter_offers<'a>(offers: &'a [FlightOffer], state: &FilterState) -> Vec<&'a FlightOffer> {
    offers.iter().filter(|o| passes(o, state)).collect()
}

/// Stable: offers with equal keys keep their relative order.
pub fn sort_offers(offers: &mut [&FlightOffer], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::Price => offers.sort_by(|a, b| compare_price(a, b)),
        SortKey::Duration => offers.sort_by_key(|o| duration_key(o)),
        SortKey::Departure => offers.sort_by_key(|o| departure_key(o)),
    }
}

#[derive(Debug, Clone)]
pub struct Derived<'a> {
    pub filtered: Vec<&'a FlightOffer>,
    pub page: usize,
}

impl<'a> Derived<'a> {
    pub fn total(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        pagination::total_pages(self.filtered.len(), PAGE_SIZE)
    }

    /// Empty when `page` lies past the last page.
    pub fn page_offers(&self) -> &[&'a FlightOffer] {
        pagination::paginate(&self.filtered, self.page, PAGE_SIZE)
    }
}

pub fn derive<'a>(offers: &'a [FlightOffer], state: &FilterState) -> Derived<'a> {
    let mut filtered = filter_offers(offers, state);
    sort_offers(&mut filtered, state.sort_key);
    Derived {
        filtered,
        page: state.current_page,
    }
}

type CountObserver = Box<dyn FnMut(usize) + Send>;

pub struct ResultView {
    offers: Vec<FlightOffer>,
    state: FilterState,
    max_observed: f64,
    on_count: Option<CountObserver>,
    last_count: Option<usize>,
}

impl ResultView {
    pub fn new(offers: Vec<FlightOffer>) -> Self {
        let state = FilterState::for_offers(&offers);
        Self {
            max_observed: state.max_price_selected,
            offers,
            state,
            on_count: None,
            last_count: None,
        }
    }

    pub fn on_count_change(&mut self, observer: impl FnMut(usize) + Send + 'static) {
        self.on_count = Some(Box::new(observer));
        self.last_count = None;
    }

    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn max_observed_price(&self) -> f64 {
        self.max_observed
    }

    pub fn set_offers(&mut self, offers: Vec<FlightOffer>) {
        self.max_observed = max_observed_price(&offers);
        self.offers = offers;
        self.state.max_price_selected = self.max_observed;
        self.state.current_page = 1;
    }

    pub fn set_max_price(&mut self, price: f64) {
        if price.is_nan() {
            return;
        }
        self.state.max_price_selected = price.clamp(0.0, self.max_observed);
        self.state.current_page = 1;
    }

    pub fn toggle_stop(&mut self, class: StopClass) {
        if !self.state.stops_allowed.remove(&class) {
            self.state.stops_allowed.insert(class);
        }
        self.state.current_page = 1;
    }

    pub fn set_stops(&mut self, classes: impl IntoIterator<Item = StopClass>) {
        self.state.stops_allowed = classes.into_iter().collect();
        self.state.current_page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.state.sort_key = key;
        self.state.current_page = 1;
    }

    pub fn set_max_duration_hours(&mut self, hours: Option<u32>) {
        self.state.max_duration_hours = hours;
        self.state.current_page = 1;
    }

    pub fn set_max_layover_hours(&mut self, hours: Option<u32>) {
        self.state.max_layover_hours = hours;
        self.state.current_page = 1;
    }

    /// Pages start at 1. Not clamped above; a page past the end renders empty.
    pub fn set_page(&mut self, page: usize) {
        self.state.current_page = page.max(1);
    }

    pub fn view(&mut self) -> Derived<'_> {
        let derived = derive(&self.offers, &self.state);
        let count = derived.total();
        if self.last_count != Some(count) {
            debug!(count, previous = ?self.last_count, "filtered result count changed");
            self.last_count = Some(count);
            if let Some(observer) = self.on_count.as_mut() {
                observer(count);
            }
        }
        derived
    }
}

impl fmt::Debug for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultView")
            .field("offers", &self.offers.len())
            .field("state", &self.state)
            .field("max_observed", &self.max_observed)
            .finish()
    }
}
