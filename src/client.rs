use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use wreq::Client;

use crate::autocomplete::AirportLookup;
use crate::booking::BookingRequest;
use crate::config::ClientConfig;
use crate::contact::ContactMessage;
use crate::error::{self, Error, LookupError, Result};
use crate::model::{AirportOption, ApiResponse, FlightOffer};
use crate::query::FlightSearchRequest;
use crate::session::SessionStore;

const LOCATIONS_PATH: &str = "locations/search";
const FLIGHTS_PATH: &str = "flights/search";
const BOOKINGS_PATH: &str = "bookings/full";
const MAIL_PATH: &str = "mail/send-mail";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(ref proxy) = config.proxy {
            builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
        }

        let http = builder.build().map_err(error::from_http_error)?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn bearer(&self) -> Option<String> {
        self.session.token().map(|t| format!("Bearer {t}"))
    }

    async fn get_text(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = self.config.endpoint(path);
        debug!(%url, ?params, "GET");

        let mut request = self.http.get(url.as_str()).query(&params);
        if let Some(auth) = self.bearer() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await.map_err(error::from_http_error)?;
        check_status(response.status().as_u16(), &url)?;
        response.text().await.map_err(error::from_http_error)
    }

    async fn post_text<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.config.endpoint(path);
        let body = serde_json::to_string(body).map_err(error::from_json_error)?;
        debug!(%url, bytes = body.len(), "POST");

        let mut request = self
            .http
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(auth) = self.bearer() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await.map_err(error::from_http_error)?;
        check_status(response.status().as_u16(), &url)?;
        response.text().await.map_err(error::from_http_error)
    }

    /// `GET /locations/search?keyword=<text>`
    pub async fn search_locations(&self, keyword: &str) -> Result<Vec<AirportOption>> {
        let body = self.get_text(LOCATIONS_PATH, &[("keyword", keyword)]).await?;
        decode_envelope(&body)
    }

    /// `POST /flights/search`
    pub async fn search_flights(&self, request: &FlightSearchRequest) -> Result<Vec<FlightOffer>> {
        request.validate()?;
        let body = self.post_text(FLIGHTS_PATH, request).await?;
        let offers: Vec<FlightOffer> = decode_envelope(&body)?;
        debug!(count = offers.len(), "flight search returned offers");
        Ok(offers)
    }

    /// `POST /bookings/full`. Returns whatever booking record the API echoes back.
    pub async fn submit_booking(&self, booking: &BookingRequest) -> Result<Value> {
        booking.validate()?;
        let body = self.post_text(BOOKINGS_PATH, booking).await?;
        decode_envelope::<Value>(&body)
    }

    /// `POST /mail/send-mail`. Only the HTTP status is checked.
    pub async fn send_mail(&self, message: &ContactMessage) -> Result<()> {
        message.validate()?;
        self.post_text(MAIL_PATH, message).await?;
        Ok(())
    }
}

#[async_trait]
impl AirportLookup for ApiClient {
    async fn search(&self, keyword: &str) -> std::result::Result<Vec<AirportOption>, LookupError> {
        self.search_locations(keyword).await.map_err(|e| {
            warn!(keyword, "airport lookup failed: {e}");
            LookupError::from(e)
        })
    }
}

fn check_status(status: u16, url: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => {
            warn!(status, url, "request rejected");
            Err(Error::Unauthorized(status))
        }
        _ => {
            warn!(status, url, "unexpected status");
            Err(Error::HttpStatus(status))
        }
    }
}

/// Unwraps `{ success, data, message }`. A successful answer without `data` reads as empty.
pub fn decode_envelope<T>(body: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let envelope: ApiResponse<T> = serde_json::from_str(body).map_err(error::from_json_error)?;
    if !envelope.success {
        return Err(match envelope.message.filter(|m| !m.trim().is_empty()) {
            Some(message) => Error::Api(message),
            None => Error::Rejected,
        });
    }
    Ok(envelope.data.unwrap_or_default())
}
