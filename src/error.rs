use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request timed out — the travel API may be slow or unreachable. Try increasing --timeout")]
    Timeout,

    #[error("connection failed — check your internet connection ({0})")]
    ConnectionFailed(String),

    #[error("DNS resolution failed for {0} — check your internet connection or --base-url")]
    DnsResolution(String),

    #[error("proxy error — check your --proxy URL is correct ({0})")]
    ProxyError(String),

    #[error("TLS/SSL error — connection to the travel API failed ({0})")]
    TlsError(String),

    #[error("not authorized (HTTP {0}) — log in again or pass a valid --token")]
    Unauthorized(u16),

    #[error("unexpected HTTP status {0} from the travel API")]
    HttpStatus(u16),

    #[error("{0}")]
    Api(String),

    #[error("the travel API rejected the request")]
    Rejected,

    #[error("failed to decode API response — {0}")]
    Decode(String),

    #[error("invalid airport code \"{0}\" — must be exactly 3 letters (e.g. FCO, MXP, LHR)")]
    InvalidAirport(String),

    #[error("invalid date \"{0}\" — must be YYYY-MM-DD format (e.g. 2026-03-01)")]
    InvalidDate(String),

    #[error("invalid email address \"{0}\"")]
    InvalidEmail(String),

    #[error("invalid phone number \"{0}\" — use 7 to 15 digits, optionally prefixed by + or 00")]
    InvalidPhone(String),

    #[error("{0}")]
    Validation(String),
}

impl Error {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::ConnectionFailed(_)
                | Self::DnsResolution(_)
                | Self::ProxyError(_)
                | Self::TlsError(_)
        )
    }
}

pub fn from_http_error(err: wreq::Error) -> Error {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return Error::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return Error::DnsResolution(msg);
        }
        return Error::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return Error::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return Error::TlsError(msg);
    }

    Error::ConnectionFailed(msg)
}

pub fn from_json_error(err: serde_json::Error) -> Error {
    Error::Decode(err.to_string())
}

/// Inline message shown in an airport option list. Never propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The API answered `success: false` with a message; shown as-is.
    #[error("{0}")]
    Api(String),

    #[error("airport search failed — try again")]
    Search(String),

    #[error("network error — check your connection")]
    Network(String),
}

impl From<Error> for LookupError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api(message) => LookupError::Api(message),
            err if err.is_transport() => LookupError::Network(err.to_string()),
            err => LookupError::Search(err.to_string()),
        }
    }
}
