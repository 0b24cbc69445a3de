use std::env;

pub const TOKEN_VAR: &str = "VIAGGI_TOKEN";

/// Source of the bearer token attached to every API request.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<String>);

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionStore for StaticSession {
    fn token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}

/// Reads the token on every request so a refreshed value is picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSession;

impl SessionStore for EnvSession {
    fn token(&self) -> Option<String> {
        env::var(TOKEN_VAR)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
