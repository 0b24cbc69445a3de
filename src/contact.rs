use serde::Serialize;

use crate::booking::validate_email;
use crate::error::Error;

/// Body of `POST /mail/send-mail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    pub fn query(from: &str, name: &str, subject: &str, message: &str) -> Self {
        Self {
            from: from.trim().to_string(),
            kind: "query".to_string(),
            name: name.trim().to_string(),
            subject: subject.trim().to_string(),
            message: message.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !validate_email(&self.from) {
            return Err(Error::InvalidEmail(self.from.clone()));
        }
        if self.name.is_empty() {
            return Err(Error::Validation("name is required".into()));
        }
        if self.message.trim().is_empty() {
            return Err(Error::Validation("message cannot be empty".into()));
        }
        Ok(())
    }
}
