//! JWT claims structure.
//!
//! Contains the claims extracted from verified bearer tokens. The subject is
//! redacted in Debug output to prevent exposure in logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims carried by identity-service tokens.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject id. Numeric or string depending on the identity store.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Any other fields the issuer included.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Claims {
    /// The subject id as a string, whatever its JSON type.
    pub fn subject(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Custom Debug implementation that redacts the subject and contact fields.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("user_id", &self.user_id.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
