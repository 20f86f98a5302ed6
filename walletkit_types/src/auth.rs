use {
    crate::{
        domain::DecodedClientId,
        jwt::{JwtBasicClaims, JwtError, VerifyableClaims},
    },
    chrono::{DateTime, Utc},
    ed25519_dalek::SigningKey,
    serde::{Deserialize, Serialize},
    std::{fmt::Display, time::Duration},
};
pub use {chrono, ed25519_dalek, rand};

pub mod did;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid duration")]
    InvalidDuration,

    #[error("Failed to sign token: {0}")]
    Jwt(#[from] JwtError),
}

pub const RELAY_WEBSOCKET_ADDRESS: &str = "wss://relay.walletconnect.org";

pub const MULTICODEC_ED25519_BASE: &str = "z";
pub const MULTICODEC_ED25519_HEADER: [u8; 2] = [237, 1];
pub const MULTICODEC_ED25519_LENGTH: usize = 32;

pub const DEFAULT_TOKEN_AUD: &str = RELAY_WEBSOCKET_ADDRESS;

/// Signed relay auth token, ready to be sent as the `auth` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedAuthToken(String);

impl Display for SerializedAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for SerializedAuthToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SerializedAuthToken> for String {
    fn from(value: SerializedAuthToken) -> Self {
        value.0
    }
}

/// Builder for the relay auth token.
#[derive(Debug, Clone)]
pub struct AuthToken {
    sub: String,
    aud: Option<String>,
    iat: Option<DateTime<Utc>>,
    ttl: Option<Duration>,
}

impl AuthToken {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            aud: None,
            iat: None,
            ttl: None,
        }
    }

    pub fn aud(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn iat(mut self, iat: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.iat = iat.into();
        self
    }

    pub fn ttl(mut self, ttl: impl Into<Option<Duration>>) -> Self {
        self.ttl = ttl.into();
        self
    }

    pub fn as_jwt(&self, key: &SigningKey) -> Result<SerializedAuthToken, Error> {
        let iat = self.iat.unwrap_or_else(Utc::now);
        let aud = self.aud.as_deref().unwrap_or(DEFAULT_TOKEN_AUD);

        let exp = self
            .ttl
            .map(chrono::Duration::from_std)
            .transpose()
            .map_err(|_| Error::InvalidDuration)?
            .map(|ttl| (iat + ttl).timestamp());

        let claims = JwtBasicClaims {
            iss: DecodedClientId::from_key(&key.verifying_key()).into(),
            sub: self.sub.clone(),
            aud: aud.to_owned(),
            iat: iat.timestamp(),
            exp,
        };

        Ok(SerializedAuthToken(claims.encode(key)?))
    }
}
