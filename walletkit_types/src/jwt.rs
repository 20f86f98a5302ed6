use {
    crate::domain::DidKey,
    chrono::Utc,
    ed25519_dalek::{Signer, SigningKey},
    serde::{de::DeserializeOwned, Deserialize, Serialize},
    std::collections::HashSet,
};

pub const JWT_DELIMITER: &str = ".";
pub const JWT_HEADER_TYP: &str = "JWT";
pub const JWT_HEADER_ALG: &str = "EdDSA";
pub const JWT_VALIDATION_TIME_LEEWAY_SECS: i64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Invalid format")]
    Format,

    #[error("Invalid encoding")]
    Encoding,

    #[error("Invalid JWT signing algorithm")]
    Header,

    #[error("JWT is expired: {expiration:?}")]
    Expired { expiration: Option<i64> },

    #[error("JWT is not yet valid: iat={iat}, leeway={leeway}")]
    NotYetValid { iat: i64, leeway: i64 },

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Invalid signature")]
    Signature,

    #[error("Signing key does not match the issuer")]
    InvalidKeypair,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
pub struct JwtHeader<'a> {
    #[serde(borrow)]
    pub typ: &'a str,
    #[serde(borrow)]
    pub alg: &'a str,
}

impl Default for JwtHeader<'_> {
    fn default() -> Self {
        Self {
            typ: JWT_HEADER_TYP,
            alg: JWT_HEADER_ALG,
        }
    }
}

impl JwtHeader<'_> {
    pub fn is_valid(&self) -> bool {
        self.typ == JWT_HEADER_TYP && self.alg == JWT_HEADER_ALG
    }
}

/// Claims carried by the relay auth token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JwtBasicClaims {
    /// Client identity as `did:key`.
    pub iss: DidKey,
    /// Relay URL.
    pub aud: String,
    /// Random per-connection subject.
    pub sub: String,
    /// Issued at, timestamp.
    pub iat: i64,
    /// Expiration, timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl VerifyableClaims for JwtBasicClaims {
    fn basic(&self) -> &JwtBasicClaims {
        self
    }
}

pub trait VerifyableClaims: Serialize + DeserializeOwned {
    /// Returns a reference to the basic claims.
    fn basic(&self) -> &JwtBasicClaims;

    /// Signs the claims with `key`, which must match the `iss` claim.
    fn encode(&self, key: &SigningKey) -> Result<String, JwtError> {
        let issuer = self
            .basic()
            .iss
            .0
            .as_public_key()
            .map_err(|_| JwtError::InvalidKeypair)?;

        if issuer != key.verifying_key() {
            return Err(JwtError::InvalidKeypair);
        }

        let encoder = &data_encoding::BASE64URL_NOPAD;
        let header = encoder.encode(serde_json::to_string(&JwtHeader::default())?.as_bytes());
        let claims = encoder.encode(serde_json::to_string(self)?.as_bytes());
        let message = format!("{header}{JWT_DELIMITER}{claims}");
        let signature = encoder.encode(&key.sign(message.as_bytes()).to_bytes());

        Ok(format!("{message}{JWT_DELIMITER}{signature}"))
    }

    /// Parses the claims and checks the signature against the `iss` key.
    ///
    /// Expiry and audience are checked separately by
    /// [`VerifyableClaims::verify_basic()`].
    fn try_from_str(data: &str) -> Result<Self, JwtError>
    where
        Self: Sized,
    {
        let mut parts = data.splitn(3, JWT_DELIMITER);

        let (Some(header), Some(claims)) = (parts.next(), parts.next()) else {
            return Err(JwtError::Format);
        };

        let decoder = &data_encoding::BASE64URL_NOPAD;

        let header = decoder
            .decode(header.as_bytes())
            .map_err(|_| JwtError::Encoding)?;

        if !serde_json::from_slice::<JwtHeader>(&header)?.is_valid() {
            return Err(JwtError::Header);
        }

        let claims = decoder
            .decode(claims.as_bytes())
            .map_err(|_| JwtError::Encoding)?;
        let claims = serde_json::from_slice::<Self>(&claims)?;

        let mut parts = data.rsplitn(2, JWT_DELIMITER);

        let (Some(signature), Some(message)) = (parts.next(), parts.next()) else {
            return Err(JwtError::Format);
        };

        let key = jsonwebtoken::DecodingKey::from_ed_der(claims.basic().iss.as_ref());

        let verified = jsonwebtoken::crypto::verify(
            signature,
            message.as_bytes(),
            &key,
            jsonwebtoken::Algorithm::EdDSA,
        );

        match verified {
            Ok(true) => Ok(claims),

            _ => Err(JwtError::Signature),
        }
    }

    /// Checks expiry, not-before and audience, with a leeway in seconds.
    fn verify_basic(
        &self,
        aud: &HashSet<String>,
        leeway: impl Into<Option<i64>>,
    ) -> Result<(), JwtError> {
        let basic = self.basic();
        let leeway = leeway.into().unwrap_or(JWT_VALIDATION_TIME_LEEWAY_SECS);
        let now = Utc::now().timestamp();

        if matches!(basic.exp, Some(exp) if now - leeway > exp) {
            return Err(JwtError::Expired {
                expiration: basic.exp,
            });
        }

        if now + leeway < basic.iat {
            return Err(JwtError::NotYetValid {
                iat: basic.iat,
                leeway,
            });
        }

        if !aud.contains(&basic.aud) {
            return Err(JwtError::InvalidAudience);
        }

        Ok(())
    }
}
