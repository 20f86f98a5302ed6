use {
    crate::{
        auth::{
            did::{combine_did_data, extract_did_data, DidError, DID_METHOD_KEY},
            MULTICODEC_ED25519_BASE,
            MULTICODEC_ED25519_HEADER,
            MULTICODEC_ED25519_LENGTH,
        },
    },
    derive_more::{AsMut, AsRef},
    ed25519_dalek::VerifyingKey,
    serde::{Deserialize, Serialize},
    std::{str::FromStr, sync::Arc},
};


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientIdDecodingError {
    #[error("Invalid multicodec base")]
    Base,

    #[error("Invalid base58")]
    Encoding,

    #[error("Invalid multicodec header")]
    Header,

    #[error("Invalid DID key data: {0}")]
    Did(#[from] DidError),

    #[error("Invalid public key length")]
    Length,

    #[error("Not a valid ed25519 public key")]
    Key,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodingError {
    #[error("Invalid encoding")]
    Encoding,

    #[error("Invalid data length")]
    Length,
}

/// Reasons a project ID is refused before any connection is attempted.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProjectIdError {
    #[error("Project ID is empty")]
    Empty,

    #[error("Project ID is malformed: {0}")]
    Malformed(DecodingError),
}

impl ProjectId {
    /// Checks that the ID is present and well-formed, returning its decoded
    /// bytes.
    pub fn validate(&self) -> Result<DecodedProjectId, ProjectIdError> {
        if self.0.is_empty() {
            return Err(ProjectIdError::Empty);
        }

        self.decode().map_err(ProjectIdError::Malformed)
    }
}

/// [`DecodedClientId`] that (de)serializes as `did:key:z...`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, AsRef, AsMut, Serialize, Deserialize)]
#[as_ref(forward)]
#[as_mut(forward)]
pub struct DidKey(
    #[serde(with = "crate::serde_helpers::client_id_as_did_key")] pub DecodedClientId,
);

impl From<DecodedClientId> for DidKey {
    fn from(val: DecodedClientId) -> Self {
        Self(val)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, AsRef, AsMut, Serialize, Deserialize)]
#[as_ref(forward)]
#[as_mut(forward)]
pub struct DecodedClientId(pub [u8; MULTICODEC_ED25519_LENGTH]);

impl DecodedClientId {
    pub fn try_from_did_key(did: &str) -> Result<Self, ClientIdDecodingError> {
        extract_did_data(did, DID_METHOD_KEY)?.parse()
    }

    pub fn to_did_key(&self) -> String {
        combine_did_data(DID_METHOD_KEY, &self.to_string())
    }

    pub fn from_key(key: &VerifyingKey) -> Self {
        Self(*key.as_bytes())
    }

    pub fn as_public_key(&self) -> Result<VerifyingKey, ClientIdDecodingError> {
        VerifyingKey::from_bytes(&self.0).map_err(|_| ClientIdDecodingError::Key)
    }
}

impl From<VerifyingKey> for DecodedClientId {
    fn from(key: VerifyingKey) -> Self {
        Self::from_key(&key)
    }
}

impl FromStr for DecodedClientId {
    type Err = ClientIdDecodingError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        const TOTAL_DECODED_LENGTH: usize =
            MULTICODEC_ED25519_HEADER.len() + MULTICODEC_ED25519_LENGTH;

        let stripped = val
            .strip_prefix(MULTICODEC_ED25519_BASE)
            .ok_or(ClientIdDecodingError::Base)?;

        let mut decoded = [0u8; TOTAL_DECODED_LENGTH];

        let decoded_len = bs58::decode(stripped)
            .into(&mut decoded)
            .map_err(|_| ClientIdDecodingError::Encoding)?;

        if decoded_len != TOTAL_DECODED_LENGTH {
            return Err(ClientIdDecodingError::Length);
        }

        let key = decoded
            .strip_prefix(&MULTICODEC_ED25519_HEADER)
            .ok_or(ClientIdDecodingError::Header)?;

        let mut data = Self::default();
        data.0.copy_from_slice(key);

        Ok(data)
    }
}

impl std::fmt::Display for DecodedClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefixed: Vec<u8> = MULTICODEC_ED25519_HEADER
            .iter()
            .chain(self.0.iter())
            .copied()
            .collect();

        let encoded = bs58::encode(prefixed).into_string();

        write!(f, "{MULTICODEC_ED25519_BASE}{encoded}")
    }
}

/// Declares a string identifier together with its fixed-length, hex-encoded
/// byte form.
macro_rules! hex_id {
    ($(#[$meta:meta])* $Id:ident => $Decoded:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Serialize,
            Deserialize,
            ::derive_more::Display,
            ::derive_more::From,
            AsRef,
        )]
        #[serde(transparent)]
        #[as_ref(forward)]
        #[from(forward)]
        pub struct $Id(Arc<str>);

        #[derive(Debug, Default, Clone, Hash, PartialEq, Eq, AsRef, AsMut)]
        #[as_ref(forward)]
        #[as_mut(forward)]
        pub struct $Decoded(pub [u8; $len]);

        impl $Decoded {
            pub const LENGTH: usize = $len;

            pub fn generate() -> Self {
                Self(rand::Rng::gen::<[u8; $len]>(&mut rand::thread_rng()))
            }
        }

        impl FromStr for $Decoded {
            type Err = DecodingError;

            fn from_str(val: &str) -> Result<Self, Self::Err> {
                if val.is_empty() {
                    return Err(DecodingError::Length);
                }

                let hex = &data_encoding::HEXLOWER_PERMISSIVE;

                if hex.decode_len(val.len()).map_err(|_| DecodingError::Length)? != $len {
                    return Err(DecodingError::Length);
                }

                let mut data = Self::default();

                hex.decode_mut(val.as_bytes(), &mut data.0)
                    .map_err(|_| DecodingError::Encoding)?;

                Ok(data)
            }
        }

        impl std::fmt::Display for $Decoded {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&data_encoding::HEXLOWER.encode(&self.0))
            }
        }

        impl $Id {
            pub fn decode(&self) -> Result<$Decoded, DecodingError> {
                self.0.parse()
            }

            pub fn generate() -> Self {
                Self::from($Decoded::generate())
            }
        }

        impl From<$Decoded> for $Id {
            fn from(val: $Decoded) -> Self {
                Self(val.to_string().into())
            }
        }
    };
}

hex_id! {
    /// Identifies the application to the WalletConnect cloud. Issued by the
    /// dashboard as 32 hex characters.
    ProjectId => DecodedProjectId, 16
}

hex_id! {
    /// Subject of a relay auth token.
    AuthSubject => DecodedAuthSubject, 32
}
