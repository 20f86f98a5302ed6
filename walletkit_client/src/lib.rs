//! WalletKit client: validates the app configuration, opens the relay
//! connection and hands out a shared [`WalletKit`] handle.

pub use {connection::*, error::*, kit::*};
use {
    serde::Serialize,
    tokio_tungstenite::tungstenite::{client::IntoClientRequest, http},
    walletkit_types::{
        auth::{
            ed25519_dalek::SigningKey,
            AuthToken,
            SerializedAuthToken,
            RELAY_WEBSOCKET_ADDRESS,
        },
        domain::{AuthSubject, ProjectId},
    },
};

mod connection;
mod error;
mod kit;

pub type HttpRequest<T> = http::Request<T>;

/// Lifetime of the relay auth token.
pub const AUTH_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(60 * 60 * 24);

/// Validated client configuration: the project ID and the relay to use.
#[derive(Debug, Clone)]
pub struct Core {
    project_id: ProjectId,
    relay_address: String,
}

impl Core {
    /// Fails with [`InitializationError::InvalidProjectId`] if the ID is empty
    /// or not 32 hex characters.
    pub fn new(project_id: impl Into<ProjectId>) -> Result<Self, InitializationError> {
        let project_id = project_id.into();
        project_id.validate()?;

        Ok(Self {
            project_id,
            relay_address: RELAY_WEBSOCKET_ADDRESS.into(),
        })
    }

    pub fn with_relay_address(mut self, address: impl Into<String>) -> Self {
        self.relay_address = address.into();
        self
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn relay_address(&self) -> &str {
        &self.relay_address
    }

    /// Signs a fresh relay auth token for `key` and wraps it into connection
    /// options.
    pub fn connection_options(
        &self,
        key: &SigningKey,
    ) -> Result<ConnectionOptions, InitializationError> {
        let auth = AuthToken::new(AuthSubject::generate().to_string())
            .aud(self.relay_address.clone())
            .ttl(AUTH_TOKEN_TTL)
            .as_jwt(key)?;

        Ok(ConnectionOptions::new(self.project_id.clone(), auth)
            .with_address(self.relay_address.clone()))
    }
}

/// Relay connection options.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// The relay websocket address.
    pub address: String,

    pub project_id: ProjectId,

    /// Auth token passed as the `auth` query parameter.
    pub auth: SerializedAuthToken,

    /// Optional origin of the request. Subject to allow-list validation on the
    /// relay.
    pub origin: Option<String>,

    /// Optional user agent, sent as the `ua` query parameter.
    pub user_agent: Option<String>,
}

impl ConnectionOptions {
    pub fn new(project_id: impl Into<ProjectId>, auth: SerializedAuthToken) -> Self {
        Self {
            address: RELAY_WEBSOCKET_ADDRESS.into(),
            project_id: project_id.into(),
            auth,
            origin: None,
            user_agent: Some(default_user_agent()),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<Option<String>>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<Option<String>>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn into_request(self) -> Result<HttpRequest<()>, RequestBuildError> {
        let ConnectionOptions {
            address,
            project_id,
            auth,
            origin,
            user_agent,
        } = self;

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct QueryParams {
            project_id: ProjectId,
            auth: SerializedAuthToken,
            #[serde(skip_serializing_if = "Option::is_none")]
            ua: Option<String>,
        }

        let query = serde_qs::to_string(&QueryParams {
            project_id,
            auth,
            ua: user_agent,
        })?;

        let mut request = format!("{}/?{query}", address.trim_end_matches('/'))
            .into_client_request()
            .map_err(RequestBuildError::Other)?;

        if let Some(origin) = origin.filter(|origin| !origin.is_empty()) {
            let value = origin.parse().map_err(|_| RequestBuildError::Headers)?;
            request.headers_mut().append("Origin", value);
        }

        Ok(request)
    }
}

/// `wc-2/rust-walletkit_client-<version>/<os>`
pub fn default_user_agent() -> String {
    format!(
        "wc-2/rust-{}-{}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}
