use {
    crate::{
        connection::{connection_event_loop, create_stream, ConnectionControl},
        ClientError,
        ConnectionHandler,
        Core,
        InitializationError,
        LoggingHandler,
    },
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    tokio::sync::{
        mpsc::{self, UnboundedSender},
        oneshot,
    },
    walletkit_types::{
        auth::ed25519_dalek::SigningKey,
        domain::{DecodedClientId, ProjectId},
        metadata::Metadata,
    },
};


/// Handle to an initialized wallet client.
///
/// Built once by [`WalletKit::init`] and shared as `Arc<WalletKit>` with
/// whatever needs it. Dropping the last reference closes the relay
/// connection.
#[derive(Debug)]
pub struct WalletKit {
    core: Core,
    metadata: Metadata,
    client_id: DecodedClientId,
    control_tx: UnboundedSender<ConnectionControl>,
    connected: Arc<AtomicBool>,
}

impl WalletKit {
    /// Connects to the relay and returns the shared handle. Connection events
    /// are logged.
    pub async fn init(core: Core, metadata: Metadata) -> Result<Arc<Self>, InitializationError> {
        Self::init_with_handler(core, metadata, LoggingHandler).await
    }

    /// Same as [`WalletKit::init`], reporting connection events to `handler`.
    ///
    /// Resolves once the relay accepted the websocket upgrade. Any failure to
    /// open the socket, including a rejected project ID, surfaces as
    /// [`InitializationError::Connection`]. There is no retry.
    pub async fn init_with_handler<T>(
        core: Core,
        metadata: Metadata,
        mut handler: T,
    ) -> Result<Arc<Self>, InitializationError>
    where
        T: ConnectionHandler,
    {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let client_id = DecodedClientId::from_key(&key.verifying_key());

        let request = core
            .connection_options(&key)?
            .with_origin(metadata.url().to_owned())
            .into_request()?;

        tracing::debug!(
            relay = core.relay_address(),
            client_id = %client_id.to_did_key(),
            "connecting to relay"
        );

        let socket = create_stream(request)
            .await
            .map_err(InitializationError::Connection)?;

        let connected = Arc::new(AtomicBool::new(true));
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        handler.connected();
        tokio::spawn(connection_event_loop(
            socket,
            control_rx,
            connected.clone(),
            handler,
        ));

        Ok(Arc::new(Self {
            core,
            metadata,
            client_id,
            control_tx,
            connected,
        }))
    }

    pub fn project_id(&self) -> &ProjectId {
        self.core.project_id()
    }

    pub fn relay_address(&self) -> &str {
        self.core.relay_address()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The ed25519 identity this client authenticated with.
    pub fn client_id(&self) -> &DecodedClientId {
        &self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Closes the relay connection. Fails with [`ClientError::NotConnected`]
    /// if it is already closed.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let (tx, rx) = oneshot::channel();

        self.control_tx
            .send(ConnectionControl::Disconnect { tx })
            .map_err(|_| ClientError::NotConnected)?;

        match rx.await {
            Ok(result) => result,
            // The connection went away on its own after the check above.
            Err(_) if !self.is_connected() => Err(ClientError::NotConnected),
            Err(_) => Err(ClientError::ChannelClosed),
        }
    }
}
