use {
    crate::{ClientError, CloseFrame, HttpRequest, TransportError},
    futures_util::StreamExt,
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    tokio::{
        net::TcpStream,
        sync::{mpsc::UnboundedReceiver, oneshot},
    },
    tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream},
};

pub type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handlers for the background relay connection events.
pub trait ConnectionHandler: Send + 'static {
    /// Called once the relay accepted the connection.
    fn connected(&mut self) {}

    /// Called when the relay connection is closed, by either side.
    fn disconnected(&mut self, _frame: Option<CloseFrame<'static>>) {}

    /// Called when reading from the socket failed. The connection is dropped
    /// right after.
    fn inbound_error(&mut self, _error: TransportError) {}
}

/// Handler used by [`WalletKit::init`](crate::WalletKit::init): logs the
/// events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ConnectionHandler for LoggingHandler {
    fn connected(&mut self) {
        tracing::info!("relay connection open");
    }

    fn disconnected(&mut self, frame: Option<CloseFrame<'static>>) {
        match frame {
            Some(frame) => tracing::info!(%frame, "relay connection closed"),
            None => tracing::info!("relay connection closed"),
        }
    }

    fn inbound_error(&mut self, error: TransportError) {
        tracing::warn!(%error, "relay connection error");
    }
}

pub(crate) enum ConnectionControl {
    Disconnect {
        tx: oneshot::Sender<Result<(), ClientError>>,
    },
}

/// Opens the websocket connection to the relay.
pub(crate) async fn create_stream(
    request: HttpRequest<()>,
) -> Result<SocketStream, TransportError> {
    let (socket, _) = connect_async(request).await?;

    Ok(socket)
}

/// Owns the socket until the relay closes it, the handle asks to disconnect,
/// or the handle is dropped.
pub(crate) async fn connection_event_loop<T>(
    mut socket: SocketStream,
    mut control_rx: UnboundedReceiver<ConnectionControl>,
    connected: Arc<AtomicBool>,
    mut handler: T,
) where
    T: ConnectionHandler,
{
    loop {
        tokio::select! {
            event = control_rx.recv() => {
                connected.store(false, Ordering::Release);

                let result = socket.close(None).await.map_err(ClientError::ClosingFailed);
                handler.disconnected(None);

                // Control TX has been dropped when there is no event.
                if let Some(ConnectionControl::Disconnect { tx }) = event {
                    tx.send(result).ok();
                }

                break;
            }

            message = socket.next() => {
                match message {
                    Some(Ok(Message::Close(frame))) => {
                        connected.store(false, Ordering::Release);
                        // Flushes the close reply.
                        socket.close(None).await.ok();
                        handler.disconnected(frame);
                        break;
                    }

                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(len = text.len(), "ignoring inbound relay message");
                    }

                    Some(Ok(_)) => {}

                    Some(Err(error)) => {
                        connected.store(false, Ordering::Release);
                        handler.inbound_error(error);
                        handler.disconnected(None);
                        break;
                    }

                    None => {
                        connected.store(false, Ordering::Release);
                        handler.disconnected(None);
                        break;
                    }
                }
            }
        }
    }
}
