//! Per-connection read and write pumps.
//!
//! A [`ClientSession`] bridges one websocket to the hub. The read pump runs
//! on the connection's own task, decodes frames and hands them to the
//! router. The write pump runs on a second task and drains the session's
//! outbound queue onto the socket, probing the peer with a ping whenever the
//! connection has been quiet for a full ping interval.
//!
//! Either pump ending tears the whole session down: the read pump stops when
//! the writer exits, and the writer stops once the hub drops the session's
//! outbound queue.

use super::{HubHandle, SessionId};
use crate::config::SessionSettings;
use crate::messaging::{Flow, MessageRouter, OutgoingMessage, SessionState};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

/// One client connection after a successful handshake.
pub struct ClientSession {
    state: SessionState,
    remote_addr: SocketAddr,
    settings: SessionSettings,
    hub: HubHandle,
    router: Arc<MessageRouter>,
}

impl ClientSession {
    pub fn new(
        state: SessionState,
        remote_addr: SocketAddr,
        settings: SessionSettings,
        hub: HubHandle,
        router: Arc<MessageRouter>,
    ) -> Self {
        Self {
            state,
            remote_addr,
            settings,
            hub,
            router,
        }
    }

    pub fn id(&self) -> SessionId {
        self.state.session
    }

    /// Runs both pumps until the connection ends, then cleans up.
    ///
    /// Cleanup logs the user out of the registry and unregisters the session
    /// from the hub, which in turn stops the writer.
    pub async fn run<S>(mut self, ws: WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = self.id();
        let (sink, stream) = ws.split();
        let (outbound, queue) = mpsc::channel(self.settings.outbound_capacity);
        let (writer_done, writer_gone) = oneshot::channel::<()>();

        self.hub.register(id, outbound);
        info!(
            "🔗 Session {} opened from {} ({})",
            id, self.remote_addr, self.state.identity.subject
        );

        let writer = tokio::spawn(write_pump(id, sink, queue, self.settings.clone(), writer_done));
        self.read_pump(stream, writer_gone).await;

        self.router.disconnect(&mut self.state).await;
        self.hub.unregister(id);
        if timeout(self.settings.write_wait, writer).await.is_err() {
            warn!(session = %id, "writer did not stop in time");
        }
        info!("🔌 Session {} from {} closed", id, self.remote_addr);
    }

    async fn read_pump<S>(
        &mut self,
        mut stream: SplitStream<WebSocketStream<S>>,
        mut writer_gone: oneshot::Receiver<()>,
    )
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let id = self.id();
        loop {
            let frame = tokio::select! {
                _ = &mut writer_gone => {
                    debug!(session = %id, "writer stopped, ending read pump");
                    break;
                }
                frame = timeout(self.settings.pong_wait, stream.next()) => frame,
            };

            let message = match frame {
                Err(_) => {
                    warn!(session = %id, "no frame within {:?}, closing", self.settings.pong_wait);
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    debug!(session = %id, error = %e, "read failed");
                    break;
                }
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => {
                    if self.router.route_text(&mut self.state, text.as_str()).await == Flow::Close {
                        break;
                    }
                }
                Message::Binary(_) => {
                    self.hub
                        .send_to(id, &OutgoingMessage::error("Binary frames are not supported"));
                }
                Message::Close(_) => {
                    debug!(session = %id, "peer sent close");
                    break;
                }
                // Any frame resets the read deadline; pings are answered by tungstenite.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}

/// Drains the outbound queue onto the socket.
///
/// The ping timer restarts after every write, so a ping is only sent after
/// a full interval without outbound traffic. When the hub drops the queue a
/// close frame is sent and the pump ends.
async fn write_pump<S>(
    id: SessionId,
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut queue: mpsc::Receiver<Message>,
    settings: SessionSettings,
    _done: oneshot::Sender<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ping = interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let message = tokio::select! {
            queued = queue.recv() => match queued {
                Some(message) => message,
                None => {
                    let _ = timeout(settings.write_wait, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ping.tick() => Message::Ping(Default::default()),
        };

        match timeout(settings.write_wait, sink.send(message)).await {
            Ok(Ok(())) => ping.reset(),
            Ok(Err(e)) => {
                debug!(session = %id, error = %e, "write failed");
                break;
            }
            Err(_) => {
                warn!(session = %id, "write timed out after {:?}", settings.write_wait);
                break;
            }
        }
    }
    debug!(session = %id, "write pump stopped");
}
