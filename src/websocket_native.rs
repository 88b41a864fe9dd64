//! Native client for the host push socket
//!
//! Runs tokio-tungstenite on a background thread and forwards raw text frames
//! through a channel; parsing happens on the consumer side.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::ws_state::WsState;

pub struct NativeWsClient {
    /// Raw incoming frames
    pub rx: UnboundedReceiver<String>,
    /// Shared connection state
    pub state: Arc<Mutex<WsState>>,
}

impl NativeWsClient {
    /// Connect and send `auth` as the first frame, if given
    pub fn connect(url: &str, auth: Option<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(WsState::Connecting));

        let url = url.to_string();
        let state_clone = state.clone();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "Failed to create tokio runtime");
                    *state_clone.lock() = WsState::Error(e.to_string());
                    return;
                }
            };
            rt.block_on(Self::run_websocket(&url, auth, tx, state_clone));
        });

        Self { rx, state }
    }

    pub fn state(&self) -> WsState {
        self.state.lock().clone()
    }

    async fn run_websocket(
        url: &str,
        auth: Option<String>,
        tx: UnboundedSender<String>,
        state: Arc<Mutex<WsState>>,
    ) {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::{connect_async, tungstenite::Message};

        info!(url, "Connecting to push socket");

        let ws_stream = match connect_async(url).await {
            Ok((stream, _)) => {
                info!("Push socket connected");
                *state.lock() = WsState::Connected;
                stream
            }
            Err(e) => {
                error!(error = %e, "Failed to connect");
                *state.lock() = WsState::Error(e.to_string());
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        if let Some(auth) = auth {
            debug!("Authenticating push socket");
            if let Err(e) = write.send(Message::Text(auth.into())).await {
                error!(error = %e, "Failed to send auth message");
                *state.lock() = WsState::Error(e.to_string());
                return;
            }
        }

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if tx.send(text.to_string()).is_err() {
                        // consumer gone
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    warn!("Push socket closed by server");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Push socket error");
                    *state.lock() = WsState::Error(e.to_string());
                    return;
                }
                _ => {}
            }
        }

        warn!("Push socket stream ended");
        *state.lock() = WsState::Disconnected;
    }
}
