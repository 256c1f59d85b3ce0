//! Realtime order event client
//!
//! Maintains one authenticated WebSocket connection per subscriber, binds
//! it to an order channel, and invokes consumer callbacks for each domain
//! event. Reconnects with exponential backoff on abnormal closes and
//! reconnects immediately when the host surface reports it became visible
//! again after being backgrounded.
//!
//! The connection is owned by a spawned task; handles talk to it over a
//! command channel. Callbacks live in a shared cell read at dispatch time,
//! so swapping them never touches the socket.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use barkeep_core::{BarkeepError, Channel, Order, OrderEvent, OrderStatus};

use crate::auth::EventsAuth;
use crate::protocol::{self, ClientFrame, ServerFrame};
use crate::state::{ConnectionPhase, RetryPolicy};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

pub type OrderCallback = Box<dyn Fn(Order) + Send + Sync>;
pub type StatusChangedCallback = Box<dyn Fn(Order, Option<OrderStatus>) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(BarkeepError) + Send + Sync>;

/// Consumer callbacks for order events
///
/// All callbacks are optional. They run on the connection task, so they
/// should hand heavy work off rather than block.
#[derive(Default)]
pub struct OrderEventCallbacks {
    pub on_order_created: Option<OrderCallback>,
    pub on_order_status_changed: Option<StatusChangedCallback>,
    pub on_order_completed: Option<OrderCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl OrderEventCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_order_created(mut self, f: impl Fn(Order) + Send + Sync + 'static) -> Self {
        self.on_order_created = Some(Box::new(f));
        self
    }

    pub fn on_order_status_changed(
        mut self,
        f: impl Fn(Order, Option<OrderStatus>) + Send + Sync + 'static,
    ) -> Self {
        self.on_order_status_changed = Some(Box::new(f));
        self
    }

    pub fn on_order_completed(mut self, f: impl Fn(Order) + Send + Sync + 'static) -> Self {
        self.on_order_completed = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(BarkeepError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for OrderEventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderEventCallbacks")
            .field("on_order_created", &self.on_order_created.is_some())
            .field("on_order_status_changed", &self.on_order_status_changed.is_some())
            .field("on_order_completed", &self.on_order_completed.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

type CallbackCell = Arc<RwLock<OrderEventCallbacks>>;

/// Configuration for the realtime client
#[derive(Debug, Clone)]
pub struct OrderEventsConfig {
    pub auth: EventsAuth,
    pub retry: RetryPolicy,
}

impl OrderEventsConfig {
    pub fn new(realtime_endpoint: &str, api_key: impl Into<String>) -> Self {
        Self {
            auth: EventsAuth::new(realtime_endpoint, api_key),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Commands from handles to the connection task
#[derive(Debug)]
enum Command {
    SetEnabled(bool),
    SetChannel(Channel),
    /// Host surface became visible again; recover immediately if down
    Resume,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connection status readable from any thread
#[derive(Debug, Default)]
struct ClientStatus {
    phase: Mutex<ConnectionPhase>,
    last_error: Mutex<Option<String>>,
}

impl ClientStatus {
    fn phase(&self) -> ConnectionPhase {
        *lock(&self.phase)
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        *lock(&self.phase) = phase;
    }

    fn record_error(&self, message: impl Into<String>) {
        *lock(&self.last_error) = Some(message.into());
    }

    fn clear_error(&self) {
        *lock(&self.last_error) = None;
    }

    fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }
}

/// Handle to a realtime order event subscription
///
/// Cloneable; the underlying connection closes with a normal close code
/// once every handle is dropped.
#[derive(Clone)]
pub struct OrderEventsClient {
    command_tx: mpsc::Sender<Command>,
    callbacks: CallbackCell,
    status: Arc<ClientStatus>,
}

impl OrderEventsClient {
    /// Open a subscription on `channel` and spawn its connection task
    ///
    /// With `enabled` false the task stays idle until [`set_enabled`]
    /// turns it on. This call never fails; connectivity problems surface
    /// through [`is_connected`], [`last_error`], and the error callback.
    ///
    /// [`set_enabled`]: OrderEventsClient::set_enabled
    /// [`is_connected`]: OrderEventsClient::is_connected
    /// [`last_error`]: OrderEventsClient::last_error
    pub fn subscribe(
        config: OrderEventsConfig,
        channel: Channel,
        callbacks: OrderEventCallbacks,
        enabled: bool,
    ) -> Self {
        let callbacks = Arc::new(RwLock::new(callbacks));
        let status = Arc::new(ClientStatus::default());
        let (command_tx, command_rx) = mpsc::channel(16);

        tokio::spawn(connection_loop(
            config,
            channel,
            enabled,
            Arc::clone(&callbacks),
            Arc::clone(&status),
            command_rx,
        ));

        Self {
            command_tx,
            callbacks,
            status,
        }
    }

    /// Whether the server has acknowledged the current connection
    pub fn is_connected(&self) -> bool {
        self.status.phase().is_connected()
    }

    /// Current lifecycle phase of the connection
    pub fn phase(&self) -> ConnectionPhase {
        self.status.phase()
    }

    /// The most recent transport or protocol error, if any
    pub fn last_error(&self) -> Option<String> {
        self.status.last_error()
    }

    /// Replace the callbacks without touching the connection
    pub async fn set_callbacks(&self, callbacks: OrderEventCallbacks) {
        *self.callbacks.write().await = callbacks;
    }

    /// Enable or disable the subscription
    ///
    /// Disabling closes the socket with a normal close code and cancels
    /// any pending reconnect; enabling starts over with a fresh attempt
    /// counter.
    pub async fn set_enabled(&self, enabled: bool) {
        let _ = self.command_tx.send(Command::SetEnabled(enabled)).await;
    }

    /// Switch to another channel, tearing down the current connection
    pub async fn set_channel(&self, channel: Channel) {
        let _ = self.command_tx.send(Command::SetChannel(channel)).await;
    }

    /// Signal that the host surface regained visibility
    ///
    /// If the subscription is enabled and the socket is down (including
    /// mid-backoff or parked after exhausting retries), this resets the
    /// attempt counter and connects immediately, overriding the backoff
    /// timer. No-op while the connection is healthy.
    pub async fn notify_visible(&self) {
        let _ = self.command_tx.send(Command::Resume).await;
    }
}

impl fmt::Debug for OrderEventsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderEventsClient")
            .field("phase", &self.status.phase())
            .finish()
    }
}

/// How a single connection session ended
enum SessionEnd {
    /// Every handle dropped; the task should exit
    Shutdown,
    /// Disabled by the consumer
    Disabled,
    /// Channel replaced; reconnect immediately on the new one
    Rewire,
    /// Clean close from the server; stay down until nudged
    Normal,
    /// Transport or protocol failure; eligible for reconnect
    Abnormal,
}

async fn connection_loop(
    config: OrderEventsConfig,
    mut channel: Channel,
    mut enabled: bool,
    callbacks: CallbackCell,
    status: Arc<ClientStatus>,
    mut command_rx: mpsc::Receiver<Command>,
) {
    let mut attempts: u32 = 0;
    // Parked means disconnected-on-purpose: after a clean server close or
    // once the retry ceiling is hit. Only an external nudge leaves it.
    let mut parked = false;

    loop {
        if !enabled || parked {
            status.set_phase(ConnectionPhase::Disconnected);
            let Some(cmd) = command_rx.recv().await else {
                return;
            };
            match cmd {
                Command::SetEnabled(true) => {
                    enabled = true;
                    parked = false;
                    attempts = 0;
                }
                Command::SetEnabled(false) => enabled = false,
                Command::SetChannel(new_channel) => {
                    channel = new_channel;
                    parked = false;
                    attempts = 0;
                }
                Command::Resume => {
                    if enabled {
                        parked = false;
                        attempts = 0;
                    }
                }
            }
            continue;
        }

        let end = run_session(
            &config,
            &mut channel,
            &callbacks,
            &status,
            &mut command_rx,
            &mut attempts,
        )
        .await;
        status.set_phase(ConnectionPhase::Disconnected);

        match end {
            SessionEnd::Shutdown => return,
            SessionEnd::Disabled => enabled = false,
            SessionEnd::Rewire => attempts = 0,
            SessionEnd::Normal => parked = true,
            SessionEnd::Abnormal => {
                if config.retry.exhausted(attempts) {
                    warn!(
                        "giving up after {} reconnect attempts; waiting for an external nudge",
                        attempts
                    );
                    parked = true;
                    continue;
                }

                let delay = config.retry.delay(attempts);
                attempts += 1;
                info!(
                    "reconnecting in {:?} (attempt {}/{})",
                    delay, attempts, config.retry.max_attempts
                );

                // The backoff wait stays responsive to commands: disable
                // cancels the pending reconnect, a channel change or a
                // visibility regain overrides it with a fresh attempt.
                let deadline = Instant::now() + delay;
                loop {
                    tokio::select! {
                        _ = sleep_until(deadline) => break,
                        cmd = command_rx.recv() => match cmd {
                            None => return,
                            Some(Command::SetEnabled(false)) => {
                                enabled = false;
                                break;
                            }
                            Some(Command::SetEnabled(true)) => {}
                            Some(Command::SetChannel(new_channel)) => {
                                channel = new_channel;
                                attempts = 0;
                                break;
                            }
                            Some(Command::Resume) => {
                                attempts = 0;
                                break;
                            }
                        },
                    }
                }
            }
        }
    }
}

/// Run one connect/subscribe/read session to completion
async fn run_session(
    config: &OrderEventsConfig,
    channel: &mut Channel,
    callbacks: &CallbackCell,
    status: &ClientStatus,
    command_rx: &mut mpsc::Receiver<Command>,
    attempts: &mut u32,
) -> SessionEnd {
    status.set_phase(ConnectionPhase::Connecting);
    let url = config.auth.ws_url();
    info!("connecting to {}", url);

    let mut request = match url.as_str().into_client_request() {
        Ok(request) => request,
        Err(e) => {
            error!("failed to build websocket request: {}", e);
            status.record_error(e.to_string());
            surface_error(callbacks, BarkeepError::config(e.to_string())).await;
            return SessionEnd::Abnormal;
        }
    };

    // Both subprotocols ride in one header: the event-stream protocol name
    // and the base64url-encoded authorization token.
    match HeaderValue::from_str(&config.auth.subprotocol_header()) {
        Ok(value) => {
            request
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", value);
        }
        Err(e) => {
            error!("invalid subprotocol header: {}", e);
            status.record_error(e.to_string());
            surface_error(callbacks, BarkeepError::auth(e.to_string())).await;
            return SessionEnd::Abnormal;
        }
    }

    let ws_stream = match connect_async(request).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            error!("connection failed: {}", e);
            status.record_error(e.to_string());
            surface_error(callbacks, BarkeepError::network(e.to_string())).await;
            return SessionEnd::Abnormal;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    debug!("socket open, sending connection_init");
    status.set_phase(ConnectionPhase::Connected);
    if !send_frame(&mut write, &ClientFrame::ConnectionInit).await {
        return SessionEnd::Abnormal;
    }

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(ServerFrame::ConnectionAck) => {
                            info!("connection acknowledged, subscribing to {}", channel);
                            *attempts = 0;
                            status.clear_error();

                            let subscription_id = Uuid::new_v4().to_string();
                            let subscribe = ClientFrame::Subscribe {
                                id: subscription_id,
                                channel: channel.name(),
                                authorization: config.auth.authorization(),
                            };
                            status.set_phase(ConnectionPhase::Subscribing);
                            if !send_frame(&mut write, &subscribe).await {
                                return SessionEnd::Abnormal;
                            }
                        }
                        Ok(ServerFrame::SubscribeSuccess { id }) => {
                            debug!("subscribed to {} (id: {:?})", channel, id);
                            status.set_phase(ConnectionPhase::Subscribed);
                        }
                        Ok(ServerFrame::Data { event }) => {
                            if status.phase().can_dispatch() {
                                match protocol::decode_event(&event) {
                                    Ok(event) => dispatch(callbacks, event).await,
                                    Err(e) => warn!("dropping undecodable event frame: {}", e),
                                }
                            } else {
                                // The server only publishes after
                                // subscribe_success; defend against
                                // reordering anyway.
                                debug!("data frame before subscribe_success, dropping");
                            }
                        }
                        Ok(ServerFrame::Ka) => {
                            // Keep-alive, ignore silently
                        }
                        Ok(ServerFrame::Error { errors })
                        | Ok(ServerFrame::ConnectionError { errors }) => {
                            let message = protocol::summarize(&errors);
                            error!("server error frame: {}", message);
                            status.record_error(&message);
                            surface_error(callbacks, BarkeepError::protocol(&message)).await;
                            status.set_phase(ConnectionPhase::Closing);
                            close_socket(&mut write, "server error").await;
                            return SessionEnd::Abnormal;
                        }
                        Err(e) => {
                            debug!("unrecognized frame ({}): {}", e, text);
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        warn!("failed to send pong: {}", e);
                        return SessionEnd::Abnormal;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let clean = matches!(&frame, Some(f) if f.code == CloseCode::Normal);
                    info!("connection closed by server: {:?}", frame);
                    return if clean { SessionEnd::Normal } else { SessionEnd::Abnormal };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("socket error: {}", e);
                    status.record_error(e.to_string());
                    surface_error(callbacks, BarkeepError::network(e.to_string())).await;
                    return SessionEnd::Abnormal;
                }
                None => {
                    info!("stream ended");
                    return SessionEnd::Abnormal;
                }
            },

            cmd = command_rx.recv() => match cmd {
                None => {
                    status.set_phase(ConnectionPhase::Closing);
                    close_socket(&mut write, "subscription dropped").await;
                    return SessionEnd::Shutdown;
                }
                Some(Command::SetEnabled(false)) => {
                    status.set_phase(ConnectionPhase::Closing);
                    close_socket(&mut write, "disabled").await;
                    return SessionEnd::Disabled;
                }
                Some(Command::SetEnabled(true)) => {}
                Some(Command::SetChannel(new_channel)) => {
                    if new_channel != *channel {
                        *channel = new_channel;
                        status.set_phase(ConnectionPhase::Closing);
                        close_socket(&mut write, "channel changed").await;
                        return SessionEnd::Rewire;
                    }
                }
                Some(Command::Resume) => {
                    // Socket is up; nothing to recover.
                }
            },
        }
    }
}

async fn send_frame(write: &mut WsSink, frame: &ClientFrame) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => match write.send(Message::Text(json.into())).await {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to send frame: {}", e);
                false
            }
        },
        Err(e) => {
            error!("failed to encode frame: {}", e);
            false
        }
    }
}

async fn close_socket(write: &mut WsSink, reason: &str) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: reason.to_string().into(),
    };
    if let Err(e) = write.send(Message::Close(Some(frame))).await {
        debug!("close frame not delivered: {}", e);
    }
}

async fn dispatch(callbacks: &CallbackCell, event: OrderEvent) {
    let callbacks = callbacks.read().await;
    match event {
        OrderEvent::OrderCreated { data } => {
            debug!("order created: {}", data.id);
            if let Some(cb) = &callbacks.on_order_created {
                cb(data);
            }
        }
        OrderEvent::OrderStatusChanged { data } => {
            let previous = data.previous();
            debug!(
                "order {} status: {:?} -> {}",
                data.order.id, previous, data.order.status
            );
            if let Some(cb) = &callbacks.on_order_status_changed {
                cb(data.order, previous);
            }
        }
        OrderEvent::OrderCompleted { data } => {
            debug!("order completed: {}", data.id);
            if let Some(cb) = &callbacks.on_order_completed {
                cb(data);
            }
        }
    }
}

async fn surface_error(callbacks: &CallbackCell, error: BarkeepError) {
    let callbacks = callbacks.read().await;
    if let Some(cb) = &callbacks.on_error {
        cb(error);
    }
}
