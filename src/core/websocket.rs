//! Reconnecting WebSocket client for `/ws/chat` and `/ws/notifications`.
//!
//! `disconnected → connecting → connected → disconnected (retry) → ...`
//!
//! A closed connection is retried with exponential backoff until
//! `max_attempts` is reached or `disconnect()` is called. Outgoing messages are
//! never queued: `send` while not connected logs a warning and drops the message.

use crate::core::namespace::build_websocket_url;
use crate::core::{ConfigProvider, ConnectionState, WsMessage};
use crate::utils::error::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const INBOUND_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            base_delay: config.reconnect_base_delay(),
            max_delay: config.reconnect_max_delay(),
            max_attempts: config.reconnect_max_attempts(),
        }
    }

    /// `base * 2^attempt`，上限 `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// 重連狀態，不涉及 I/O
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts: u32,
    manual_disconnect: bool,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
            manual_disconnect: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_manually_disconnected(&self) -> bool {
        self.manual_disconnect
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// 下一次重連前的等待時間；None 表示不再重連
    pub fn on_close(&mut self) -> Option<Duration> {
        if self.manual_disconnect || self.attempts >= self.config.max_attempts {
            return None;
        }
        let delay = self.config.delay_for(self.attempts);
        self.attempts += 1;
        Some(delay)
    }

    pub fn request_connect(&mut self) {
        self.manual_disconnect = false;
        self.attempts = 0;
    }

    pub fn request_disconnect(&mut self) {
        self.manual_disconnect = true;
    }
}

struct Worker {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl Worker {
    fn stop(self) {
        let _ = self.stop.send(());
    }
}

struct Inner {
    // 每次 connect/disconnect 遞增，舊的 worker 不得再改動狀態
    generation: u64,
    policy: ReconnectPolicy,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    worker: Option<Worker>,
}

struct Shared {
    url: String,
    inner: Mutex<Inner>,
    state: watch::Sender<ConnectionState>,
    inbound: broadcast::Sender<WsMessage>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, generation: u64, state: ConnectionState) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<WsMessage>(text) {
            Ok(message) => {
                tracing::trace!("Received {:?} message {}", message.kind, message.id);
                // 沒有訂閱者時直接丟棄
                let _ = self.inbound.send(message);
            }
            Err(e) => tracing::warn!("Dropping unparsable WebSocket frame: {}", e),
        }
    }
}

pub struct ReconnectingSocket {
    shared: Arc<Shared>,
}

impl ReconnectingSocket {
    pub fn new(url: impl Into<String>, config: ReconnectConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                inner: Mutex::new(Inner {
                    generation: 0,
                    policy: ReconnectPolicy::new(config),
                    outbound: None,
                    worker: None,
                }),
                state,
                inbound,
            }),
        }
    }

    /// 例如 `for_endpoint(&config, "/ws/chat")`
    pub fn for_endpoint<C: ConfigProvider + ?Sized>(config: &C, endpoint: &str) -> Self {
        let base = config.ws_base_url().unwrap_or(config.api_base_url());
        Self::new(
            build_websocket_url(endpoint, base),
            ReconnectConfig::from_config(config),
        )
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.shared.inbound.subscribe()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().policy.attempts()
    }

    /// 背景工作仍在執行 (連線中、已連線或等待重連計時器)
    pub fn is_active(&self) -> bool {
        self.shared
            .lock()
            .worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// 手動連線：清除手動斷線旗標、重設重試次數，並取代任何既有的連線
    pub fn connect(&self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        let generation = inner.generation;
        inner.policy.request_connect();
        inner.outbound = None;
        if let Some(worker) = inner.worker.take() {
            worker.stop();
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run(self.shared.clone(), generation, stop_rx));
        inner.worker = Some(Worker {
            handle,
            stop: stop_tx,
        });
    }

    /// 手動斷線，取消尚未觸發的重連計時器
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        inner.policy.request_disconnect();
        inner.outbound = None;
        if let Some(worker) = inner.worker.take() {
            worker.stop();
        }
        self.shared.state.send_replace(ConnectionState::Disconnected);
        tracing::debug!("WebSocket {} disconnected by request", self.shared.url);
    }

    /// App 回到前景時呼叫；只要未連線就立即重連
    pub fn on_foreground(&self) {
        if self.is_connected() {
            return;
        }
        tracing::info!("App returned to foreground, reconnecting {}", self.shared.url);
        self.connect();
    }

    /// 回傳是否已送出；未連線時只記錄警告，不排隊
    pub fn send(&self, message: &WsMessage) -> Result<bool> {
        let payload = serde_json::to_string(message)?;
        let inner = self.shared.lock();

        if let (Some(outbound), ConnectionState::Connected) = (&inner.outbound, self.state()) {
            if outbound.send(Message::Text(payload)).is_ok() {
                return Ok(true);
            }
        }

        tracing::warn!(
            "WebSocket {} is not connected, message {} not sent",
            self.shared.url,
            message.id
        );
        Ok(false)
    }
}

impl Drop for ReconnectingSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn run(shared: Arc<Shared>, generation: u64, mut stop: oneshot::Receiver<()>) {
    loop {
        if !shared.set_state(generation, ConnectionState::Connecting) {
            return;
        }
        tracing::debug!("Connecting to {}", shared.url);

        let connected = tokio::select! {
            _ = &mut stop => return,
            result = connect_async(shared.url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                {
                    let mut inner = shared.lock();
                    if inner.generation != generation {
                        return;
                    }
                    inner.policy.on_open();
                    inner.outbound = Some(outbound_tx);
                    shared.state.send_replace(ConnectionState::Connected);
                }
                tracing::info!("WebSocket connected to {}", shared.url);

                if pump(&shared, stream, outbound_rx, &mut stop).await {
                    return;
                }
            }
            Err(e) => tracing::warn!("WebSocket connection to {} failed: {}", shared.url, e),
        }

        let (delay, attempt) = {
            let mut inner = shared.lock();
            if inner.generation != generation {
                return;
            }
            inner.outbound = None;
            shared.state.send_replace(ConnectionState::Disconnected);
            (inner.policy.on_close(), inner.policy.attempts())
        };

        let Some(delay) = delay else {
            tracing::warn!(
                "Giving up on {} after {} reconnect attempts",
                shared.url,
                attempt
            );
            return;
        };

        tracing::info!("Reconnecting to {} in {:?} (attempt {})", shared.url, delay, attempt);
        tokio::select! {
            _ = &mut stop => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// 回傳 true 表示收到停止訊號
async fn pump(
    shared: &Shared,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    stop: &mut oneshot::Receiver<()>,
) -> bool {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = &mut *stop => {
                let _ = sink.send(Message::Close(None)).await;
                return true;
            }
            Some(message) = outbound.recv() => {
                if let Err(e) = sink.send(message).await {
                    tracing::warn!("WebSocket send to {} failed: {}", shared.url, e);
                    return false;
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => shared.dispatch(&text),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("WebSocket {} closed by server: {:?}", shared.url, frame);
                    return false;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket {} read error: {}", shared.url, e);
                    return false;
                }
                None => return false,
            },
        }
    }
}
