//! Websocket topic listener.
//!
//! [`register`] connects to a STOMP broker, subscribes every registration's
//! route and spawns one task that routes MESSAGE frames to the registered
//! callbacks. The task ends on an ERROR frame, on socket close, or when the
//! listener is disconnected. There is no reconnect.

use std::{collections::HashMap, sync::Arc};

use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PushError, PushResult};
use crate::frame::{Command, Frame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type Callback = Arc<dyn Fn(PushMessage) + Send + Sync>;

/// A server-pushed message delivered to a callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushMessage {
    pub destination: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Clone)]
pub struct Registration {
    pub route: String,
    pub callback: Callback,
}

impl Registration {
    pub fn new(route: impl Into<String>, callback: impl Fn(PushMessage) + Send + Sync + 'static) -> Self {
        Self {
            route: route.into(),
            callback: Arc::new(callback),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct PushConfig {
    pub url: String,
}

impl PushConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn host(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".into())
    }
}

/// Handle to a running listener.
pub struct PushListener {
    outbound: mpsc::UnboundedSender<Frame>,
    task: JoinHandle<PushResult<()>>,
}

impl PushListener {
    /// Sends DISCONNECT and waits for the listener task to finish.
    pub async fn disconnect(self) -> PushResult<()> {
        let _ = self.outbound.send(Frame::new(Command::Disconnect));
        drop(self.outbound);
        join(self.task).await
    }

    /// Waits until the broker ends the session.
    pub async fn closed(self) -> PushResult<()> {
        join(self.task).await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn join(task: JoinHandle<PushResult<()>>) -> PushResult<()> {
    match task.await {
        Ok(result) => result,
        Err(err) => Err(PushError::Protocol(format!("listener task failed: {err}"))),
    }
}

/// Connects, subscribes each route and starts dispatching.
///
/// Subscription ids are `sub-0`, `sub-1`, … in registration order.
pub async fn register(config: &PushConfig, registrations: Vec<Registration>) -> PushResult<PushListener> {
    let (socket, _response) = tokio_tungstenite::connect_async(config.url.as_str())
        .await
        .map_err(|err| PushError::connect(&config.url, err))?;
    let (mut write, mut read) = socket.split();

    let connect = Frame::new(Command::Connect)
        .header("accept-version", "1.2")
        .header("host", config.host())
        .header("heart-beat", "0,0");
    write.send(Message::Text(connect.encode().into())).await?;

    'handshake: loop {
        let message = match read.next().await {
            Some(message) => message?,
            None => return Err(PushError::Closed("CONNECTED")),
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return Err(PushError::Closed("CONNECTED")),
            _ => continue,
        };
        for frame in Frame::decode_all(text.as_str())? {
            match frame.command {
                Command::Connected => break 'handshake,
                Command::Error => return Err(broker_error(&frame)),
                other => debug!(command = other.as_str(), "ignoring frame before CONNECTED"),
            }
        }
    }
    info!(url = %config.url, "push channel connected");

    let mut routes = HashMap::new();
    for (idx, registration) in registrations.into_iter().enumerate() {
        let id = format!("sub-{idx}");
        let subscribe = Frame::new(Command::Subscribe)
            .header("id", id.clone())
            .header("destination", registration.route.clone())
            .header("ack", "auto");
        write.send(Message::Text(subscribe.encode().into())).await?;
        info!(route = %registration.route, subscription = %id, "subscribed");
        routes.insert(id, registration);
    }

    let (outbound, outbound_rx) = mpsc::unbounded_channel::<Frame>();
    let task = tokio::spawn(run_session(write, read, outbound_rx, routes));

    Ok(PushListener { outbound, task })
}

async fn run_session(
    mut write: SplitSink<Socket, Message>,
    mut read: SplitStream<Socket>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    routes: HashMap<String, Registration>,
) -> PushResult<()> {
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    let disconnect = frame.command == Command::Disconnect;
                    write.send(Message::Text(frame.encode().into())).await?;
                    if disconnect {
                        let _ = write.close().await;
                        return Ok(());
                    }
                }
                None => {
                    let _ = write.close().await;
                    return Ok(());
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    for frame in Frame::decode_all(text.as_str())? {
                        dispatch(&routes, frame)?;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("push channel closed by broker");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            },
        }
    }
}

fn dispatch(routes: &HashMap<String, Registration>, frame: Frame) -> PushResult<()> {
    match frame.command {
        Command::Message => {}
        Command::Error => {
            let err = broker_error(&frame);
            warn!(error = %err, "push channel rejected");
            return Err(err);
        }
        other => {
            debug!(command = other.as_str(), "ignoring frame");
            return Ok(());
        }
    }

    let destination = frame.get("destination").unwrap_or_default().to_string();
    let registration = frame
        .get("subscription")
        .and_then(|id| routes.get(id))
        .or_else(|| routes.values().find(|reg| reg.route == destination));
    let Some(registration) = registration else {
        debug!(%destination, "message for unknown subscription");
        return Ok(());
    };

    debug!(%destination, "push message received");
    (registration.callback)(PushMessage {
        destination,
        headers: frame.headers,
        body: frame.body,
    });
    Ok(())
}

fn broker_error(frame: &Frame) -> PushError {
    let message = frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.clone());
    PushError::Protocol(message)
}
