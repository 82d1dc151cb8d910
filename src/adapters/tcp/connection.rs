//! Tokio TCP client connection.
//!
//! Each connection runs two tasks once a handler is subscribed:
//! - a reader that turns socket reads into `Data`, `Disconnected`, `Error`
//!   and (when an idle timeout is configured) `Timeout` events
//! - a writer fed by an unbounded channel, so `write` never blocks the tick
//!
//! The idle timeout counts traffic in both directions: a listen-only client
//! that keeps receiving broadcasts is not idle.
//!
//! The tasks only start on the first `subscribe`, so bytes arriving between
//! accept and admission wait in the socket instead of being dropped.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::ports::{Connection, ConnectionEvent, ConnectionEventHandler};

const READ_BUFFER_SIZE: usize = 1024;

/// Slot holding the subscribed handler, shared with the I/O tasks.
#[derive(Default)]
struct HandlerSlot(RwLock<Option<ConnectionEventHandler>>);

impl HandlerSlot {
    fn set(&self, handler: Option<ConnectionEventHandler>) {
        *self.0.write() = handler;
    }

    fn emit(&self, event: ConnectionEvent<'_>) {
        let handler = self.0.read().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

/// Time of the last byte moved in either direction.
struct Activity(Mutex<Instant>);

impl Activity {
    fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    fn touch(&self) {
        *self.0.lock() = Instant::now();
    }

    fn deadline(&self, limit: Duration) -> Instant {
        *self.0.lock() + limit
    }
}

enum Outbound {
    Data(Vec<u8>),
    Close,
}

/// Socket halves waiting for the first subscription.
struct Idle {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

/// A client connection accepted by [`super::TcpAcceptor`].
pub struct TcpConnection {
    peer: SocketAddr,
    idle_timeout: Option<Duration>,
    runtime: Handle,
    handler: Arc<HandlerSlot>,
    activity: Arc<Activity>,
    // Unbounded: a client that stops reading grows its queue without limit.
    // Backpressure is left to the idle timeout and to the peer closing.
    outbound: mpsc::UnboundedSender<Outbound>,
    idle: Option<Idle>,
    tasks: Vec<JoinHandle<()>>,
}

impl TcpConnection {
    /// Wrap an accepted socket.
    ///
    /// Returns `None` when the socket is already unusable (no peer address)
    /// or when called outside a tokio runtime.
    pub fn from_stream(stream: TcpStream, idle_timeout: Option<Duration>) -> Option<Self> {
        let peer = stream.peer_addr().ok()?;
        let runtime = Handle::try_current().ok()?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(client = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();

        Some(Self {
            peer,
            idle_timeout,
            runtime,
            handler: Arc::new(HandlerSlot::default()),
            activity: Arc::new(Activity::new()),
            outbound: tx,
            idle: Some(Idle {
                reader,
                writer,
                outbound: rx,
            }),
            tasks: Vec::new(),
        })
    }

    /// Peer socket address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn start(&mut self) {
        let Some(idle) = self.idle.take() else {
            return;
        };

        self.activity.touch();
        self.tasks.push(self.runtime.spawn(read_loop(
            idle.reader,
            Arc::clone(&self.handler),
            Arc::clone(&self.activity),
            self.idle_timeout,
        )));
        self.tasks.push(self.runtime.spawn(write_loop(
            idle.writer,
            idle.outbound,
            Arc::clone(&self.handler),
            Arc::clone(&self.activity),
        )));
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Report the close to the handler later, the way a socket stack
    /// acknowledges a close asynchronously.
    fn acknowledge_close_later(&self) {
        let handler = Arc::clone(&self.handler);
        self.runtime.spawn(async move {
            handler.emit(ConnectionEvent::Disconnected);
        });
    }
}

impl Connection for TcpConnection {
    fn remote_addr(&self) -> String {
        self.peer.to_string()
    }

    fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.outbound.send(Outbound::Data(bytes.to_vec())).is_err() {
            self.handler.emit(ConnectionEvent::Error(io::ErrorKind::BrokenPipe));
        }
    }

    fn close(&mut self, force: bool) {
        if force || self.tasks.is_empty() {
            self.abort_tasks();
            // dropping the halves closes the socket
            self.idle = None;
            self.acknowledge_close_later();
        } else {
            // the writer drains queued data, shuts down and reports the disconnect
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    fn subscribe(&mut self, handler: ConnectionEventHandler) {
        self.handler.set(Some(handler));
        self.start();
    }

    fn unsubscribe(&mut self) {
        self.handler.set(None);
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.handler.set(None);
        self.abort_tasks();
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    handler: Arc<HandlerSlot>,
    activity: Arc<Activity>,
    idle_timeout: Option<Duration>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let result = match idle_timeout {
            Some(limit) => {
                match time::timeout_at(activity.deadline(limit), reader.read(&mut buf)).await {
                    Ok(result) => result,
                    // outbound traffic moved the deadline while we waited
                    Err(_) if activity.deadline(limit) > Instant::now() => continue,
                    Err(_) => {
                        handler.emit(ConnectionEvent::Timeout(limit));
                        return;
                    }
                }
            }
            None => reader.read(&mut buf).await,
        };

        match result {
            Ok(0) => {
                handler.emit(ConnectionEvent::Disconnected);
                return;
            }
            Ok(n) => {
                activity.touch();
                handler.emit(ConnectionEvent::Data(&buf[..n]));
            }
            Err(e) => {
                handler.emit(ConnectionEvent::Error(e.kind()));
                return;
            }
        }
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    handler: Arc<HandlerSlot>,
    activity: Arc<Activity>,
) {
    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Data(bytes) => {
                if let Err(e) = writer.write_all(&bytes).await {
                    handler.emit(ConnectionEvent::Error(e.kind()));
                    return;
                }
                activity.touch();
            }
            Outbound::Close => {
                let _ = writer.shutdown().await;
                handler.emit(ConnectionEvent::Disconnected);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct Recorder {
        data: Mutex<Vec<u8>>,
        terminal: Mutex<Vec<String>>,
    }

    fn handler_for(recorder: &Arc<Recorder>) -> ConnectionEventHandler {
        let recorder = Arc::clone(recorder);
        Arc::new(move |event: ConnectionEvent<'_>| match event {
            ConnectionEvent::Data(bytes) => recorder.data.lock().extend_from_slice(bytes),
            other => recorder.terminal.lock().push(other.to_string()),
        })
    }

    async fn pair(idle_timeout: Option<Duration>) -> (TcpConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();
        let connection = TcpConnection::from_stream(server_side, idle_timeout).unwrap();
        (connection, client)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn remote_addr_is_peer_socket_addr() {
        let (connection, client) = pair(None).await;
        assert_eq!(connection.remote_addr(), client.local_addr().unwrap().to_string());
    }

    #[tokio::test]
    async fn peer_bytes_arrive_as_data_events() {
        let (mut connection, mut client) = pair(None).await;
        let recorder = Arc::new(Recorder::default());

        // sent before subscription, must not be lost
        client.write_all(b"early ").await.unwrap();
        connection.subscribe(handler_for(&recorder));
        client.write_all(b"late").await.unwrap();

        wait_for(|| recorder.data.lock().as_slice() == b"early late").await;
    }

    #[tokio::test]
    async fn writes_reach_peer() {
        let (mut connection, mut client) = pair(None).await;
        connection.subscribe(handler_for(&Arc::new(Recorder::default())));

        connection.write(b"hello");
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn peer_hangup_raises_disconnect() {
        let (mut connection, client) = pair(None).await;
        let recorder = Arc::new(Recorder::default());
        connection.subscribe(handler_for(&recorder));

        drop(client);
        wait_for(|| recorder.terminal.lock().contains(&"disconnect".to_string())).await;
    }

    #[tokio::test]
    async fn idle_peer_raises_timeout() {
        let (mut connection, _client) = pair(Some(Duration::from_millis(20))).await;
        let recorder = Arc::new(Recorder::default());
        connection.subscribe(handler_for(&recorder));

        wait_for(|| {
            recorder
                .terminal
                .lock()
                .iter()
                .any(|e| e.starts_with("timeout"))
        })
        .await;
    }

    #[tokio::test]
    async fn outbound_traffic_keeps_listen_only_peer_alive() {
        let (mut connection, mut client) = pair(Some(Duration::from_millis(80))).await;
        let recorder = Arc::new(Recorder::default());
        connection.subscribe(handler_for(&recorder));

        // the peer never sends, it only receives broadcasts
        for _ in 0..10 {
            connection.write(b"tick");
            time::sleep(Duration::from_millis(25)).await;
        }
        assert!(recorder.terminal.lock().is_empty(), "timed out while receiving");

        let mut received = [0u8; 40];
        client.read_exact(&mut received).await.unwrap();

        // once traffic stops the timeout fires
        wait_for(|| {
            recorder
                .terminal
                .lock()
                .iter()
                .any(|e| e.starts_with("timeout"))
        })
        .await;
    }

    #[tokio::test]
    async fn graceful_close_flushes_then_disconnects() {
        let (mut connection, mut client) = pair(None).await;
        let recorder = Arc::new(Recorder::default());
        connection.subscribe(handler_for(&recorder));

        connection.write(b"bye");
        connection.close(false);

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"bye".to_vec());
        wait_for(|| !recorder.terminal.lock().is_empty()).await;
    }

    #[tokio::test]
    async fn forced_close_ack_after_unsubscribe_is_dropped() {
        let (mut connection, mut client) = pair(None).await;
        let recorder = Arc::new(Recorder::default());
        connection.subscribe(handler_for(&recorder));

        connection.close(true);
        connection.unsubscribe();

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        time::sleep(Duration::from_millis(20)).await;
        assert!(recorder.terminal.lock().is_empty());
    }
}
