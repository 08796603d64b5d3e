//! Client side of the replication channel.
//!
//! macroquad owns the main thread, so the socket lives on a background
//! thread running a small tokio runtime. The game loop talks to it
//! through two queues: sends are fire-and-forget (a closed channel is
//! logged, never blocks a tick), and arrivals pile up until the loop
//! drains them once per tick.

use log::{error, info, warn};
use shared::wire::{
    decode_envelope, encode_envelope, encode_message, Envelope, Message, WireError,
};
use std::net::SocketAddr;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc as tokio_mpsc;
use tokio::time::sleep;

pub struct NetClient {
    outgoing: tokio_mpsc::UnboundedSender<Envelope>,
    incoming: std_mpsc::Receiver<Envelope>,
}

impl NetClient {
    /// Binds an ephemeral local port and starts the socket thread.
    /// `fake_ping_ms` adds an artificial round-trip for netcode testing,
    /// split across the send and receive paths.
    pub fn connect(
        server_addr: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let server: SocketAddr = server_addr.parse()?;

        let (outgoing, out_rx) = tokio_mpsc::unbounded_channel::<Envelope>();
        let (incoming_tx, incoming) = std_mpsc::channel::<Envelope>();

        thread::Builder::new()
            .name("kickabout-net".to_string())
            .spawn(move || socket_thread(server, fake_ping_ms, out_rx, incoming_tx))?;

        info!("Network thread started for {}", server);
        Ok(NetClient { outgoing, incoming })
    }

    /// Queues an envelope for sending. Never blocks; a closed channel is
    /// logged and the envelope is dropped.
    pub fn send(&self, envelope: Envelope) {
        if self.outgoing.send(envelope).is_err() {
            warn!("Send failed: {}", WireError::ChannelClosed);
        }
    }

    /// Encodes and forwards a peer message through the relay.
    pub fn send_message(&self, message: &Message) {
        match encode_message(message) {
            Ok(data) => self.send(Envelope::Forward { data }),
            Err(e) => error!("Failed to encode message: {}", e),
        }
    }

    /// Everything that arrived since the last drain, in receipt order.
    /// Called exactly once per tick so messages are never applied
    /// mid-pipeline.
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.incoming.try_iter().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}

fn socket_thread(
    server: SocketAddr,
    fake_ping_ms: u64,
    mut out_rx: tokio_mpsc::UnboundedReceiver<Envelope>,
    incoming_tx: std_mpsc::Sender<Envelope>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build network runtime: {}", e);
            return;
        }
    };

    runtime.block_on(async move {
        let socket = match UdpSocket::bind("0.0.0.0:0").await {
            Ok(socket) => socket,
            Err(e) => {
                error!("Failed to bind socket: {}", e);
                return;
            }
        };
        if let Err(e) = socket.connect(server).await {
            error!("Failed to connect socket to {}: {}", server, e);
            return;
        }

        let mut buffer = [0u8; 2048];

        loop {
            tokio::select! {
                result = socket.recv(&mut buffer) => match result {
                    Ok(len) => {
                        if fake_ping_ms > 0 {
                            sleep(Duration::from_millis(fake_ping_ms / 2)).await;
                        }
                        match decode_envelope(&buffer[0..len]) {
                            Ok(envelope) => {
                                if incoming_tx.send(envelope).is_err() {
                                    // Game loop is gone.
                                    break;
                                }
                            }
                            Err(e) => warn!("Undecodable datagram: {}", e),
                        }
                    }
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        sleep(Duration::from_millis(10)).await;
                    }
                },

                maybe = out_rx.recv() => match maybe {
                    Some(envelope) => {
                        if fake_ping_ms > 0 {
                            sleep(Duration::from_millis(fake_ping_ms / 2)).await;
                        }
                        match encode_envelope(&envelope) {
                            Ok(data) => {
                                if let Err(e) = socket.send(&data).await {
                                    error!("Failed to send: {}", e);
                                }
                            }
                            Err(e) => error!("Failed to encode envelope: {}", e),
                        }
                    }
                    None => break,
                },
            }
        }
    });
}
