//! Relay network layer: UDP socket tasks and the envelope-handling loop

use crate::lobby::{JoinOutcome, Lobby};
use log::{debug, error, info, warn};
use shared::wire::{decode_envelope, encode_envelope, Envelope, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

const PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from the network tasks to the main relay loop
#[derive(Debug)]
pub enum RelayMessage {
    EnvelopeReceived {
        envelope: Envelope,
        addr: SocketAddr,
    },
    PeerTimeout {
        addr: SocketAddr,
        partner: Option<SocketAddr>,
    },
}

/// Outgoing traffic queued by the relay loop for the sender task
#[derive(Debug)]
struct Outgoing {
    envelope: Envelope,
    addr: SocketAddr,
}

/// The matchmaking/forwarding relay between exactly two peers per match.
///
/// Never inspects game traffic: `Forward` payloads pass through as
/// opaque bytes, so the peer protocol can evolve without touching this
/// binary.
pub struct Relay {
    socket: Arc<UdpSocket>,
    lobby: Arc<RwLock<Lobby>>,

    relay_tx: mpsc::UnboundedSender<RelayMessage>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
    out_tx: mpsc::UnboundedSender<Outgoing>,
    out_rx: mpsc::UnboundedReceiver<Outgoing>,
}

impl Relay {
    pub async fn new(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Relay listening on {}", socket.local_addr()?);

        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        Ok(Relay {
            socket,
            lobby: Arc::new(RwLock::new(Lobby::new(PEER_TIMEOUT))),
            relay_tx,
            relay_rx,
            out_tx,
            out_rx,
        })
    }

    /// Bound address; useful when started on an ephemeral port.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// Spawns the task that listens for incoming datagrams
    fn spawn_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let relay_tx = self.relay_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match decode_envelope(&buffer[0..len]) {
                        Ok(envelope) => {
                            if relay_tx
                                .send(RelayMessage::EnvelopeReceived { envelope, addr })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => warn!("Undecodable datagram from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing queue
    fn spawn_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut out_rx = std::mem::replace(&mut self.out_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(Outgoing { envelope, addr }) = out_rx.recv().await {
                match encode_envelope(&envelope) {
                    Ok(data) => {
                        if let Err(e) = socket.send_to(&data, addr).await {
                            error!("Failed to send to {}: {}", addr, e);
                        }
                    }
                    Err(e) => error!("Failed to encode envelope: {}", e),
                }
            }
        });
    }

    /// Spawns the task that sweeps out silent peers
    fn spawn_timeout_checker(&self) {
        let lobby = Arc::clone(&self.lobby);
        let relay_tx = self.relay_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let swept = {
                    let mut lobby = lobby.write().await;
                    lobby.check_timeouts()
                };

                for (addr, partner) in swept {
                    if relay_tx
                        .send(RelayMessage::PeerTimeout { addr, partner })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    fn send(&self, envelope: Envelope, addr: SocketAddr) {
        if self.out_tx.send(Outgoing { envelope, addr }).is_err() {
            error!("Failed to queue envelope for {}", addr);
        }
    }

    async fn handle_envelope(&mut self, envelope: Envelope, addr: SocketAddr) {
        match envelope {
            Envelope::Join { client_version } => {
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Peer {} has protocol version {} (want {}), ignoring",
                        addr, client_version, PROTOCOL_VERSION
                    );
                    return;
                }

                let outcome = {
                    let mut lobby = self.lobby.write().await;
                    lobby.join(addr)
                };

                match outcome {
                    JoinOutcome::Waiting { side } => {
                        self.send(Envelope::Joined { side }, addr);
                    }
                    JoinOutcome::Paired {
                        side,
                        partner,
                        seed,
                    } => {
                        self.send(Envelope::Joined { side }, addr);
                        self.send(Envelope::MatchStart { seed }, addr);
                        self.send(Envelope::MatchStart { seed }, partner);
                    }
                    JoinOutcome::Rejoined { side, seed } => {
                        self.send(Envelope::Joined { side }, addr);
                        if let Some(seed) = seed {
                            self.send(Envelope::MatchStart { seed }, addr);
                        }
                    }
                }
            }

            Envelope::Forward { data } => {
                let partner = {
                    let mut lobby = self.lobby.write().await;
                    lobby.touch(addr);
                    lobby.partner_of(addr)
                };

                match partner {
                    Some(partner) => self.send(Envelope::Forward { data }, partner),
                    None => debug!("Dropping payload from unpaired peer {}", addr),
                }
            }

            Envelope::KeepAlive => {
                let mut lobby = self.lobby.write().await;
                if !lobby.touch(addr) {
                    debug!("Keep-alive from unknown peer {}", addr);
                }
            }

            Envelope::Leave => {
                let partner = {
                    let mut lobby = self.lobby.write().await;
                    lobby.leave(addr)
                };
                if let Some(partner) = partner {
                    self.send(Envelope::PeerLeft, partner);
                }
            }

            Envelope::Joined { .. } | Envelope::MatchStart { .. } | Envelope::PeerLeft => {
                warn!("Unexpected relay-to-client envelope from {}", addr);
            }
        }
    }

    /// Main relay loop: spawns the socket tasks, then reacts to traffic
    /// and timeouts until shutdown.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_receiver();
        self.spawn_sender();
        self.spawn_timeout_checker();

        info!("Relay started");

        while let Some(message) = self.relay_rx.recv().await {
            match message {
                RelayMessage::EnvelopeReceived { envelope, addr } => {
                    self.handle_envelope(envelope, addr).await;
                }
                RelayMessage::PeerTimeout { addr, partner } => {
                    info!("Peer {} timed out", addr);
                    if let Some(partner) = partner {
                        self.send(Envelope::PeerLeft, partner);
                    }
                }
            }
        }

        info!("Relay shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relay_binds_ephemeral_port() {
        let relay = Relay::new("127.0.0.1:0").await.unwrap();
        let addr = relay.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_relay_message_shapes() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();

        let msg = RelayMessage::EnvelopeReceived {
            envelope: Envelope::KeepAlive,
            addr,
        };
        match msg {
            RelayMessage::EnvelopeReceived { envelope, addr: a } => {
                assert_eq!(envelope, Envelope::KeepAlive);
                assert_eq!(a, addr);
            }
            _ => panic!("unexpected message kind"),
        }

        let msg = RelayMessage::PeerTimeout {
            addr,
            partner: None,
        };
        match msg {
            RelayMessage::PeerTimeout { partner, .. } => assert_eq!(partner, None),
            _ => panic!("unexpected message kind"),
        }
    }
}
