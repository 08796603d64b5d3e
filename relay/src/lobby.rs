//! Peer pairing and liveness tracking for the relay
//!
//! The relay never simulates anything; its whole job is introducing two
//! peers to each other and shuttling opaque payloads between them. This
//! module owns the bookkeeping side of that:
//! - pairing the first two joiners into a match (first in = Home)
//! - generating the shared match seed both clients feed their spawners
//! - liveness timestamps and timeout-based cleanup
//! - partner lookup for payload forwarding

use log::info;
use rand::Rng;
use shared::entity::Side;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected peer as the relay sees it
///
/// Tracks the assigned side, the partner once paired, the match seed
/// (kept so a lost `MatchStart` can be re-served on a duplicate join),
/// and the last time any traffic arrived from this address.
#[derive(Debug)]
pub struct Peer {
    pub addr: SocketAddr,
    pub side: Side,
    pub last_seen: Instant,
    pub partner: Option<SocketAddr>,
    pub seed: Option<u64>,
}

impl Peer {
    pub fn new(addr: SocketAddr, side: Side) -> Self {
        Self {
            addr,
            side,
            last_seen: Instant::now(),
            partner: None,
            seed: None,
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Result of processing a `Join` from some address
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinOutcome {
    /// First peer in; parked until a partner shows up.
    Waiting { side: Side },
    /// Second peer in; a match forms with the given shared seed.
    Paired {
        side: Side,
        partner: SocketAddr,
        seed: u64,
    },
    /// Duplicate join from a known address (lost reply); re-serve the
    /// original answers.
    Rejoined { side: Side, seed: Option<u64> },
}

/// Tracks every connected peer and the single waiting slot
///
/// UDP gives no connection lifecycle, so membership is defined entirely
/// by traffic: a peer exists from its first `Join` until it leaves or
/// times out. Pairing is strictly first-come-first-served with exactly
/// one peer parked in the waiting slot.
pub struct Lobby {
    peers: HashMap<SocketAddr, Peer>,
    waiting: Option<SocketAddr>,
    timeout: Duration,
}

impl Lobby {
    pub fn new(timeout: Duration) -> Self {
        Self {
            peers: HashMap::new(),
            waiting: None,
            timeout,
        }
    }

    /// Registers a join, pairing it with the waiting peer if one exists.
    ///
    /// Joins are idempotent per address: replays from a peer that never
    /// heard our reply return `Rejoined` with everything it needs.
    pub fn join(&mut self, addr: SocketAddr) -> JoinOutcome {
        if let Some(peer) = self.peers.get_mut(&addr) {
            peer.last_seen = Instant::now();
            return JoinOutcome::Rejoined {
                side: peer.side,
                seed: peer.seed,
            };
        }

        match self.waiting.take() {
            None => {
                self.peers.insert(addr, Peer::new(addr, Side::Home));
                self.waiting = Some(addr);
                info!("Peer {} waiting for a partner", addr);
                JoinOutcome::Waiting { side: Side::Home }
            }
            Some(partner_addr) => {
                let seed: u64 = rand::thread_rng().gen();

                let mut peer = Peer::new(addr, Side::Away);
                peer.partner = Some(partner_addr);
                peer.seed = Some(seed);
                self.peers.insert(addr, peer);

                if let Some(partner) = self.peers.get_mut(&partner_addr) {
                    partner.partner = Some(addr);
                    partner.seed = Some(seed);
                }

                info!("Match formed: {} vs {} (seed {})", partner_addr, addr, seed);
                JoinOutcome::Paired {
                    side: Side::Away,
                    partner: partner_addr,
                    seed,
                }
            }
        }
    }

    /// Partner address for payload forwarding, if the peer is paired.
    pub fn partner_of(&self, addr: SocketAddr) -> Option<SocketAddr> {
        self.peers.get(&addr).and_then(|peer| peer.partner)
    }

    /// Refreshes the liveness timestamp. Returns false for unknown peers.
    pub fn touch(&mut self, addr: SocketAddr) -> bool {
        if let Some(peer) = self.peers.get_mut(&addr) {
            peer.last_seen = Instant::now();
            true
        } else {
            false
        }
    }

    /// Removes a peer and dissolves its match. Returns the partner that
    /// should be notified with `PeerLeft`, if any. The partner is removed
    /// too; clients rejoin from scratch for a new match.
    pub fn leave(&mut self, addr: SocketAddr) -> Option<SocketAddr> {
        let peer = self.peers.remove(&addr)?;
        if self.waiting == Some(addr) {
            self.waiting = None;
        }
        info!("Peer {} left", addr);

        let partner_addr = peer.partner?;
        self.peers.remove(&partner_addr);
        if self.waiting == Some(partner_addr) {
            self.waiting = None;
        }
        Some(partner_addr)
    }

    /// Sweeps out peers that went silent. Returns (dead, partner) pairs;
    /// each partner needs a `PeerLeft` notification.
    pub fn check_timeouts(&mut self) -> Vec<(SocketAddr, Option<SocketAddr>)> {
        let timeout = self.timeout;
        let dead: Vec<SocketAddr> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.is_timed_out(timeout))
            .map(|(addr, _)| *addr)
            .collect();

        dead.iter()
            .map(|&addr| (addr, self.leave(addr)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    fn lobby() -> Lobby {
        Lobby::new(Duration::from_secs(5))
    }

    #[test]
    fn test_first_join_waits_as_home() {
        let mut lobby = lobby();

        let outcome = lobby.join(addr(1000));
        assert_eq!(outcome, JoinOutcome::Waiting { side: Side::Home });
        assert_eq!(lobby.len(), 1);
        assert_eq!(lobby.partner_of(addr(1000)), None);
    }

    #[test]
    fn test_second_join_pairs_as_away() {
        let mut lobby = lobby();
        lobby.join(addr(1000));

        match lobby.join(addr(1001)) {
            JoinOutcome::Paired {
                side,
                partner,
                seed: _,
            } => {
                assert_eq!(side, Side::Away);
                assert_eq!(partner, addr(1000));
            }
            other => panic!("expected pairing, got {:?}", other),
        }

        assert_eq!(lobby.partner_of(addr(1000)), Some(addr(1001)));
        assert_eq!(lobby.partner_of(addr(1001)), Some(addr(1000)));
    }

    #[test]
    fn test_duplicate_join_is_idempotent() {
        let mut lobby = lobby();
        lobby.join(addr(1000));

        let seed = match lobby.join(addr(1001)) {
            JoinOutcome::Paired { seed, .. } => seed,
            other => panic!("expected pairing, got {:?}", other),
        };

        // Away's Joined reply was lost; it joins again.
        match lobby.join(addr(1001)) {
            JoinOutcome::Rejoined {
                side,
                seed: replay_seed,
            } => {
                assert_eq!(side, Side::Away);
                assert_eq!(replay_seed, Some(seed));
            }
            other => panic!("expected rejoin, got {:?}", other),
        }
        assert_eq!(lobby.len(), 2);
    }

    #[test]
    fn test_third_join_starts_a_new_waiting_slot() {
        let mut lobby = lobby();
        lobby.join(addr(1000));
        lobby.join(addr(1001));

        let outcome = lobby.join(addr(1002));
        assert_eq!(outcome, JoinOutcome::Waiting { side: Side::Home });
        assert_eq!(lobby.len(), 3);
    }

    #[test]
    fn test_leave_dissolves_match() {
        let mut lobby = lobby();
        lobby.join(addr(1000));
        lobby.join(addr(1001));

        let partner = lobby.leave(addr(1000));
        assert_eq!(partner, Some(addr(1001)));
        assert!(lobby.is_empty());
    }

    #[test]
    fn test_leave_of_waiting_peer_clears_slot() {
        let mut lobby = lobby();
        lobby.join(addr(1000));

        assert_eq!(lobby.leave(addr(1000)), None);
        assert!(lobby.is_empty());

        // Next joiner becomes the new waiting Home, not a partner of a ghost.
        assert_eq!(
            lobby.join(addr(1001)),
            JoinOutcome::Waiting { side: Side::Home }
        );
    }

    #[test]
    fn test_leave_unknown_peer_is_noop() {
        let mut lobby = lobby();
        assert_eq!(lobby.leave(addr(9999)), None);
    }

    #[test]
    fn test_timeout_sweep_notifies_partner() {
        let mut lobby = Lobby::new(Duration::from_millis(10));
        lobby.join(addr(1000));
        lobby.join(addr(1001));

        if let Some(peer) = lobby.peers.get_mut(&addr(1000)) {
            peer.last_seen = Instant::now() - Duration::from_secs(1);
        }

        let swept = lobby.check_timeouts();
        assert_eq!(swept, vec![(addr(1000), Some(addr(1001)))]);
        assert!(lobby.is_empty());
    }

    #[test]
    fn test_touch_refreshes_known_peers_only() {
        let mut lobby = lobby();
        lobby.join(addr(1000));

        assert!(lobby.touch(addr(1000)));
        assert!(!lobby.touch(addr(2000)));
    }
}
