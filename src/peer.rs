use std::net::SocketAddr;

use crate::error::{EngineError, Stamp};
use crate::socket::PeerSocket;
use crate::timestamp::{diff_in_seconds, Timestamp};

/// Send intents and write-once timestamps of one peer.
///
/// The ping path runs `idle -> wants_ping -> sent -> idle` and the pong path
/// `idle -> wants_pong -> sent -> idle`; both may be pending at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerState {
    pub id: usize,
    pub wants_ping: bool,
    pub wants_pong: bool,
    pub ping_sent_at: Option<Timestamp>,
    pub pong_received_at: Option<Timestamp>,
    ping_received: bool,
}

impl PeerState {
    pub fn new(id: usize) -> PeerState {
        PeerState {
            id,
            ..Default::default()
        }
    }

    pub fn arm_ping(&mut self) {
        self.wants_ping = true;
    }

    pub fn wants_write(&self) -> bool {
        self.wants_ping || self.wants_pong
    }

    /// A PING arrived from this peer; a PONG is owed.
    pub fn on_ping_received(&mut self) -> Result<(), EngineError> {
        if self.ping_received {
            return Err(EngineError::DuplicatePing { peer: self.id });
        }
        self.ping_received = true;
        self.wants_pong = true;
        Ok(())
    }

    /// Finish the ping path. `sent_at` is `None` when the ping was abandoned.
    pub fn on_ping_sent(&mut self, sent_at: Option<Timestamp>) -> Result<(), EngineError> {
        if let Some(sent_at) = sent_at {
            if self.ping_sent_at.is_some() {
                return Err(EngineError::TimestampAlreadySet {
                    peer: self.id,
                    stamp: Stamp::PingSent,
                });
            }
            self.ping_sent_at = Some(sent_at);
        }
        self.wants_ping = false;
        Ok(())
    }

    pub fn on_pong_sent(&mut self) {
        self.wants_pong = false;
    }

    pub fn on_pong_received(&mut self, received_at: Timestamp) -> Result<(), EngineError> {
        if self.pong_received_at.is_some() {
            return Err(EngineError::TimestampAlreadySet {
                peer: self.id,
                stamp: Stamp::PongReceived,
            });
        }
        self.pong_received_at = Some(received_at);
        Ok(())
    }

    /// Round-trip time in seconds. Missing timestamps count as zero, so an
    /// unfinished exchange yields a meaningless but finite value.
    pub fn round_trip(&self) -> f64 {
        diff_in_seconds(
            self.ping_sent_at.unwrap_or_default(),
            self.pong_received_at.unwrap_or_default(),
        )
    }
}

/// A remote participant and the socket dedicated to it.
pub struct Peer {
    /// Where PINGs and PONGs for this peer are sent.
    pub remote: SocketAddr,
    pub channel: PeerSocket,
    pub state: PeerState,
}

/// Hands out peer indices in order, each exactly once.
#[derive(Clone, Debug, Default)]
pub struct StaggerCursor {
    next: usize,
}

impl StaggerCursor {
    pub fn advance(&mut self, peer_count: usize) -> Option<usize> {
        if self.next < peer_count {
            self.next += 1;
            Some(self.next - 1)
        } else {
            None
        }
    }

    pub fn is_exhausted(&self, peer_count: usize) -> bool {
        self.next >= peer_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64, nanos: i64) -> Timestamp {
        Timestamp { secs, nanos }
    }

    #[test]
    fn test_ping_path() {
        let mut state = PeerState::new(3);
        assert!(!state.wants_write());
        state.arm_ping();
        assert!(state.wants_write());
        state.on_ping_sent(Some(ts(100, 0))).unwrap();
        assert!(!state.wants_ping);
        assert!(!state.wants_write());
        assert_eq!(state.ping_sent_at, Some(ts(100, 0)));
    }

    #[test]
    fn test_ping_timestamp_written_once() {
        let mut state = PeerState::new(1);
        state.arm_ping();
        state.on_ping_sent(Some(ts(100, 0))).unwrap();
        state.arm_ping();
        let err = state.on_ping_sent(Some(ts(101, 0))).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TimestampAlreadySet {
                peer: 1,
                stamp: Stamp::PingSent
            }
        ));
        assert_eq!(state.ping_sent_at, Some(ts(100, 0)));
    }

    #[test]
    fn test_abandoned_ping_records_nothing() {
        let mut state = PeerState::new(0);
        state.arm_ping();
        state.on_ping_sent(None).unwrap();
        assert!(!state.wants_ping);
        assert_eq!(state.ping_sent_at, None);
    }

    #[test]
    fn test_pong_path() {
        let mut state = PeerState::new(2);
        state.on_ping_received().unwrap();
        assert!(state.wants_pong);
        state.on_pong_sent();
        assert!(!state.wants_write());

        assert!(matches!(
            state.on_ping_received(),
            Err(EngineError::DuplicatePing { peer: 2 })
        ));
    }

    #[test]
    fn test_cross_traffic() {
        let mut state = PeerState::new(0);
        state.arm_ping();
        state.on_ping_received().unwrap();
        assert!(state.wants_ping && state.wants_pong);
        state.on_ping_sent(Some(ts(1, 0))).unwrap();
        // only the serviced intent is cleared
        assert!(state.wants_pong);
        assert!(state.wants_write());
    }

    #[test]
    fn test_pong_timestamp_written_once() {
        let mut state = PeerState::new(4);
        state.on_pong_received(ts(5, 0)).unwrap();
        assert!(matches!(
            state.on_pong_received(ts(6, 0)),
            Err(EngineError::TimestampAlreadySet {
                peer: 4,
                stamp: Stamp::PongReceived
            })
        ));
        assert_eq!(state.pong_received_at, Some(ts(5, 0)));
    }

    #[test]
    fn test_round_trip() {
        let mut state = PeerState::new(0);
        state.on_ping_sent(Some(ts(10, 999_000_000))).unwrap();
        state.on_pong_received(ts(11, 1_000_000)).unwrap();
        assert!((state.round_trip() - 0.002).abs() < 1e-9);
    }

    #[test]
    fn test_stagger_cursor() {
        let mut cursor = StaggerCursor::default();
        let activated: Vec<Option<usize>> = (0..6).map(|_| cursor.advance(5)).collect();
        assert_eq!(activated, vec![Some(0), Some(1), Some(2), Some(3), Some(4), None]);
        assert!(cursor.is_exhausted(5));
        assert_eq!(cursor.advance(5), None);
    }
}
