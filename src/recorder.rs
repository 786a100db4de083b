/// Pong counters and the periodic progress block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorder {
    peer_count: usize,
    pongs_sent: usize,
    pongs_recvd: usize,
}

impl Recorder {
    pub fn new(peer_count: usize) -> Recorder {
        Recorder {
            peer_count,
            pongs_sent: 0,
            pongs_recvd: 0,
        }
    }

    pub fn record_pong_sent(&mut self) {
        debug_assert!(self.pongs_sent < self.peer_count);
        self.pongs_sent += 1;
    }

    pub fn record_pong_received(&mut self) {
        debug_assert!(self.pongs_recvd < self.peer_count);
        self.pongs_recvd += 1;
    }

    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    pub fn pongs_sent(&self) -> usize {
        self.pongs_sent
    }

    pub fn pongs_recvd(&self) -> usize {
        self.pongs_recvd
    }

    /// Every peer got its pong and answered ours.
    pub fn is_complete(&self) -> bool {
        self.pongs_sent == self.peer_count && self.pongs_recvd == self.peer_count
    }

    pub fn status(&self) -> String {
        format!(
            "=====================\n{}/{} pongs sent\n{}/{} pongs recvd\n",
            self.pongs_sent, self.peer_count, self.pongs_recvd, self.peer_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion() {
        let mut recorder = Recorder::new(2);
        assert!(!recorder.is_complete());
        recorder.record_pong_sent();
        recorder.record_pong_sent();
        assert!(!recorder.is_complete());
        recorder.record_pong_received();
        recorder.record_pong_received();
        assert!(recorder.is_complete());
    }

    #[test]
    fn test_status() {
        let mut recorder = Recorder::new(3);
        recorder.record_pong_sent();
        assert_eq!(
            recorder.status(),
            "=====================\n1/3 pongs sent\n0/3 pongs recvd\n"
        );
    }
}
