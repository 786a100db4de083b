/// Role of a descriptor registered with the poller.
///
/// The poll token of each registration is derived from its role, so a
/// readiness notification maps back to exactly one handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Report,
    Start,
    Stagger,
    Timeout,
    Peer(usize),
}

const PEER_TOKEN_BASE: u64 = 4;

impl Source {
    pub fn token(self) -> u64 {
        match self {
            Source::Report => 0,
            Source::Start => 1,
            Source::Stagger => 2,
            Source::Timeout => 3,
            Source::Peer(index) => PEER_TOKEN_BASE + index as u64,
        }
    }

    pub fn from_token(token: u64) -> Source {
        match token {
            0 => Source::Report,
            1 => Source::Start,
            2 => Source::Stagger,
            3 => Source::Timeout,
            _ => Source::Peer((token - PEER_TOKEN_BASE) as usize),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Report => write!(f, "report timer"),
            Source::Start => write!(f, "start timer"),
            Source::Stagger => write!(f, "stagger timer"),
            Source::Timeout => write!(f, "timeout timer"),
            Source::Peer(index) => write!(f, "peer {} socket", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_distinct() {
        let sources = [
            Source::Report,
            Source::Start,
            Source::Stagger,
            Source::Timeout,
            Source::Peer(0),
            Source::Peer(1),
            Source::Peer(511),
        ];
        for source in sources {
            assert_eq!(Source::from_token(source.token()), source);
        }
        let mut tokens: Vec<u64> = sources.iter().map(|s| s.token()).collect();
        tokens.dedup();
        assert_eq!(tokens.len(), sources.len());
    }
}
