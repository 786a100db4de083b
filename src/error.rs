use std::io;

use thiserror::Error;

use crate::message::ProtocolError;
use crate::source::Source;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("at least one peer is required")]
    NoPeers,
    #[error("missing address for peer {index}")]
    MissingAddress { index: usize },
    #[error("invalid address for peer {index}: {text:?}")]
    InvalidAddress { index: usize, text: String },
    #[error("port {base_port} + {offset} does not fit in 16 bits")]
    PortOutOfRange { base_port: u16, offset: usize },
    #[error("report interval must be non-zero")]
    ZeroReportInterval,
    #[error("start time {secs} is out of range")]
    StartOutOfRange { secs: u64 },
    #[error("timeout deadline for {peer_count} peers is out of range")]
    DeadlineOutOfRange { peer_count: usize },
    #[error("failed to read peer addresses: {0}")]
    Read(#[from] io::Error),
}

/// Which of the write-once timestamps a violation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stamp {
    PingSent,
    PongReceived,
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stamp::PingSent => write!(f, "ping"),
            Stamp::PongReceived => write!(f, "pong"),
        }
    }
}

/// Every condition that ends a run early.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{op} failed: {error}")]
    Io {
        op: &'static str,
        #[source]
        error: io::Error,
    },
    #[error("protocol error from peer {peer}: {error}")]
    Protocol {
        peer: usize,
        #[source]
        error: ProtocolError,
    },
    #[error("{stamp} timestamp already set for peer {peer}")]
    TimestampAlreadySet { peer: usize, stamp: Stamp },
    #[error("peer {peer} sent more than one PING")]
    DuplicatePing { peer: usize },
    #[error("readiness error on {origin}")]
    Readiness { origin: Source },
    #[error("unexpected readiness {events:#x} on {origin}")]
    UnexpectedReadiness { origin: Source, events: u32 },
    #[error("readiness for unknown token {token}")]
    UnknownSource { token: u64 },
    #[error("timeout: not all pongs exchanged before the deadline")]
    Timeout,
}

/// Adapter for `map_err` that names the failing call.
pub fn io_error(op: &'static str) -> impl FnOnce(io::Error) -> EngineError {
    move |error| EngineError::Io { op, error }
}
