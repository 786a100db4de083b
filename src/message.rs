//! The two fixed-size datagrams exchanged between peers.
//!
//! Both are 4 ASCII bytes, `PING` and `PONG`; byte 1 tells them apart.

use int_enum::IntEnum;
use thiserror::Error;

pub const MESSAGE_LEN: usize = 4;
pub const DISCRIMINATOR_OFFSET: usize = 1;

#[repr(u8)]
#[derive(IntEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// `b'I'`
    Ping = 0x49,
    /// `b'O'`
    Pong = 0x4f,
}

impl MessageKind {
    pub fn as_bytes(self) -> &'static [u8; MESSAGE_LEN] {
        match self {
            MessageKind::Ping => b"PING",
            MessageKind::Pong => b"PONG",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Ping => write!(f, "PING"),
            MessageKind::Pong => write!(f, "PONG"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("expected a 4-byte message, got {len} bytes ({dump})")]
    BadLength { len: usize, dump: String },
    #[error("unknown message discriminator {byte:#04x} ({dump})")]
    UnknownKind { byte: u8, dump: String },
}

/// Decode a received datagram. `datagram` must not be empty.
pub fn parse(datagram: &[u8]) -> Result<MessageKind, ProtocolError> {
    if datagram.len() != MESSAGE_LEN {
        return Err(ProtocolError::BadLength {
            len: datagram.len(),
            dump: hex::encode(&datagram[..datagram.len().min(32)]),
        });
    }
    let byte = datagram[DISCRIMINATOR_OFFSET];
    MessageKind::try_from(byte).map_err(|_| ProtocolError::UnknownKind {
        byte,
        dump: hex::encode(datagram),
    })
}
