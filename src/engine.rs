//! The dispatch loop.
//!
//! Every socket and timer is registered with one epoll instance and the loop
//! blocks on it without a timeout; liveness comes from the timers alone. The
//! run ends when every peer has both answered our PING and been answered, or
//! on the first fatal condition, the timeout timer included.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::os::fd::AsRawFd;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{io_error, EngineError};
use crate::message::{self, MessageKind};
use crate::peer::{Peer, PeerState, StaggerCursor};
use crate::poll::{Events, Interest, Poller, Readiness};
use crate::recorder::Recorder;
use crate::socket::PeerSocket;
use crate::source::Source;
use crate::summary::Report;
use crate::timer::TimerFd;
use crate::timestamp::Timestamp;

const RECV_BUFFER_LEN: usize = 1024;

struct Timers {
    report: TimerFd,
    start: TimerFd,
    timeout: TimerFd,
    stagger: Option<TimerFd>,
}

/// How a failed PING send affects the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SendFailure {
    /// Nothing was sent; keep the intent and try on the next writable event.
    Retry,
    /// Give up on this one ping, the rest of the run continues.
    Abandon,
    Fatal,
}

fn classify_ping_error(error: &io::Error) -> SendFailure {
    match error.kind() {
        io::ErrorKind::WouldBlock => SendFailure::Retry,
        io::ErrorKind::PermissionDenied => SendFailure::Abandon,
        _ => SendFailure::Fatal,
    }
}

pub struct Engine {
    config: EngineConfig,
    peers: Vec<Peer>,
    poller: Poller,
    timers: Timers,
    recorder: Recorder,
    stagger: StaggerCursor,
    start_instant: Option<Timestamp>,
    events: Events,
}

impl Engine {
    /// Create every socket and timer and register them, without sending anything.
    pub fn new(config: EngineConfig, addresses: &[IpAddr]) -> Result<Engine, EngineError> {
        config.validate(addresses.len())?;
        let peer_count = addresses.len();

        let poller = Poller::new().map_err(io_error("epoll_create1"))?;

        let report = TimerFd::periodic(config.report_interval).map_err(io_error("timerfd_create"))?;
        let start = TimerFd::at(config.start_epoch).map_err(io_error("timerfd_create"))?;
        let timeout =
            TimerFd::at(config.timeout_deadline(peer_count)?).map_err(io_error("timerfd_create"))?;
        for (timer, source) in [
            (&report, Source::Report),
            (&start, Source::Start),
            (&timeout, Source::Timeout),
        ] {
            poller
                .register(timer.as_raw_fd(), source.token(), Interest::READABLE)
                .map_err(io_error("epoll_ctl"))?;
        }

        let interest = Interest::with_writable(config.write_eager_registration);
        let mut peers = Vec::with_capacity(peer_count);
        for (id, address) in addresses.iter().enumerate() {
            let channel =
                PeerSocket::bind_any(*address, config.listen_port(id)).map_err(io_error("bind"))?;
            poller
                .register(channel.as_raw_fd(), Source::Peer(id).token(), interest)
                .map_err(io_error("epoll_ctl"))?;
            peers.push(Peer {
                remote: SocketAddr::new(*address, config.send_port()),
                channel,
                state: PeerState::new(id),
            });
        }

        info!(
            self_id = config.self_id,
            peers = peer_count,
            base_port = config.base_port,
            stagger = ?config.stagger_interval(),
            busy_wait = config.write_eager_registration,
            "engine ready"
        );

        Ok(Engine {
            config,
            peers,
            poller,
            timers: Timers {
                report,
                start,
                timeout,
                stagger: None,
            },
            recorder: Recorder::new(peer_count),
            stagger: StaggerCursor::default(),
            start_instant: None,
            events: Events::with_capacity(peer_count + 4),
        })
    }

    /// Dispatch readiness until every pong is exchanged or a fatal condition occurs.
    pub fn run(&mut self) -> Result<(), EngineError> {
        eprintln!("start epoll at {}", Timestamp::now().map_err(io_error("clock_gettime"))?);
        while !self.recorder.is_complete() {
            self.poll_once()?;
        }
        info!(
            pongs_sent = self.recorder.pongs_sent(),
            pongs_recvd = self.recorder.pongs_recvd(),
            "all pongs exchanged"
        );
        Ok(())
    }

    fn poll_once(&mut self) -> Result<(), EngineError> {
        self.poller
            .wait(&mut self.events, None)
            .map_err(io_error("epoll_wait"))?;
        for index in 0..self.events.len() {
            if let Some(readiness) = self.events.get(index) {
                self.dispatch(readiness)?;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, readiness: Readiness) -> Result<(), EngineError> {
        let origin = Source::from_token(readiness.token);
        if readiness.is_error() {
            return Err(EngineError::Readiness { origin });
        }
        if readiness.is_unexpected() {
            return Err(EngineError::UnexpectedReadiness {
                origin,
                events: readiness.events,
            });
        }

        match origin {
            Source::Report => {
                self.timers.report.read().map_err(io_error("read report timer"))?;
                eprint!("{}", self.recorder.status());
                Ok(())
            }
            Source::Start => self.on_start(),
            Source::Stagger => self.on_stagger_tick(),
            Source::Timeout => {
                self.timers.timeout.read().map_err(io_error("read timeout timer"))?;
                Err(EngineError::Timeout)
            }
            Source::Peer(index) if index < self.peers.len() => {
                if readiness.is_readable() {
                    self.on_readable(index)?;
                }
                if readiness.is_writable() && self.peers[index].state.wants_write() {
                    self.on_writable(index)?;
                }
                Ok(())
            }
            Source::Peer(_) => Err(EngineError::UnknownSource {
                token: readiness.token,
            }),
        }
    }

    fn on_start(&mut self) -> Result<(), EngineError> {
        if self.timers.start.read().map_err(io_error("read start timer"))? == 0 {
            return Ok(());
        }
        let now = Timestamp::now().map_err(io_error("clock_gettime"))?;
        self.start_instant = Some(now);
        eprintln!("start pinging at {}", now);

        match self.config.stagger_interval() {
            Some(interval) => {
                // first peer right away, then one per interval
                let timer = TimerFd::periodic_from(std::time::Duration::ZERO, interval)
                    .map_err(io_error("timerfd_create"))?;
                self.poller
                    .register(timer.as_raw_fd(), Source::Stagger.token(), Interest::READABLE)
                    .map_err(io_error("epoll_ctl"))?;
                self.timers.stagger = Some(timer);
                debug!(?interval, "staggering ping activation");
            }
            None => {
                for index in 0..self.peers.len() {
                    self.peers[index].state.arm_ping();
                    self.update_interest(index)?;
                }
            }
        }
        Ok(())
    }

    fn on_stagger_tick(&mut self) -> Result<(), EngineError> {
        let ticks = match &self.timers.stagger {
            Some(timer) => timer.read().map_err(io_error("read stagger timer"))?,
            None => 0,
        };
        for _ in 0..ticks {
            match self.stagger.advance(self.peers.len()) {
                Some(index) => {
                    debug!(peer = index, "activating peer");
                    self.peers[index].state.arm_ping();
                    self.update_interest(index)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn on_readable(&mut self, index: usize) -> Result<(), EngineError> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        let len = match self.peers[index].channel.recv(&mut buf) {
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(io_error("recv")(e)),
        };
        if len == 0 {
            debug!(peer = index, "ignoring empty datagram");
            return Ok(());
        }
        let kind = message::parse(&buf[..len]).map_err(|error| EngineError::Protocol { peer: index, error })?;
        debug!(peer = index, %kind, "received");

        match kind {
            MessageKind::Ping => {
                self.peers[index].state.on_ping_received()?;
                self.update_interest(index)
            }
            MessageKind::Pong => {
                let now = Timestamp::now().map_err(io_error("clock_gettime"))?;
                self.peers[index].state.on_pong_received(now)?;
                self.recorder.record_pong_received();
                Ok(())
            }
        }
    }

    fn on_writable(&mut self, index: usize) -> Result<(), EngineError> {
        if self.peers[index].state.wants_ping {
            self.send_ping(index)?;
        }
        if self.peers[index].state.wants_pong {
            self.send_pong(index)?;
        }
        Ok(())
    }

    fn send(&self, index: usize, kind: MessageKind) -> io::Result<usize> {
        let peer = &self.peers[index];
        peer.channel.send_to(kind.as_bytes(), peer.remote)
    }

    fn send_ping(&mut self, index: usize) -> Result<(), EngineError> {
        match self.send(index, MessageKind::Ping) {
            Ok(_) => {
                let now = Timestamp::now().map_err(io_error("clock_gettime"))?;
                debug!(peer = index, remote = %self.peers[index].remote, "sent PING at {}", now);
                self.finish_ping(index, Some(now))
            }
            Err(e) => match classify_ping_error(&e) {
                SendFailure::Retry => Ok(()),
                SendFailure::Abandon => {
                    warn!(peer = index, remote = %self.peers[index].remote, "abandoning ping: {}", e);
                    self.finish_ping(index, None)
                }
                SendFailure::Fatal => Err(io_error("sendto")(e)),
            },
        }
    }

    /// Leave the ping path, whether or not the ping went out.
    fn finish_ping(&mut self, index: usize, sent_at: Option<Timestamp>) -> Result<(), EngineError> {
        self.peers[index].state.on_ping_sent(sent_at)?;
        self.update_interest(index)
    }

    fn send_pong(&mut self, index: usize) -> Result<(), EngineError> {
        match self.send(index, MessageKind::Pong) {
            Ok(_) => {
                debug!(peer = index, "sent PONG");
                self.peers[index].state.on_pong_sent();
                self.recorder.record_pong_sent();
                self.update_interest(index)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(io_error("sendto")(e)),
        }
    }

    /// Register for writability only while the peer has something to send.
    fn update_interest(&self, index: usize) -> Result<(), EngineError> {
        let peer = &self.peers[index];
        let writable = self.config.write_eager_registration || peer.state.wants_write();
        self.poller
            .reregister(
                peer.channel.as_raw_fd(),
                Source::Peer(index).token(),
                Interest::with_writable(writable),
            )
            .map_err(io_error("epoll_ctl"))
    }

    pub fn start_instant(&self) -> Option<Timestamp> {
        self.start_instant
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn peer_states(&self) -> impl Iterator<Item = &PeerState> {
        self.peers.iter().map(|peer| &peer.state)
    }

    pub fn report(&self) -> Report {
        Report {
            start: self.start_instant.unwrap_or_default(),
            peer_count: self.recorder.peer_count(),
            pongs_sent: self.recorder.pongs_sent(),
            pongs_recvd: self.recorder.pongs_recvd(),
            round_trips: self.peers.iter().map(|peer| peer.state.round_trip()).collect(),
        }
    }
}
