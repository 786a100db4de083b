use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Readiness directions a descriptor is registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    writable: bool,
}

impl Interest {
    pub const READABLE: Interest = Interest { writable: false };

    pub fn with_writable(writable: bool) -> Interest {
        Interest { writable }
    }

    fn bits(self) -> u32 {
        if self.writable {
            (libc::EPOLLIN | libc::EPOLLOUT) as u32
        } else {
            libc::EPOLLIN as u32
        }
    }
}

/// One readiness notification returned by [`Poller::wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Readiness {
    pub token: u64,
    pub events: u32,
}

impl Readiness {
    pub fn is_readable(&self) -> bool {
        self.events & libc::EPOLLIN as u32 != 0
    }

    pub fn is_writable(&self) -> bool {
        self.events & libc::EPOLLOUT as u32 != 0
    }

    pub fn is_error(&self) -> bool {
        self.events & libc::EPOLLERR as u32 != 0
    }

    /// Anything other than plain in/out readiness (hang-up, priority data, ...).
    pub fn is_unexpected(&self) -> bool {
        self.events & !((libc::EPOLLIN | libc::EPOLLOUT) as u32) != 0
    }
}

/// Buffer receiving the results of one wait.
pub struct Events {
    events: Vec<libc::epoll_event>,
    len: usize,
}

impl Events {
    pub fn with_capacity(capacity: usize) -> Events {
        Events {
            events: vec![libc::epoll_event { events: 0, u64: 0 }; capacity.max(1)],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<Readiness> {
        if index >= self.len {
            return None;
        }
        // epoll_event is packed on some targets, copy the fields out
        let event = self.events[index];
        let events = event.events;
        let token = event.u64;
        Some(Readiness { token, events })
    }
}

/// Level-triggered epoll instance.
pub struct Poller {
    epoll_fd: RawFd,
}

impl Poller {
    pub fn new() -> io::Result<Poller> {
        let epoll_fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epoll_fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Poller { epoll_fd })
    }

    fn ctl(&self, op: libc::c_int, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: interest.bits(),
            u64: token,
        };
        if unsafe { libc::epoll_ctl(self.epoll_fd, op, fd, &mut ev) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn register(&self, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_ADD, fd, token, interest)
    }

    pub fn reregister(&self, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_MOD, fd, token, interest)
    }

    /// Block until at least one registered descriptor is ready, or `timeout` elapses.
    /// `None` waits indefinitely. Interrupted waits are restarted.
    pub fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_millis = match timeout {
            Some(timeout) => timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };
        loop {
            let result = unsafe {
                libc::epoll_wait(
                    self.epoll_fd,
                    events.events.as_mut_ptr(),
                    events.events.len() as libc::c_int,
                    timeout_millis,
                )
            };
            if result >= 0 {
                events.len = result as usize;
                return Ok(());
            }
            let last_error = io::Error::last_os_error();
            if last_error.kind() != io::ErrorKind::Interrupted {
                events.len = 0;
                return Err(last_error);
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epoll_fd);
        }
    }
}
