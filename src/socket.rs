use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::{AsRawFd, RawFd};

use crate::sockaddr::SockAddr;

/// Non-blocking UDP socket dedicated to one peer.
pub struct PeerSocket {
    socket: RawFd,
}

fn cvt(result: libc::c_int) -> io::Result<libc::c_int> {
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result)
    }
}

fn retry_interrupted<F: FnMut() -> libc::ssize_t>(mut f: F) -> io::Result<usize> {
    loop {
        let result = f();
        if result >= 0 {
            return Ok(result as usize);
        }
        let last_error = io::Error::last_os_error();
        if last_error.kind() != io::ErrorKind::Interrupted {
            return Err(last_error);
        }
    }
}

impl PeerSocket {
    /// Bind a socket to `port` on the unspecified address of `family_of`'s family.
    pub fn bind_any(family_of: IpAddr, port: u16) -> io::Result<PeerSocket> {
        let unspecified = match family_of {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Self::bind(SocketAddr::new(unspecified, port))
    }

    pub fn bind(local: SocketAddr) -> io::Result<PeerSocket> {
        let family = match local {
            SocketAddr::V4(_) => libc::AF_INET,
            SocketAddr::V6(_) => libc::AF_INET6,
        };
        let fd = cvt(unsafe {
            libc::socket(
                family,
                libc::SOCK_DGRAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                0,
            )
        })?;
        // closes the descriptor if anything below fails
        let sock = PeerSocket { socket: fd };

        let enable: libc::c_int = 1;
        sock.setsockopt(libc::SOL_SOCKET, libc::SO_REUSEADDR, &enable)?;

        let addr = SockAddr::from(local);
        cvt(unsafe { libc::bind(sock.socket, addr.as_ref(), addr.socklen()) })?;
        Ok(sock)
    }

    fn setsockopt<T: Sized>(&self, level: libc::c_int, name: libc::c_int, optval: &T) -> io::Result<()> {
        cvt(unsafe {
            libc::setsockopt(
                self.socket,
                level,
                name,
                optval as *const T as *const libc::c_void,
                std::mem::size_of::<T>() as libc::socklen_t,
            )
        })?;
        Ok(())
    }

    pub fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<usize> {
        let addr = SockAddr::from(target);
        retry_interrupted(|| unsafe {
            libc::sendto(
                self.socket,
                data.as_ptr() as *const libc::c_void,
                data.len(),
                0,
                addr.as_ref(),
                addr.socklen(),
            )
        })
    }

    /// Read one datagram. A datagram larger than `buf` is truncated to it.
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        retry_interrupted(|| unsafe {
            libc::recv(self.socket, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
        })
    }

    #[cfg(test)]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        let mut addr = SockAddr::zeroed();
        let mut len = SockAddr::capacity();
        cvt(unsafe { libc::getsockname(self.socket, addr.as_mut(), &mut len) })?;
        SocketAddr::try_from(addr)
    }
}

impl AsRawFd for PeerSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket
    }
}

impl Drop for PeerSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.socket);
        }
    }
}
