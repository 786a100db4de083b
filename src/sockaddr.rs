use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

/// A C socket address large enough for either IPv4 or IPv6.
#[derive(Clone, Copy)]
pub union SockAddr {
    sa: libc::sockaddr,
    sin: libc::sockaddr_in,
    sin6: libc::sockaddr_in6,
}

impl SockAddr {
    /// An all-zero address, to be filled in by the kernel (`getsockname`, `recvfrom`).
    pub(crate) fn zeroed() -> Self {
        unsafe { std::mem::zeroed() }
    }

    /// Length in bytes of the address for its family, as passed to `bind`/`sendto`.
    pub fn socklen(&self) -> libc::socklen_t {
        match self.family() {
            libc::AF_INET6 => std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
            _ => std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        }
    }

    /// Size of the union itself; the capacity handed to calls that write an address.
    #[cfg(test)]
    pub(crate) fn capacity() -> libc::socklen_t {
        std::mem::size_of::<SockAddr>() as libc::socklen_t
    }

    pub fn family(&self) -> libc::c_int {
        unsafe { self.sa.sa_family as libc::c_int }
    }
}

impl AsRef<libc::sockaddr> for SockAddr {
    fn as_ref(&self) -> &libc::sockaddr {
        unsafe { &self.sa }
    }
}

#[cfg(test)]
impl AsMut<libc::sockaddr> for SockAddr {
    fn as_mut(&mut self) -> &mut libc::sockaddr {
        unsafe { &mut self.sa }
    }
}

impl TryFrom<SockAddr> for SocketAddr {
    type Error = std::io::Error;

    fn try_from(addr: SockAddr) -> Result<SocketAddr, Self::Error> {
        match addr.family() {
            libc::AF_INET => {
                let sockaddr_in: &libc::sockaddr_in = unsafe { &addr.sin };
                let ip = Ipv4Addr::from(u32::from_be(sockaddr_in.sin_addr.s_addr));
                let port = u16::from_be(sockaddr_in.sin_port);
                Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
            }
            libc::AF_INET6 => {
                let sockaddr_in6: &libc::sockaddr_in6 = unsafe { &addr.sin6 };
                let ip = Ipv6Addr::from(sockaddr_in6.sin6_addr.s6_addr);
                let port = u16::from_be(sockaddr_in6.sin6_port);
                Ok(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    port,
                    sockaddr_in6.sin6_flowinfo,
                    sockaddr_in6.sin6_scope_id,
                )))
            }
            family => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unhandled address family {}", family),
            )),
        }
    }
}

impl From<SocketAddr> for SockAddr {
    fn from(addr: SocketAddr) -> Self {
        let mut sockaddr = SockAddr::zeroed();
        match addr {
            SocketAddr::V4(v4addr) => {
                let sin = unsafe { &mut sockaddr.sin };
                sin.sin_family = libc::AF_INET as libc::sa_family_t;
                sin.sin_port = v4addr.port().to_be();
                sin.sin_addr.s_addr = u32::from(*v4addr.ip()).to_be();
            }
            SocketAddr::V6(v6addr) => {
                let sin6 = unsafe { &mut sockaddr.sin6 };
                sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                sin6.sin6_port = v6addr.port().to_be();
                sin6.sin6_addr.s6_addr = v6addr.ip().octets();
                sin6.sin6_flowinfo = v6addr.flowinfo();
                sin6.sin6_scope_id = v6addr.scope_id();
            }
        }
        sockaddr
    }
}
