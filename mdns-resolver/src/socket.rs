//! Socket utilities for mDNS.
//!
//! This module provides [`MulticastSocket`], a builder for UDP sockets that
//! are bound, joined to an mDNS group and ready for blocking use.
//!
//! # Example
//!
//! ```rust,ignore
//! use mdns_resolver::MulticastSocket;
//! use std::time::Duration;
//!
//! let std_socket = MulticastSocket::new()
//!     .with_read_timeout(Duration::from_secs(1))
//!     .into_std()?;
//! ```

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use crate::config::{DEFAULT_MULTICAST_TTL, ResolverConfig};
use crate::proto::{MDNS_MULTICAST_IPV4, MDNS_PORT};
use socket2::{Domain, Protocol, Socket, Type};

/// A builder for creating multicast UDP sockets suitable for mDNS.
///
/// The resulting socket will be:
///
/// - Bound to the unspecified address of the group's family on the mDNS
///   port, so unicast (QU) replies arrive as well as multicast ones
/// - Configured with `SO_REUSEADDR` enabled
/// - Configured with `SO_REUSEPORT` enabled (on supported platforms)
/// - In blocking mode, with the configured read timeout
/// - Configured with the multicast TTL (hop limit for IPv6)
/// - Joined to the multicast group
///
/// # Examples
///
/// With a specific network interface:
///
/// ```rust,ignore
/// use mdns_resolver::MulticastSocket;
/// use std::net::Ipv4Addr;
///
/// let std_socket = MulticastSocket::new()
///     .with_interface(Ipv4Addr::new(192, 168, 1, 100))
///     .into_std()?;
/// ```
#[derive(Debug, Clone)]
pub struct MulticastSocket {
    group: IpAddr,
    port: u16,
    bind_ip: Option<IpAddr>,
    interface: Option<Ipv4Addr>,
    multicast_ttl: u32,
    read_timeout: Option<Duration>,
}

impl Default for MulticastSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl MulticastSocket {
    /// Creates a builder for the IPv4 mDNS group `224.0.0.251:5353`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mdns_resolver::MulticastSocket;
    ///
    /// let builder = MulticastSocket::new();
    /// ```
    pub fn new() -> Self {
        Self {
            group: IpAddr::V4(MDNS_MULTICAST_IPV4),
            port: MDNS_PORT,
            bind_ip: None,
            interface: None,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            read_timeout: None,
        }
    }

    /// Builder matching a [`ResolverConfig`]: group and port from the
    /// destination, interface, TTL and the receive timeout.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut builder = Self::new()
            .with_group(config.dest_addr)
            .with_multicast_ttl(config.multicast_ttl)
            .with_read_timeout(config.receive_timeout);
        builder.interface = config.interface;
        builder
    }

    /// Sets the multicast group and port to join.
    pub fn with_group(mut self, group: SocketAddr) -> Self {
        self.group = group.ip();
        self.port = group.port();
        self
    }

    /// Overrides the local bind address, which defaults to the unspecified
    /// address of the group's family.
    pub fn with_bind_ip(mut self, bind_ip: IpAddr) -> Self {
        self.bind_ip = Some(bind_ip);
        self
    }

    /// Sets a specific network interface for multicast operations.
    ///
    /// If not set, the socket joins the multicast group on all interfaces
    /// (`INADDR_ANY`). Only applies to IPv4 groups.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mdns_resolver::MulticastSocket;
    /// use std::net::Ipv4Addr;
    ///
    /// let builder = MulticastSocket::new()
    ///     .with_interface(Ipv4Addr::new(192, 168, 1, 100));
    /// ```
    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn with_multicast_ttl(mut self, multicast_ttl: u32) -> Self {
        self.multicast_ttl = multicast_ttl;
        self
    }

    /// Read timeout of the socket. A zero duration means no timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = if read_timeout.is_zero() {
            None
        } else {
            Some(read_timeout)
        };
        self
    }

    pub fn group(&self) -> SocketAddr {
        SocketAddr::new(self.group, self.port)
    }

    pub fn interface(&self) -> Option<Ipv4Addr> {
        self.interface
    }

    fn bind_addr(&self) -> SocketAddr {
        let ip = self.bind_ip.unwrap_or(match self.group {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        });
        SocketAddr::new(ip, self.port)
    }

    /// Converts this builder into a configured `std::net::UdpSocket`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Socket creation fails
    /// - Setting socket options fails
    /// - Binding to the address fails
    /// - Joining the multicast group fails
    ///
    /// # Platform Notes
    ///
    /// - On Unix-like systems (except Solaris/illumos), `SO_REUSEPORT` is enabled
    ///   so several lookups and other responders can share port 5353.
    pub fn into_std(self) -> io::Result<UdpSocket> {
        let domain = match self.group {
            IpAddr::V4(_) => Domain::IPV4,
            IpAddr::V6(_) => Domain::IPV6,
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

        // Enable address reuse for multiple processes
        socket.set_reuse_address(true)?;

        // Enable port reuse on supported platforms
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket.set_reuse_port(true)?;

        socket.set_nonblocking(false)?;
        socket.set_read_timeout(self.read_timeout)?;

        socket.bind(&self.bind_addr().into())?;

        match self.group {
            IpAddr::V4(group) => {
                let iface = self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED);
                socket.set_multicast_ttl_v4(self.multicast_ttl)?;
                if !iface.is_unspecified() {
                    socket.set_multicast_if_v4(&iface)?;
                }
                socket.join_multicast_v4(&group, &iface)?;
            }
            IpAddr::V6(group) => {
                socket.set_multicast_hops_v6(self.multicast_ttl)?;
                socket.join_multicast_v6(&group, 0)?;
            }
        }

        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::MDNS_MULTICAST_IPV6;

    #[test]
    fn test_multicast_constants() {
        assert_eq!(MDNS_MULTICAST_IPV4, Ipv4Addr::new(224, 0, 0, 251));
        assert_eq!(MDNS_PORT, 5353);
    }

    #[test]
    fn test_multicast_socket_defaults() {
        let builder = MulticastSocket::new();
        assert_eq!(builder.group(), "224.0.0.251:5353".parse().unwrap());
        assert!(builder.interface().is_none());
        assert_eq!(builder.multicast_ttl, 255);
        assert!(builder.read_timeout.is_none());
        assert_eq!(builder.bind_addr(), "0.0.0.0:5353".parse().unwrap());
    }

    #[test]
    fn test_multicast_socket_with_interface() {
        let interface = Ipv4Addr::new(192, 168, 1, 100);
        let builder = MulticastSocket::new()
            .with_interface(interface)
            .with_multicast_ttl(1)
            .with_read_timeout(Duration::from_millis(200));
        assert_eq!(builder.interface(), Some(interface));
        assert_eq!(builder.multicast_ttl, 1);
        assert_eq!(builder.read_timeout, Some(Duration::from_millis(200)));

        let builder = builder.with_read_timeout(Duration::ZERO);
        assert!(builder.read_timeout.is_none());
    }

    #[test]
    fn test_multicast_socket_ipv6_group() {
        let builder =
            MulticastSocket::new().with_group(SocketAddr::new(IpAddr::V6(MDNS_MULTICAST_IPV6), 5353));
        assert_eq!(builder.bind_addr(), "[::]:5353".parse().unwrap());

        let builder = builder.with_bind_ip(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(builder.bind_addr(), "[::1]:5353".parse().unwrap());
    }

    #[test]
    fn test_multicast_socket_from_config() {
        let config = ResolverConfig::default()
            .with_interface(Ipv4Addr::new(10, 0, 0, 5))
            .with_multicast_ttl(4)
            .with_receive_timeout(Duration::from_secs(2));
        let builder = MulticastSocket::from_config(&config);
        assert_eq!(builder.group(), config.dest_addr);
        assert_eq!(builder.interface(), Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(builder.multicast_ttl, 4);
        assert_eq!(builder.read_timeout, Some(Duration::from_secs(2)));
    }

    // Binding real sockets would need network access and may collide with a
    // running responder, so socket creation stays out of unit tests.
}
