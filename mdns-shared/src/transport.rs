use bytes::BytesMut;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;

/// Address family of a multicast group or datagram peer
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressFamily {
    /// IPv4
    #[default]
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Classify an IP address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Prefix prepended to log lines so interleaved IPv4/IPv6 exchanges can be told apart
    pub fn log_prefix(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "ipv4: ",
            AddressFamily::Ipv6 => "ipv6: ",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            AddressFamily::Ipv4 => "IPv4",
            AddressFamily::Ipv6 => "IPv6",
        };
        write!(f, "{s}")
    }
}

/// Transport Context with local address and peer address of a UDP datagram
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportContext {
    /// Local socket address, either IPv4 or IPv6
    pub local_addr: SocketAddr,
    /// Peer socket address, either IPv4 or IPv6
    pub peer_addr: SocketAddr,
}

impl Default for TransportContext {
    fn default() -> Self {
        let unspecified = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        Self {
            local_addr: unspecified,
            peer_addr: unspecified,
        }
    }
}

impl TransportContext {
    /// Address family of the peer
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.peer_addr.ip())
    }
}

/// A generic transmit with [TransportContext]
#[derive(Debug, Clone)]
pub struct TransportMessage<T> {
    /// Received/Sent time
    pub now: Instant,
    /// A transport context with [local_addr](TransportContext::local_addr) and [peer_addr](TransportContext::peer_addr)
    pub transport: TransportContext,
    /// Message body with generic type
    pub message: T,
}

/// BytesMut type transmit with [TransportContext]
pub type TaggedBytesMut = TransportMessage<BytesMut>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_address_family() {
        let v4 = IpAddr::V4(Ipv4Addr::new(224, 0, 0, 251));
        let v6 = IpAddr::V6(Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb));

        assert_eq!(AddressFamily::of(&v4), AddressFamily::Ipv4);
        assert_eq!(AddressFamily::of(&v6), AddressFamily::Ipv6);
        assert_eq!(AddressFamily::Ipv4.log_prefix(), "ipv4: ");
        assert_eq!(AddressFamily::Ipv6.log_prefix(), "ipv6: ");
    }

    #[test]
    fn test_transport_context_default() {
        let ctx = TransportContext::default();
        assert_eq!(ctx.local_addr.to_string(), "0.0.0.0:0");
        assert_eq!(ctx.peer_addr.to_string(), "0.0.0.0:0");
        assert_eq!(ctx.family(), AddressFamily::Ipv4);
    }
}
