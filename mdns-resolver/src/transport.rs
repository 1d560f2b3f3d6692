//! Blocking datagram transport used by [`Resolver`](crate::Resolver).
//!
//! [`MulticastTransport`] is the capability the driver needs from a socket:
//! send, receive with a timeout, and leave the group. [`UdpMulticastTransport`]
//! implements it over a [`MulticastSocket`]; tests plug in scripted
//! implementations. [`TransportGuard`] releases the transport exactly once.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::socket::MulticastSocket;

// A zero read timeout means "block forever" to the OS.
const MIN_RECEIVE_TIMEOUT: Duration = Duration::from_millis(1);

/// Outcome of one [`MulticastTransport::recv_from`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Received {
    /// `len` bytes were written to the front of the buffer.
    Datagram { len: usize, peer_addr: SocketAddr },
    /// Nothing arrived within the timeout.
    TimedOut,
}

/// A bound socket joined to a multicast group.
pub trait MulticastTransport {
    /// Local address of the socket.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Send one datagram to `target`.
    fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Wait at most `timeout` for one datagram.
    ///
    /// A timeout is reported as [`Received::TimedOut`], never as an error.
    fn recv_from(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Received>;

    /// Leave the multicast group and close the socket.
    fn leave_and_close(&mut self) -> io::Result<()>;
}

/// [`MulticastTransport`] over a blocking [`UdpSocket`].
#[derive(Debug)]
pub struct UdpMulticastTransport {
    socket: Option<UdpSocket>,
    group: IpAddr,
    interface: Option<Ipv4Addr>,
}

impl UdpMulticastTransport {
    /// Open a socket for `config` through [`MulticastSocket`].
    pub fn open(config: &ResolverConfig) -> io::Result<Self> {
        let builder = MulticastSocket::from_config(config);
        let group = builder.group().ip();
        let interface = builder.interface();
        let socket = builder.into_std()?;
        log::trace!(
            "{}joined {} on {:?}",
            config.log_prefix(),
            config.dest_addr,
            socket.local_addr()
        );
        Ok(Self::from_std(socket, group, interface))
    }

    /// Wrap a socket that is already bound and joined to `group`.
    pub fn from_std(
        socket: UdpSocket,
        group: IpAddr,
        interface: Option<Ipv4Addr>,
    ) -> Self {
        Self {
            socket: Some(socket),
            group,
            interface,
        }
    }

    fn socket(&self) -> io::Result<&UdpSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))
    }
}

impl MulticastTransport for UdpMulticastTransport {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket()?.local_addr()
    }

    fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket()?.send_to(buf, target)
    }

    fn recv_from(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Received> {
        let socket = self.socket()?;
        socket.set_read_timeout(Some(timeout.max(MIN_RECEIVE_TIMEOUT)))?;
        match socket.recv_from(buf) {
            Ok((len, peer_addr)) => Ok(Received::Datagram { len, peer_addr }),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(Received::TimedOut)
            }
            Err(err) => Err(err),
        }
    }

    fn leave_and_close(&mut self) -> io::Result<()> {
        let Some(socket) = self.socket.take() else {
            return Ok(());
        };
        // The socket is dropped, and so closed, whether or not leaving works.
        match self.group {
            IpAddr::V4(group) => socket.leave_multicast_v4(
                &group,
                &self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED),
            ),
            IpAddr::V6(group) => socket.leave_multicast_v6(&group, 0),
        }
    }
}

/// Owns a transport for one resolution and releases it on drop.
///
/// [`MulticastTransport::leave_and_close`] runs exactly once, on every exit
/// path, including early returns through `?` and panics.
pub struct TransportGuard<T: MulticastTransport> {
    transport: T,
    log_prefix: &'static str,
}

impl<T: MulticastTransport> TransportGuard<T> {
    pub fn new(transport: T, log_prefix: &'static str) -> Self {
        Self {
            transport,
            log_prefix,
        }
    }
}

impl<T: MulticastTransport> Deref for TransportGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.transport
    }
}

impl<T: MulticastTransport> DerefMut for TransportGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: MulticastTransport> Drop for TransportGuard<T> {
    fn drop(&mut self) {
        if let Err(err) = self.transport.leave_and_close() {
            log::warn!("{}failed to leave multicast group: {err}", self.log_prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting {
        closes: Rc<Cell<usize>>,
        fail: bool,
    }

    impl MulticastTransport for Counting {
        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok("0.0.0.0:5353".parse().unwrap())
        }

        fn send_to(&mut self, buf: &[u8], _target: SocketAddr) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn recv_from(&mut self, _buf: &mut [u8], _timeout: Duration) -> io::Result<Received> {
            Ok(Received::TimedOut)
        }

        fn leave_and_close(&mut self) -> io::Result<()> {
            self.closes.set(self.closes.get() + 1);
            if self.fail {
                Err(io::Error::other("leave failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_guard_releases_once() {
        let closes = Rc::new(Cell::new(0));
        {
            let mut guard = TransportGuard::new(
                Counting {
                    closes: closes.clone(),
                    fail: false,
                },
                "ipv4: ",
            );
            assert_eq!(guard.send_to(&[1, 2, 3], "224.0.0.251:5353".parse().unwrap()).unwrap(), 3);
            assert_eq!(closes.get(), 0);
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_guard_swallows_release_error() {
        let closes = Rc::new(Cell::new(0));
        drop(TransportGuard::new(
            Counting {
                closes: closes.clone(),
                fail: true,
            },
            "ipv4: ",
        ));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_udp_transport_loopback() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let mut transport = UdpMulticastTransport::from_std(
            socket,
            IpAddr::V4(crate::proto::MDNS_MULTICAST_IPV4),
            None,
        );
        assert_eq!(transport.local_addr().unwrap(), addr);

        let mut buf = [0u8; 16];
        assert_eq!(
            transport
                .recv_from(&mut buf, Duration::from_millis(10))
                .unwrap(),
            Received::TimedOut
        );

        transport.send_to(b"ping", addr).unwrap();
        assert_eq!(
            transport.recv_from(&mut buf, Duration::from_secs(1)).unwrap(),
            Received::Datagram {
                len: 4,
                peer_addr: addr
            }
        );
        assert_eq!(&buf[..4], b"ping");

        // Never joined, so leaving fails; the socket is closed regardless.
        let _ = transport.leave_and_close();
        assert!(transport.local_addr().is_err());
        assert!(transport.leave_and_close().is_ok());
    }
}
