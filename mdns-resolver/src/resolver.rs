//! Blocking resolution over a [`MulticastTransport`].

use std::net::Ipv4Addr;
use std::time::Instant;

use bytes::BytesMut;
use sansio::Protocol;
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext};

use crate::config::ResolverConfig;
use crate::proto::{MdnsEvent, MdnsResolver};
use crate::transport::{MulticastTransport, Received, TransportGuard, UdpMulticastTransport};

/// Resolves hostnames to IPv4 addresses over mDNS, one blocking call per
/// lookup.
///
/// Every call owns its transport for its whole duration, so a `Resolver`
/// can be shared between threads and used concurrently.
///
/// ```rust,no_run
/// use mdns_resolver::{Resolver, ResolverConfig};
/// use std::time::Duration;
///
/// let resolver = Resolver::new(
///     ResolverConfig::default().with_query_timeout(Duration::from_secs(3)),
/// );
/// match resolver.resolve("printer.local") {
///     Ok(addr) => println!("printer.local is at {addr}"),
///     Err(err) if err.is_timeout() => println!("no answer"),
///     Err(err) => eprintln!("lookup failed: {err}"),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `host` on a fresh [`UdpMulticastTransport`].
    ///
    /// # Errors
    ///
    /// - [`Error::ErrQueryTimeout`] when no matching answer arrives in time
    /// - [`Error::Io`] when the socket cannot be opened, or a send or
    ///   receive fails
    /// - a name error such as [`Error::ErrHostnameEmpty`] for a host that
    ///   cannot be put in a query
    pub fn resolve(&self, host: &str) -> Result<Ipv4Addr> {
        let transport = UdpMulticastTransport::open(&self.config)?;
        self.resolve_with(transport, host)
    }

    /// Resolve `host` over `transport`.
    ///
    /// The transport is left and closed exactly once before this returns,
    /// whatever the outcome.
    pub fn resolve_with<T: MulticastTransport>(&self, transport: T, host: &str) -> Result<Ipv4Addr> {
        let log_prefix = self.config.log_prefix();
        let mut transport = TransportGuard::new(transport, log_prefix);
        let local_addr = transport
            .local_addr()
            .unwrap_or_else(|_| TransportContext::default().local_addr);

        let mut proto = MdnsResolver::new(&self.config, host);
        proto.start(Instant::now())?;
        while let Some(packet) = proto.poll_write() {
            let n = transport.send_to(&packet.message, packet.transport.peer_addr)?;
            log::trace!(
                "{}sent {n} bytes to {}",
                log_prefix,
                packet.transport.peer_addr
            );
        }

        let mut buf = vec![0u8; self.config.buffer_size];
        loop {
            if let Some(event) = proto.poll_event() {
                proto.close()?;
                return match event {
                    MdnsEvent::Answered(addr) => Ok(addr),
                    MdnsEvent::TimedOut => Err(Error::ErrQueryTimeout),
                };
            }

            let Some(deadline) = proto.poll_timeout() else {
                return Err(Error::ErrQueryTimeout);
            };
            let wait = deadline
                .saturating_duration_since(Instant::now())
                .min(self.config.receive_timeout);

            match transport.recv_from(&mut buf, wait)? {
                Received::Datagram { len, peer_addr } => {
                    log::trace!("{}received {len} bytes from {peer_addr}", log_prefix);
                    proto.handle_read(TaggedBytesMut {
                        now: Instant::now(),
                        transport: TransportContext {
                            local_addr,
                            peer_addr,
                        },
                        message: BytesMut::from(&buf[..len]),
                    })?;
                }
                Received::TimedOut => {
                    log::debug!("{}receive timed out after {wait:?}", log_prefix);
                }
            }

            proto.handle_timeout(Instant::now())?;
        }
    }
}

/// Resolve `host` with the default configuration.
///
/// ```rust,no_run
/// let addr = mdns_resolver::resolve("printer.local")?;
/// println!("{addr}");
/// # Ok::<(), shared::error::Error>(())
/// ```
pub fn resolve(host: &str) -> Result<Ipv4Addr> {
    Resolver::default().resolve(host)
}
