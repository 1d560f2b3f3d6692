//! Configuration for mDNS resolution.
//!
//! This module provides the [`ResolverConfig`] struct for tuning how long a
//! resolution waits, where queries go and how the multicast socket is set up.
//!
//! # Examples
//!
//! ## Short-lived lookups
//!
//! ```rust
//! use mdns_resolver::ResolverConfig;
//! use std::time::Duration;
//!
//! // Give up after 3 seconds, checking the deadline at least every 500ms.
//! let config = ResolverConfig::default()
//!     .with_query_timeout(Duration::from_secs(3))
//!     .with_receive_timeout(Duration::from_millis(500));
//! ```
//!
//! ## Pinning the interface
//!
//! ```rust
//! use mdns_resolver::ResolverConfig;
//! use std::net::Ipv4Addr;
//!
//! let config = ResolverConfig::default()
//!     .with_interface(Ipv4Addr::new(192, 168, 1, 100))
//!     .with_multicast_ttl(1);
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::proto::MDNS_DEST_ADDR;
use shared::AddressFamily;

/// Default overall time a resolution may take (30 seconds).
pub(crate) const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound for a single receive (30 seconds).
pub(crate) const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default multicast TTL / hop limit.
pub(crate) const DEFAULT_MULTICAST_TTL: u32 = 255;

/// Default receive buffer size. mDNS packets fit in 9000 bytes at most but
/// answers to a single A question are far smaller.
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Configuration for a resolver.
///
/// Use the builder pattern to construct a configuration:
///
/// ```rust
/// use mdns_resolver::ResolverConfig;
/// use std::time::Duration;
///
/// let config = ResolverConfig::new()
///     .with_query_timeout(Duration::from_secs(5));
/// assert_eq!(config.dest_addr.to_string(), "224.0.0.251:5353");
/// ```
///
/// # Fields
///
/// - `query_timeout`: overall deadline of one resolution (default: 30 seconds)
/// - `receive_timeout`: longest single wait for a datagram (default: 30 seconds)
/// - `dest_addr`: multicast group and port queries go to (default: `224.0.0.251:5353`)
/// - `interface`: local interface for multicast (default: any)
/// - `multicast_ttl`: TTL of outgoing queries (default: 255)
/// - `buffer_size`: receive buffer size (default: 4096 bytes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum time to wait for a matching answer.
    ///
    /// The deadline starts when the queries are queued. A resolution that
    /// has not seen a matching answer by then fails with
    /// [`Error::ErrQueryTimeout`](shared::error::Error::ErrQueryTimeout).
    pub query_timeout: Duration,

    /// Maximum time a single receive blocks.
    ///
    /// Each receive waits for the smaller of this value and the time left
    /// before the deadline, so a long receive timeout never stretches the
    /// overall deadline.
    pub receive_timeout: Duration,

    /// Destination of the queries; the socket joins this group.
    ///
    /// An IPv6 group such as `[ff02::fb]:5353` is accepted; answers are
    /// still read as A records.
    pub dest_addr: SocketAddr,

    /// Local IPv4 interface to send and join on. `None` lets the system
    /// pick (`INADDR_ANY`).
    pub interface: Option<Ipv4Addr>,

    pub multicast_ttl: u32,

    pub buffer_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            dest_addr: MDNS_DEST_ADDR,
            interface: None,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with default values.
    ///
    /// Equivalent to [`ResolverConfig::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall query timeout.
    ///
    /// A value of zero will use the default timeout (30 seconds).
    ///
    /// # Example
    ///
    /// ```rust
    /// use mdns_resolver::ResolverConfig;
    /// use std::time::Duration;
    ///
    /// let config = ResolverConfig::default()
    ///     .with_query_timeout(Duration::from_secs(2));
    /// ```
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the per-receive timeout.
    ///
    /// A value of zero will use the default timeout (30 seconds).
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Set the multicast destination, e.g. `[ff02::fb]:5353` for IPv6.
    pub fn with_dest_addr(mut self, dest_addr: SocketAddr) -> Self {
        self.dest_addr = dest_addr;
        self
    }

    /// Sets a specific network interface for multicast operations.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mdns_resolver::ResolverConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ResolverConfig::default()
    ///     .with_interface(Ipv4Addr::new(10, 0, 0, 5));
    /// assert_eq!(config.interface, Some(Ipv4Addr::new(10, 0, 0, 5)));
    /// ```
    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn with_multicast_ttl(mut self, ttl: u32) -> Self {
        self.multicast_ttl = ttl;
        self
    }

    /// Set the receive buffer size. Zero falls back to the default.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Address family of the destination group.
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.dest_addr.ip())
    }

    /// "ipv4: " or "ipv6: ", prepended to log lines.
    pub(crate) fn log_prefix(&self) -> &'static str {
        self.family().log_prefix()
    }

    // Zero values fall back to the defaults.
    pub(crate) fn normalized(&self) -> Self {
        let mut config = self.clone();
        if config.query_timeout.is_zero() {
            config.query_timeout = DEFAULT_QUERY_TIMEOUT;
        }
        if config.receive_timeout.is_zero() {
            config.receive_timeout = DEFAULT_RECEIVE_TIMEOUT;
        }
        if config.buffer_size == 0 {
            config.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        config
    }
}
