//! # mdns-resolver
//!
//! Resolve `.local` hostnames to IPv4 addresses with multicast DNS.
//!
//! The crate has three layers:
//!
//! - [`message`]: a bounds-checked codec for the DNS wire format, including
//!   name compression and the mDNS uses of the class field.
//! - [`MdnsResolver`]: a sans-I/O lookup implementing [`sansio::Protocol`].
//!   It builds the queries, filters answers and tracks the deadline, but
//!   never touches a socket.
//! - [`Resolver`]: a blocking driver that runs an [`MdnsResolver`] over a
//!   [`MulticastTransport`], by default a [`UdpMulticastTransport`] opened
//!   with [`MulticastSocket`].
//!
//! ## How a lookup works
//!
//! Two A queries for the host go to `224.0.0.251:5353`, the first asking for
//! a unicast reply (QU) and the second for a multicast reply (QM), both with
//! transaction id 0. The resolver then listens until the query timeout. The
//! first A record whose name matches the host wins; a lookup of `printer`
//! accepts `printer.local` and a lookup of `printer.local` accepts `printer`.
//! Malformed packets from other responders on the link are dropped without
//! ending the lookup.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdns_resolver::{Resolver, ResolverConfig};
//! use std::time::Duration;
//!
//! let resolver = Resolver::new(
//!     ResolverConfig::default()
//!         .with_query_timeout(Duration::from_secs(5))
//!         .with_receive_timeout(Duration::from_millis(500)),
//! );
//! let addr = resolver.resolve("printer.local")?;
//! println!("printer.local -> {addr}");
//! # Ok::<(), shared::error::Error>(())
//! ```
//!
//! ## Event Loop Pattern
//!
//! Driving [`MdnsResolver`] directly:
//!
//! ```text
//! resolver.start(now)?;
//! while let Some(packet) = resolver.poll_write() {
//!     socket.send_to(&packet.message, packet.transport.peer_addr);
//! }
//! loop {
//!     if let Some(event) = resolver.poll_event() {
//!         match event {
//!             MdnsEvent::Answered(addr) => { /* done */ }
//!             MdnsEvent::TimedOut => { /* give up */ }
//!         }
//!     }
//!     select! {
//!         packet = socket.recv_from() => resolver.handle_read(packet)?,
//!         _ = sleep_until(resolver.poll_timeout()) => {}
//!     }
//!     resolver.handle_timeout(Instant::now())?;
//! }
//! ```
//!
//! ## Protocol Details
//!
//! - **Multicast Address**: 224.0.0.251:5353 (IPv4); ff02::fb is accepted
//! - **Record Types**: A answers are used; other types are parsed and skipped
//! - **Compression**: names are compressed on output and pointers are
//!   validated on input

#![warn(rust_2018_idioms)]

pub mod message;

pub(crate) mod config;
pub(crate) mod proto;
pub(crate) mod resolver;
pub(crate) mod socket;
pub(crate) mod transport;

pub use config::ResolverConfig;
pub use proto::{
    MDNS_DEST_ADDR, MDNS_MULTICAST_IPV4, MDNS_MULTICAST_IPV6, MDNS_PORT, MdnsEvent, MdnsResolver,
    ResolverState,
};
pub use resolver::{Resolver, resolve};
pub use socket::MulticastSocket;
pub use transport::{MulticastTransport, Received, TransportGuard, UdpMulticastTransport};
