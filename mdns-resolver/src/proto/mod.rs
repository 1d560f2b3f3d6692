//! Sans-I/O mDNS resolution.
//!
//! This module provides [`MdnsResolver`], the protocol state machine of a
//! single hostname lookup. It implements [`sansio::Protocol`] and performs no
//! I/O itself; [`Resolver`](crate::Resolver) drives it over a blocking
//! socket, and any other event loop can drive it the same way.
//!
//! # Lifecycle
//!
//! 1. [`MdnsResolver::start()`] queues two queries for the host: one asking
//!    for a unicast reply (QU) and one for a multicast reply (QM).
//! 2. Send every packet from [`poll_write()`](sansio::Protocol::poll_write).
//! 3. Pass received datagrams to [`handle_read()`](sansio::Protocol::handle_read).
//! 4. Call [`handle_timeout()`](sansio::Protocol::handle_timeout) after each
//!    receive, or when [`poll_timeout()`](sansio::Protocol::poll_timeout) expires.
//! 5. Stop on the first [`MdnsEvent`] from [`poll_event()`](sansio::Protocol::poll_event).
//!
//! ```rust
//! use mdns_resolver::{MdnsEvent, MdnsResolver, ResolverConfig, ResolverState};
//! use sansio::Protocol;
//! use std::time::{Duration, Instant};
//!
//! let config = ResolverConfig::default().with_query_timeout(Duration::from_secs(2));
//! let mut resolver = MdnsResolver::new(&config, "printer.local");
//!
//! let now = Instant::now();
//! resolver.start(now).unwrap();
//! while let Some(packet) = resolver.poll_write() {
//!     // socket.send_to(&packet.message, packet.transport.peer_addr)?;
//!     assert_eq!(packet.transport.peer_addr.to_string(), "224.0.0.251:5353");
//! }
//! assert_eq!(resolver.state(), ResolverState::Listening);
//!
//! // Nobody answered.
//! resolver.handle_timeout(now + Duration::from_secs(2)).unwrap();
//! assert!(matches!(resolver.poll_event(), Some(MdnsEvent::TimedOut)));
//! ```


use std::collections::VecDeque;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext, TransportMessage};

use crate::config::ResolverConfig;
use crate::message::name::labels_eq;
use crate::message::{DnsType, Message, Name};

/// The mDNS multicast group address (224.0.0.251).
pub const MDNS_MULTICAST_IPV4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The mDNS link-local IPv6 multicast group address (ff02::fb).
pub const MDNS_MULTICAST_IPV6: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

/// The standard mDNS port (5353).
pub const MDNS_PORT: u16 = 5353;

/// mDNS multicast destination address (224.0.0.251:5353).
///
/// ```rust
/// use mdns_resolver::MDNS_DEST_ADDR;
///
/// assert_eq!(MDNS_DEST_ADDR.to_string(), "224.0.0.251:5353");
/// ```
pub const MDNS_DEST_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(MDNS_MULTICAST_IPV4), MDNS_PORT);

const LOCAL_LABEL: &[u8] = b"local";

/// Where a lookup stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolverState {
    /// Created, queries not built yet.
    Idle,
    /// Queries queued, not all handed out by `poll_write`.
    Sending,
    /// Waiting for answers until the deadline.
    Listening,
    /// A matching A record was found.
    Matched,
    /// The deadline passed without a match.
    TimedOut,
    /// Closed; every further input is rejected.
    Closed,
}

impl fmt::Display for ResolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ResolverState::Idle => "Idle",
            ResolverState::Sending => "Sending",
            ResolverState::Listening => "Listening",
            ResolverState::Matched => "Matched",
            ResolverState::TimedOut => "TimedOut",
            ResolverState::Closed => "Closed",
        };
        write!(f, "{s}")
    }
}

/// Events emitted by the resolver.
///
/// Exactly one event is emitted per lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdnsEvent {
    /// An A record for the host arrived; the lookup is over.
    Answered(Ipv4Addr),

    /// The query timeout elapsed without a matching answer.
    TimedOut,
}

/// Sans-I/O lookup of one hostname.
///
/// # Example: feeding a response
///
/// ```rust
/// use bytes::BytesMut;
/// use mdns_resolver::message::{Header, Message, Name, Resource};
/// use mdns_resolver::{MdnsEvent, MdnsResolver, ResolverConfig};
/// use sansio::Protocol;
/// use shared::{TaggedBytesMut, TransportContext};
/// use std::net::Ipv4Addr;
/// use std::time::Instant;
///
/// let mut resolver = MdnsResolver::new(&ResolverConfig::default(), "printer.local");
/// resolver.start(Instant::now()).unwrap();
/// while resolver.poll_write().is_some() {}
///
/// let response = Message {
///     header: Header { response: true, authoritative: true, ..Default::default() },
///     answers: vec![Resource::a(
///         Name::new("printer.local.").unwrap(),
///         120,
///         Ipv4Addr::new(192, 168, 1, 5),
///     )],
///     ..Default::default()
/// };
/// resolver
///     .handle_read(TaggedBytesMut {
///         now: Instant::now(),
///         transport: TransportContext::default(),
///         message: BytesMut::from(&response.serialize().unwrap()[..]),
///     })
///     .unwrap();
///
/// assert_eq!(
///     resolver.poll_event(),
///     Some(MdnsEvent::Answered(Ipv4Addr::new(192, 168, 1, 5)))
/// );
/// ```
pub struct MdnsResolver {
    /// Host as given by the caller
    host: String,

    dest_addr: SocketAddr,
    query_timeout: Duration,
    log_prefix: &'static str,

    state: ResolverState,
    deadline: Option<Instant>,
    answer: Option<Ipv4Addr>,

    /// Outgoing packet queue
    write_outs: VecDeque<TaggedBytesMut>,

    /// Event queue
    event_outs: VecDeque<MdnsEvent>,
}

impl MdnsResolver {
    /// Create a resolver for `host` using the timeouts and destination of
    /// `config`. Nothing is queued until [`start()`](Self::start).
    pub fn new(config: &ResolverConfig, host: &str) -> Self {
        let config = config.normalized();
        Self {
            host: host.to_owned(),
            dest_addr: config.dest_addr,
            query_timeout: config.query_timeout,
            log_prefix: config.log_prefix(),
            state: ResolverState::Idle,
            deadline: None,
            answer: None,
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),
        }
    }

    /// Queue the QU and QM queries and arm the deadline at
    /// `now + query_timeout`.
    ///
    /// # Errors
    ///
    /// [`Error::ErrHostnameEmpty`] or a name validation error if the host
    /// cannot be encoded; nothing is queued in that case.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        match self.state {
            ResolverState::Idle => {}
            ResolverState::Closed => return Err(Error::ErrConnectionClosed),
            _ => return Ok(()),
        }

        let mut packets = Vec::with_capacity(2);
        for unicast_response in [true, false] {
            let query = Message::mdns_query(&self.host, unicast_response)?;
            log::trace!("{}queuing {}", self.log_prefix, query.questions[0]);
            packets.push(query.serialize()?);
        }

        for raw in packets {
            self.write_outs.push_back(TransportMessage {
                now,
                transport: TransportContext {
                    local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                    peer_addr: self.dest_addr,
                },
                message: BytesMut::from(&raw[..]),
            });
        }

        self.deadline = Some(now + self.query_timeout);
        self.state = ResolverState::Sending;
        Ok(())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// The matched address, once [`MdnsEvent::Answered`] has been emitted.
    pub fn answer(&self) -> Option<Ipv4Addr> {
        self.answer
    }

    fn process_message(&mut self, msg: &TaggedBytesMut) {
        let response = match Message::parse(&msg.message) {
            Ok(response) => response,
            Err(err) => {
                log::debug!(
                    "{}ignoring malformed packet of {} bytes from {}: {err}",
                    self.log_prefix,
                    msg.message.len(),
                    msg.transport.peer_addr
                );
                return;
            }
        };

        // The answer section of a query is a known-answer list (RFC 6762
        // section 7.1), not an authoritative reply.
        if !response.header.response {
            log::trace!(
                "{}ignoring query from {}",
                self.log_prefix,
                msg.transport.peer_addr
            );
            return;
        }

        for answer in &response.answers {
            if answer.rrtype != DnsType::A.code() || !host_matches(&self.host, &answer.name) {
                continue;
            }

            let addr = match answer.rdata_as_ipv4() {
                Ok(addr) => addr,
                Err(err) => {
                    log::debug!(
                        "{}skipping A record for {} with bad data: {err}",
                        self.log_prefix,
                        answer.name
                    );
                    continue;
                }
            };

            log::info!(
                "{}resolved {} to {addr} (from {})",
                self.log_prefix,
                self.host,
                msg.transport.peer_addr
            );
            self.answer = Some(addr);
            self.state = ResolverState::Matched;
            self.deadline = None;
            self.event_outs.push_back(MdnsEvent::Answered(addr));
            return;
        }

        log::trace!(
            "{}no answer for {} in packet from {}",
            self.log_prefix,
            self.host,
            msg.transport.peer_addr
        );
    }
}

/// Reports whether an answer for `name` satisfies a lookup of `host`.
///
/// Labels are compared ignoring ASCII case; a trailing dot on `host` does
/// not matter. The answer may add or drop the `.local` suffix: a lookup of
/// `printer` accepts `printer.local`, and a lookup of `printer.local`
/// accepts `printer`. A single label spelled `printer.local` is not the
/// name `printer.local`.
pub(crate) fn host_matches(host: &str, name: &Name) -> bool {
    let Ok(host) = Name::new(host) else {
        return false;
    };
    let (host, name) = (host.labels(), name.labels());

    if labels_eq(host, name) {
        return true;
    }
    match host.split_last() {
        Some((last, bare)) if !bare.is_empty() && last.eq_ignore_ascii_case(LOCAL_LABEL) => {
            labels_eq(bare, name)
        }
        _ => matches!(
            name.split_last(),
            Some((last, rest)) if last.eq_ignore_ascii_case(LOCAL_LABEL) && labels_eq(rest, host)
        ),
    }
}

impl sansio::Protocol<TaggedBytesMut, (), ()> for MdnsResolver {
    type Rout = ();
    type Wout = TaggedBytesMut;
    type Eout = MdnsEvent;
    type Error = Error;
    type Time = Instant;

    /// Process a received datagram.
    ///
    /// Packets that do not decode are logged and dropped, so a malformed
    /// datagram never ends the lookup. Packets arriving after the lookup is
    /// over are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::ErrNotStarted`] before [`start()`](MdnsResolver::start),
    /// [`Error::ErrConnectionClosed`] after [`close()`](sansio::Protocol::close).
    fn handle_read(&mut self, msg: TaggedBytesMut) -> Result<()> {
        match self.state {
            ResolverState::Idle => Err(Error::ErrNotStarted),
            ResolverState::Closed => Err(Error::ErrConnectionClosed),
            ResolverState::Sending | ResolverState::Listening => {
                self.process_message(&msg);
                Ok(())
            }
            ResolverState::Matched | ResolverState::TimedOut => Ok(()),
        }
    }

    /// The answer is delivered as an event.
    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    /// Queries are built by [`start()`](MdnsResolver::start).
    fn handle_write(&mut self, _msg: ()) -> Result<()> {
        Ok(())
    }

    /// Next query to send to `packet.transport.peer_addr`.
    ///
    /// The QU query comes first, then the QM query. Handing out the last
    /// one moves the resolver to [`ResolverState::Listening`].
    fn poll_write(&mut self) -> Option<Self::Wout> {
        let packet = self.write_outs.pop_front();
        if self.write_outs.is_empty() && self.state == ResolverState::Sending {
            self.state = ResolverState::Listening;
        }
        packet
    }

    fn handle_event(&mut self, _evt: ()) -> Result<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.event_outs.pop_front()
    }

    /// Check the deadline.
    ///
    /// Emits [`MdnsEvent::TimedOut`] once `now` reaches the deadline while
    /// no answer has matched.
    fn handle_timeout(&mut self, now: Self::Time) -> Result<()> {
        match self.state {
            ResolverState::Idle => return Err(Error::ErrNotStarted),
            ResolverState::Closed => return Err(Error::ErrConnectionClosed),
            ResolverState::Matched | ResolverState::TimedOut => return Ok(()),
            ResolverState::Sending | ResolverState::Listening => {}
        }

        if let Some(deadline) = self.deadline
            && deadline <= now
        {
            log::debug!(
                "{}query for {} timed out after {:?}",
                self.log_prefix,
                self.host,
                self.query_timeout
            );
            self.state = ResolverState::TimedOut;
            self.deadline = None;
            self.event_outs.push_back(MdnsEvent::TimedOut);
        }
        Ok(())
    }

    /// The deadline while the lookup is in progress.
    fn poll_timeout(&mut self) -> Option<Self::Time> {
        self.deadline
    }

    /// Close the resolver, dropping queued packets and events.
    fn close(&mut self) -> Result<()> {
        self.state = ResolverState::Closed;
        self.deadline = None;
        self.write_outs.clear();
        self.event_outs.clear();
        Ok(())
    }
}
