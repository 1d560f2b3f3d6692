//! DNS wire format: messages, questions, resource records and names.
//!
//! Everything here is a plain value built per query or per received packet.
//! Encoding and decoding go through a [`WireBuffer`] that lives for a single
//! [`Message::serialize`] or [`Message::parse`] call.

#[cfg(test)]
mod message_test;

pub(crate) mod buffer;
pub(crate) mod header;
pub(crate) mod name;
pub(crate) mod question;
pub(crate) mod resource;

use std::fmt;

pub use buffer::WireBuffer;
pub use header::Header;
pub use name::Name;
pub use question::Question;
pub use resource::{Resource, ResourceBody};

use header::HeaderInternal;
use shared::error::*;

// Message formats

/// A Type is a type of DNS request and response.
///
/// This is the closed registry of record types the resolver knows about.
/// Looking up any other code fails with [`Error::ErrUnknownType`].
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DnsType {
    #[default]
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Hinfo,
    Mx,
    Txt,
    Aaaa,
    Srv,
    Opt,
    Nsec,
    Any,
}

impl TryFrom<u16> for DnsType {
    type Error = Error;

    fn try_from(v: u16) -> Result<Self> {
        Ok(match v {
            1 => DnsType::A,
            2 => DnsType::Ns,
            5 => DnsType::Cname,
            6 => DnsType::Soa,
            12 => DnsType::Ptr,
            13 => DnsType::Hinfo,
            15 => DnsType::Mx,
            16 => DnsType::Txt,
            28 => DnsType::Aaaa,
            33 => DnsType::Srv,
            41 => DnsType::Opt,
            47 => DnsType::Nsec,
            255 => DnsType::Any,
            _ => return Err(Error::ErrUnknownType(v)),
        })
    }
}

impl fmt::Display for DnsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            DnsType::A => "A",
            DnsType::Ns => "NS",
            DnsType::Cname => "CNAME",
            DnsType::Soa => "SOA",
            DnsType::Ptr => "PTR",
            DnsType::Hinfo => "HINFO",
            DnsType::Mx => "MX",
            DnsType::Txt => "TXT",
            DnsType::Aaaa => "AAAA",
            DnsType::Srv => "SRV",
            DnsType::Opt => "OPT",
            DnsType::Nsec => "NSEC",
            DnsType::Any => "ANY",
        };
        write!(f, "{s}")
    }
}

impl DnsType {
    /// The numeric type code.
    pub fn code(&self) -> u16 {
        match *self {
            DnsType::A => 1,
            DnsType::Ns => 2,
            DnsType::Cname => 5,
            DnsType::Soa => 6,
            DnsType::Ptr => 12,
            DnsType::Hinfo => 13,
            DnsType::Mx => 15,
            DnsType::Txt => 16,
            DnsType::Aaaa => 28,
            DnsType::Srv => 33,
            DnsType::Opt => 41,
            DnsType::Nsec => 47,
            DnsType::Any => 255,
        }
    }
}

/// DNS class of a question or resource record, without the mDNS top bit.
///
/// mDNS only uses [`DNSCLASS_INET`]; OPT pseudo-records reuse the field for
/// the requestor's UDP payload size.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct DnsClass(pub u16);

/// Internet class (IN).
pub const DNSCLASS_INET: DnsClass = DnsClass(1);

/// Any class (*), only valid in queries.
pub const DNSCLASS_ANY: DnsClass = DnsClass(255);

impl fmt::Display for DnsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let other = format!("{}", self.0);
        let s = match *self {
            DNSCLASS_INET => "ClassINET",
            DNSCLASS_ANY => "ClassANY",
            _ => other.as_str(),
        };
        write!(f, "{s}")
    }
}

// Top bit of the class field: QU in questions, cache-flush in records
// (RFC 6762 sections 18.12 and 18.13).
pub(crate) const CLASS_TOP_BIT: u16 = 1 << 15;
pub(crate) const CLASS_MASK: u16 = !CLASS_TOP_BIT;

// An OpCode is a DNS operation code.
pub type OpCode = u16;

// An RCode is a DNS response status code.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub enum RCode {
    // Message.Rcode
    #[default]
    Success = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
    Unsupported,
}

impl From<u8> for RCode {
    fn from(v: u8) -> Self {
        match v {
            0 => RCode::Success,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            _ => RCode::Unsupported,
        }
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RCode::Success => "RCodeSuccess",
            RCode::FormatError => "RCodeFormatError",
            RCode::ServerFailure => "RCodeServerFailure",
            RCode::NameError => "RCodeNameError",
            RCode::NotImplemented => "RCodeNotImplemented",
            RCode::Refused => "RCodeRefused",
            RCode::Unsupported => "RCodeUnsupported",
        };
        write!(f, "{s}")
    }
}

// Internal constants.

// UINT16LEN is the length (in bytes) of a uint16.
const UINT16LEN: usize = 2;

// UINT32LEN is the length (in bytes) of a uint32.
const UINT32LEN: usize = 4;

// HEADER_LEN is the length (in bytes) of a DNS header.
//
// A header is comprised of 6 uint16s and no padding.
const HEADER_LEN: usize = 6 * UINT16LEN;

const HEADER_BIT_QR: u16 = 1 << 15; // query/response (response=1)
const HEADER_BIT_AA: u16 = 1 << 10; // authoritative
const HEADER_BIT_TC: u16 = 1 << 9; // truncated
const HEADER_BIT_RD: u16 = 1 << 8; // recursion desired
const HEADER_BIT_RA: u16 = 1 << 7; // recursion available

/// Message is a representation of a DNS message.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Resource>,
    pub authorities: Vec<Resource>,
    pub additionals: Vec<Resource>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = "dnsmessage.Message{Header: ".to_owned();
        s += self.header.to_string().as_str();

        s += ", Questions: ";
        let v: Vec<String> = self.questions.iter().map(|q| q.to_string()).collect();
        s += &v.join(", ");

        s += ", Answers: ";
        let v: Vec<String> = self.answers.iter().map(|q| q.to_string()).collect();
        s += &v.join(", ");

        s += ", Authorities: ";
        let v: Vec<String> = self.authorities.iter().map(|q| q.to_string()).collect();
        s += &v.join(", ");

        s += ", Additionals: ";
        let v: Vec<String> = self.additionals.iter().map(|q| q.to_string()).collect();
        s += &v.join(", ");

        write!(f, "{s}")
    }
}

impl Message {
    /// Builds a one-question mDNS query for the A record of `host`.
    ///
    /// The transaction id is zero as RFC 6762 section 18.1 asks for
    /// multicast queries, and all header flags are clear.
    ///
    /// ```rust
    /// use mdns_resolver::message::Message;
    ///
    /// let query = Message::mdns_query("printer.local", true).unwrap();
    /// let bytes = query.serialize().unwrap();
    /// // 12 byte header, 15 byte name, type and class.
    /// assert_eq!(bytes.len(), 12 + 15 + 4);
    /// assert_eq!(&bytes[bytes.len() - 2..], &[0x80, 0x01]);
    /// ```
    pub fn mdns_query(host: &str, unicast_response: bool) -> Result<Self> {
        if host.is_empty() {
            return Err(Error::ErrHostnameEmpty);
        }
        let name = Name::new(host)?;
        Ok(Message {
            header: Header::default(),
            questions: vec![Question::new(name, DnsType::A, unicast_response)],
            ..Default::default()
        })
    }

    /// Length of the message without name compression, an upper bound of
    /// what [`Message::serialize`] produces.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self
                .questions
                .iter()
                .map(|q| q.encoded_len())
                .sum::<usize>()
            + self
                .answers
                .iter()
                .chain(&self.authorities)
                .chain(&self.additionals)
                .map(|r| r.encoded_len())
                .sum::<usize>()
    }

    /// Serializes the message, compressing names across all sections.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        // It is very unlikely that anyone will try to pack more than 65535 of
        // any particular type, but it is possible and we should fail gracefully.
        if self.questions.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyQuestions);
        }
        if self.answers.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAnswers);
        }
        if self.authorities.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAuthorities);
        }
        if self.additionals.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAdditionals);
        }

        let (id, bits) = self.header.pack();
        let h = HeaderInternal {
            id,
            bits,
            questions: self.questions.len() as u16,
            answers: self.answers.len() as u16,
            authorities: self.authorities.len() as u16,
            additionals: self.additionals.len() as u16,
        };

        let mut buf = WireBuffer::with_capacity(self.encoded_len());
        h.serialize(&mut buf)?;
        for question in &self.questions {
            question.serialize(&mut buf)?;
        }
        for resource in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            resource.serialize(&mut buf)?;
        }

        Ok(buf.into_bytes())
    }

    /// Parses a full message.
    ///
    /// Exactly the number of entries announced in the header is read from
    /// each section. Running out of bytes anywhere fails with
    /// [`Error::ErrTruncatedMessage`]; trailing bytes are ignored.
    pub fn parse(msg: &[u8]) -> Result<Self> {
        let mut buf = WireBuffer::from_bytes(msg);
        Self::parse_sections(&mut buf).map_err(|err| match err {
            Error::ErrBufferUnderflow => Error::ErrTruncatedMessage,
            err => err,
        })
    }

    fn parse_sections(buf: &mut WireBuffer) -> Result<Self> {
        let h = HeaderInternal::parse(buf)?;

        let mut questions = Vec::new();
        for _ in 0..h.questions {
            questions.push(Question::parse(buf)?);
        }

        Ok(Message {
            header: h.header(),
            questions,
            answers: Self::parse_resources(buf, h.answers)?,
            authorities: Self::parse_resources(buf, h.authorities)?,
            additionals: Self::parse_resources(buf, h.additionals)?,
        })
    }

    fn parse_resources(buf: &mut WireBuffer, count: u16) -> Result<Vec<Resource>> {
        let mut resources = Vec::new();
        for _ in 0..count {
            resources.push(Resource::parse(buf)?);
        }
        Ok(resources)
    }
}
