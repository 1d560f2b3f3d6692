pub(crate) mod body;

use std::fmt;
use std::net::Ipv4Addr;

pub use body::ResourceBody;

use super::buffer::WireBuffer;
use super::*;
use shared::error::*;

/// A DNS resource record.
///
/// The type code is kept as it appeared on the wire so records of types
/// outside [`DnsType`] pass through parsing untouched; [`Resource::typ`]
/// performs the registry lookup.
///
/// # Wire Format
///
/// ```text
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      NAME                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |CF|                  CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     RDATA                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// `CF` is the mDNS cache-flush bit.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Resource {
    /// The domain name for which this resource record pertains.
    pub name: Name,

    /// Raw type code.
    pub rrtype: u16,

    /// The class without the cache-flush bit.
    pub class: DnsClass,

    /// Whether the record replaces earlier cached records of the same
    /// name and type (RFC 6762 section 10.2).
    pub cache_flush: bool,

    /// Time to live in seconds.
    pub ttl: u32,

    /// Record data. Names embedded in the data are stored uncompressed,
    /// so the record serializes correctly into any message.
    pub rdata: Vec<u8>,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let typ = match self.typ() {
            Ok(t) => t.to_string(),
            Err(_) => format!("TYPE{}", self.rrtype),
        };
        let data = match self.body() {
            Ok(body) => body.to_string(),
            Err(_) => format!("{} bytes", self.rdata.len()),
        };
        write!(
            f,
            "dnsmessage.Resource{{Name: {}, Type: {}, Class: {}, CacheFlush: {}, TTL: {}, Data: {}}}",
            self.name, typ, self.class, self.cache_flush, self.ttl, data,
        )
    }
}

impl Resource {
    /// Creates a class IN record from raw record data.
    pub fn new(name: Name, typ: DnsType, ttl: u32, rdata: Vec<u8>) -> Self {
        Resource {
            name,
            rrtype: typ.code(),
            class: DNSCLASS_INET,
            cache_flush: false,
            ttl,
            rdata,
        }
    }

    /// Creates an A record.
    ///
    /// ```rust
    /// use mdns_resolver::message::{Name, Resource};
    /// use std::net::Ipv4Addr;
    ///
    /// let name = Name::new("printer.local").unwrap();
    /// let record = Resource::a(name, 120, Ipv4Addr::new(192, 168, 1, 5));
    /// assert_eq!(record.rdata_as_address_string().unwrap(), "192.168.1.5");
    /// ```
    pub fn a(name: Name, ttl: u32, addr: Ipv4Addr) -> Self {
        Resource::new(name, DnsType::A, ttl, addr.octets().to_vec())
    }

    /// Creates a record from typed data.
    ///
    /// Fails with [`Error::ErrInvalidRdata`] for [`ResourceBody::Unknown`],
    /// which carries no type; use [`Resource::new`] for those.
    pub fn from_body(name: Name, ttl: u32, body: &ResourceBody) -> Result<Self> {
        let typ = body.real_type().ok_or(Error::ErrInvalidRdata)?;
        Ok(Resource::new(name, typ, ttl, body.pack()?))
    }

    pub fn with_cache_flush(mut self, cache_flush: bool) -> Self {
        self.cache_flush = cache_flush;
        self
    }

    /// Looks the type code up in the registry.
    pub fn typ(&self) -> Result<DnsType> {
        DnsType::try_from(self.rrtype)
    }

    /// Length of the record without name compression.
    pub fn encoded_len(&self) -> usize {
        self.name.encoded_len() + UINT16LEN * 3 + UINT32LEN + self.rdata.len()
    }

    /// Typed view of the record data.
    pub fn body(&self) -> Result<ResourceBody> {
        let mut buf = WireBuffer::from_bytes(&self.rdata);
        let body = ResourceBody::read(self.rrtype, &mut buf, self.rdata.len())?;
        if buf.remaining() != 0 {
            return Err(Error::ErrInvalidRdata);
        }
        Ok(body)
    }

    /// The address of an A record.
    pub fn rdata_as_ipv4(&self) -> Result<Ipv4Addr> {
        if self.typ() != Ok(DnsType::A) {
            return Err(Error::ErrInvalidRdata);
        }
        match self.rdata[..] {
            [a, b, c, d] => Ok(Ipv4Addr::new(a, b, c, d)),
            _ => Err(Error::ErrInvalidRdata),
        }
    }

    /// The address of an A record as a dotted quad.
    pub fn rdata_as_address_string(&self) -> Result<String> {
        Ok(self.rdata_as_ipv4()?.to_string())
    }

    pub fn serialize(&self, buf: &mut WireBuffer) -> Result<()> {
        if self.rdata.len() > u16::MAX as usize {
            return Err(Error::ErrResTooLong);
        }

        let class = if self.rrtype == DnsType::Opt.code() {
            self.class.0
        } else if self.cache_flush {
            self.class.0 | CLASS_TOP_BIT
        } else {
            self.class.0
        };

        buf.check_remaining(self.encoded_len())?;
        buf.write_name(&self.name)?;
        buf.write_u16(self.rrtype)?;
        buf.write_u16(class)?;
        buf.write_u32(self.ttl)?;
        buf.write_u16(self.rdata.len() as u16)?;
        buf.write_bytes(&self.rdata)
    }

    pub fn parse(buf: &mut WireBuffer) -> Result<Self> {
        let name = buf.read_name()?;
        let rrtype = buf.read_u16()?;
        let raw_class = buf.read_u16()?;
        let ttl = buf.read_u32()?;
        let length = buf.read_u16()? as usize;

        // OPT records (RFC 6891) carry the UDP payload size in the class field.
        let (class, cache_flush) = if rrtype == DnsType::Opt.code() {
            (DnsClass(raw_class), false)
        } else {
            if raw_class & CLASS_MASK != DNSCLASS_INET.0 {
                return Err(Error::ErrUnsupportedClass(raw_class));
            }
            (DNSCLASS_INET, raw_class & CLASS_TOP_BIT != 0)
        };

        if buf.remaining() < length {
            return Err(Error::ErrBufferUnderflow);
        }
        let start = buf.position();
        let rdata = match DnsType::try_from(rrtype) {
            Ok(DnsType::Ns | DnsType::Cname | DnsType::Ptr | DnsType::Mx | DnsType::Srv) => {
                ResourceBody::read(rrtype, buf, length)?.pack()?
            }
            _ => buf.read_bytes(length)?.to_vec(),
        };
        if buf.position() - start != length {
            return Err(Error::ErrInvalidRdata);
        }

        Ok(Resource {
            name,
            rrtype,
            class,
            cache_flush,
            ttl,
            rdata,
        })
    }
}
