use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::message::buffer::WireBuffer;
use crate::message::{DnsType, Name};
use shared::error::{Error, Result};

// A TXT character-string is at most 255 bytes.
const TXT_STRING_LEN: usize = 255;

/// Typed view of resource record data.
///
/// The resolver only acts on [`ResourceBody::A`]; the other variants let
/// callers inspect the rest of an mDNS response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceBody {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(Name),
    Cname(Name),
    Ptr(Name),
    Mx {
        preference: u16,
        exchange: Name,
    },
    Txt(Vec<String>),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    Unknown(Vec<u8>),
}

impl fmt::Display for ResourceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceBody::A(a) => write!(f, "{a}"),
            ResourceBody::Aaaa(a) => write!(f, "{a}"),
            ResourceBody::Ns(n) | ResourceBody::Cname(n) | ResourceBody::Ptr(n) => {
                write!(f, "{n}")
            }
            ResourceBody::Mx {
                preference,
                exchange,
            } => write!(f, "{preference} {exchange}"),
            ResourceBody::Txt(txt) => {
                let v: Vec<String> = txt.iter().map(|s| format!("{s:?}")).collect();
                write!(f, "{}", v.join(" "))
            }
            ResourceBody::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            ResourceBody::Unknown(data) => write!(f, "{} bytes", data.len()),
        }
    }
}

impl ResourceBody {
    /// The record type this data belongs to, `None` for opaque data.
    pub fn real_type(&self) -> Option<DnsType> {
        Some(match self {
            ResourceBody::A(_) => DnsType::A,
            ResourceBody::Aaaa(_) => DnsType::Aaaa,
            ResourceBody::Ns(_) => DnsType::Ns,
            ResourceBody::Cname(_) => DnsType::Cname,
            ResourceBody::Ptr(_) => DnsType::Ptr,
            ResourceBody::Mx { .. } => DnsType::Mx,
            ResourceBody::Txt(_) => DnsType::Txt,
            ResourceBody::Srv { .. } => DnsType::Srv,
            ResourceBody::Unknown(_) => return None,
        })
    }

    fn encoded_len(&self) -> usize {
        match self {
            ResourceBody::A(_) => 4,
            ResourceBody::Aaaa(_) => 16,
            ResourceBody::Ns(n) | ResourceBody::Cname(n) | ResourceBody::Ptr(n) => {
                n.encoded_len()
            }
            ResourceBody::Mx { exchange, .. } => 2 + exchange.encoded_len(),
            // An empty TXT record still holds one empty string (RFC 6763 section 6.1).
            ResourceBody::Txt(txt) if txt.is_empty() => 1,
            ResourceBody::Txt(txt) => txt.iter().map(|s| s.len() + 1).sum(),
            ResourceBody::Srv { target, .. } => 6 + target.encoded_len(),
            ResourceBody::Unknown(data) => data.len(),
        }
    }

    /// Encodes the data without name compression.
    pub(crate) fn pack(&self) -> Result<Vec<u8>> {
        let mut buf = WireBuffer::with_capacity(self.encoded_len());
        match self {
            ResourceBody::A(a) => buf.write_bytes(&a.octets())?,
            ResourceBody::Aaaa(a) => buf.write_bytes(&a.octets())?,
            ResourceBody::Ns(n) | ResourceBody::Cname(n) | ResourceBody::Ptr(n) => {
                buf.write_name(n)?
            }
            ResourceBody::Mx {
                preference,
                exchange,
            } => {
                buf.write_u16(*preference)?;
                buf.write_name(exchange)?;
            }
            ResourceBody::Txt(txt) => {
                if txt.is_empty() {
                    buf.write_u8(0)?;
                }
                for s in txt {
                    if s.len() > TXT_STRING_LEN {
                        return Err(Error::ErrInvalidRdata);
                    }
                    buf.write_u8(s.len() as u8)?;
                    buf.write_bytes(s.as_bytes())?;
                }
            }
            ResourceBody::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                buf.write_u16(*priority)?;
                buf.write_u16(*weight)?;
                buf.write_u16(*port)?;
                buf.write_name(target)?;
            }
            ResourceBody::Unknown(data) => buf.write_bytes(data)?,
        }
        Ok(buf.into_bytes())
    }

    /// Reads `length` bytes of data for a record of type `rrtype`,
    /// following name compression pointers through `buf`.
    pub(crate) fn read(rrtype: u16, buf: &mut WireBuffer, length: usize) -> Result<Self> {
        let typ = match DnsType::try_from(rrtype) {
            Ok(typ) => typ,
            Err(_) => return Ok(ResourceBody::Unknown(buf.read_bytes(length)?.to_vec())),
        };

        Ok(match typ {
            DnsType::A => {
                if length != 4 {
                    return Err(Error::ErrInvalidRdata);
                }
                let b = buf.read_bytes(4)?;
                ResourceBody::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            DnsType::Aaaa => {
                if length != 16 {
                    return Err(Error::ErrInvalidRdata);
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(buf.read_bytes(16)?);
                ResourceBody::Aaaa(Ipv6Addr::from(octets))
            }
            DnsType::Ns => ResourceBody::Ns(buf.read_name()?),
            DnsType::Cname => ResourceBody::Cname(buf.read_name()?),
            DnsType::Ptr => ResourceBody::Ptr(buf.read_name()?),
            DnsType::Mx => ResourceBody::Mx {
                preference: buf.read_u16()?,
                exchange: buf.read_name()?,
            },
            DnsType::Txt => {
                let end = buf.position() + length;
                let mut txt = vec![];
                while buf.position() < end {
                    let len = buf.read_u8()? as usize;
                    txt.push(String::from_utf8_lossy(buf.read_bytes(len)?).into_owned());
                }
                if buf.position() != end {
                    return Err(Error::ErrInvalidRdata);
                }
                if txt.len() == 1 && txt[0].is_empty() {
                    txt.clear();
                }
                ResourceBody::Txt(txt)
            }
            DnsType::Srv => ResourceBody::Srv {
                priority: buf.read_u16()?,
                weight: buf.read_u16()?,
                port: buf.read_u16()?,
                target: buf.read_name()?,
            },
            _ => ResourceBody::Unknown(buf.read_bytes(length)?.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn test_srv_body() {
        let body = ResourceBody::Srv {
            priority: 0,
            weight: 5,
            port: 631,
            target: name("printer.local."),
        };
        let data = body.pack().unwrap();
        assert_eq!(&data[..6], &[0, 0, 0, 5, 0x02, 0x77]);
        assert_eq!(data.len(), 6 + 15);

        let mut buf = WireBuffer::from_bytes(&data);
        assert_eq!(
            ResourceBody::read(DnsType::Srv.code(), &mut buf, data.len()).unwrap(),
            body
        );
        assert_eq!(body.to_string(), "0 5 631 printer.local.");
    }

    #[test]
    fn test_ptr_body() {
        let body = ResourceBody::Ptr(name("printer._ipp._tcp.local."));
        let data = body.pack().unwrap();
        let mut buf = WireBuffer::from_bytes(&data);
        assert_eq!(
            ResourceBody::read(DnsType::Ptr.code(), &mut buf, data.len()).unwrap(),
            body
        );
        assert_eq!(body.real_type(), Some(DnsType::Ptr));
    }

    #[test]
    fn test_txt_body() {
        let body = ResourceBody::Txt(vec!["txtvers=1".to_owned(), "rp=ipp/print".to_owned()]);
        let data = body.pack().unwrap();
        assert_eq!(data[0], 9);
        assert_eq!(data.len(), 10 + 13);

        let mut buf = WireBuffer::from_bytes(&data);
        assert_eq!(
            ResourceBody::read(DnsType::Txt.code(), &mut buf, data.len()).unwrap(),
            body
        );
    }

    #[test]
    fn test_txt_body_empty() {
        let body = ResourceBody::Txt(vec![]);
        let data = body.pack().unwrap();
        assert_eq!(data, vec![0]);

        let mut buf = WireBuffer::from_bytes(&data);
        assert_eq!(
            ResourceBody::read(DnsType::Txt.code(), &mut buf, 1).unwrap(),
            body
        );
    }

    #[test]
    fn test_txt_string_too_long() {
        let body = ResourceBody::Txt(vec!["x".repeat(256)]);
        assert_eq!(body.pack(), Err(Error::ErrInvalidRdata));
    }

    #[test]
    fn test_txt_overrun() {
        // The string length claims more than the record holds.
        let mut buf = WireBuffer::from_bytes(&[3, b'a', b'b', b'c']);
        assert_eq!(
            ResourceBody::read(DnsType::Txt.code(), &mut buf, 2),
            Err(Error::ErrInvalidRdata)
        );
    }

    #[test]
    fn test_a_body_wrong_length() {
        let mut buf = WireBuffer::from_bytes(&[192, 168, 1]);
        assert_eq!(
            ResourceBody::read(DnsType::A.code(), &mut buf, 3),
            Err(Error::ErrInvalidRdata)
        );
    }

    #[test]
    fn test_unknown_body() {
        let mut buf = WireBuffer::from_bytes(&[1, 2, 3]);
        let body = ResourceBody::read(65280, &mut buf, 3).unwrap();
        assert_eq!(body, ResourceBody::Unknown(vec![1, 2, 3]));
        assert_eq!(body.real_type(), None);
        assert_eq!(body.pack().unwrap(), vec![1, 2, 3]);
    }
}
