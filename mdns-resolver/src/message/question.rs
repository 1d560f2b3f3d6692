use std::fmt;

use super::buffer::WireBuffer;
use super::*;
use shared::error::{Error, Result};

/// A question is a DNS query.
///
/// In mDNS the top bit of the class field asks for a unicast response
/// ("QU"); a question without it is a plain multicast question ("QM").
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Question {
    pub name: Name,
    pub typ: DnsType,
    pub unicast_response: bool,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}? {} ({})",
            self.typ,
            self.name,
            if self.unicast_response { "QU" } else { "QM" }
        )
    }
}

impl Question {
    pub fn new(name: Name, typ: DnsType, unicast_response: bool) -> Self {
        Question {
            name,
            typ,
            unicast_response,
        }
    }

    /// The class field as it goes on the wire.
    pub fn class(&self) -> u16 {
        let mut class = DNSCLASS_INET.0;
        if self.unicast_response {
            class |= CLASS_TOP_BIT;
        }
        class
    }

    /// Bytes written by [`Question::serialize`] when the name is not
    /// compressed: the name, then 2 bytes of type and 2 bytes of class.
    pub fn encoded_len(&self) -> usize {
        self.name.encoded_len() + UINT16LEN * 2
    }

    pub fn serialize(&self, buf: &mut WireBuffer) -> Result<()> {
        buf.check_remaining(self.encoded_len())?;
        buf.write_name(&self.name)?;
        buf.write_u16(self.typ.code())?;
        buf.write_u16(self.class())
    }

    pub fn parse(buf: &mut WireBuffer) -> Result<Self> {
        let name = buf.read_name()?;
        let typ = DnsType::try_from(buf.read_u16()?)?;
        let class = buf.read_u16()?;
        if class & CLASS_MASK != DNSCLASS_INET.0 {
            return Err(Error::ErrUnsupportedClass(class));
        }

        Ok(Question {
            name,
            typ,
            unicast_response: class & CLASS_TOP_BIT != 0,
        })
    }
}
