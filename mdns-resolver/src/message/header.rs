use std::fmt;

use super::buffer::WireBuffer;
use super::*;
use shared::error::Result;

// Header is a representation of a DNS message header.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub op_code: OpCode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub rcode: RCode,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dnsmessage.Header{{id: {}, response: {}, op_code: {}, authoritative: {}, truncated: {}, recursion_desired: {}, recursion_available: {}, rcode: {} }}",
            self.id,
            self.response,
            self.op_code,
            self.authoritative,
            self.truncated,
            self.recursion_desired,
            self.recursion_available,
            self.rcode
        )
    }
}

impl Header {
    // pack returns the id and the flag word.
    pub(crate) fn pack(&self) -> (u16, u16) {
        let mut bits = ((self.op_code & 0xF) << 11) | (self.rcode as u16 & 0xF);
        if self.recursion_available {
            bits |= HEADER_BIT_RA;
        }
        if self.recursion_desired {
            bits |= HEADER_BIT_RD;
        }
        if self.truncated {
            bits |= HEADER_BIT_TC;
        }
        if self.authoritative {
            bits |= HEADER_BIT_AA;
        }
        if self.response {
            bits |= HEADER_BIT_QR;
        }

        (self.id, bits)
    }

    pub(crate) fn unpack(id: u16, bits: u16) -> Self {
        Header {
            id,
            response: (bits & HEADER_BIT_QR) != 0,
            op_code: (bits >> 11) & 0xF,
            authoritative: (bits & HEADER_BIT_AA) != 0,
            truncated: (bits & HEADER_BIT_TC) != 0,
            recursion_desired: (bits & HEADER_BIT_RD) != 0,
            recursion_available: (bits & HEADER_BIT_RA) != 0,
            rcode: RCode::from((bits & 0xF) as u8),
        }
    }
}

// HeaderInternal is the on-wire header: id, flag word and section counts.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct HeaderInternal {
    pub(crate) id: u16,
    pub(crate) bits: u16,
    pub(crate) questions: u16,
    pub(crate) answers: u16,
    pub(crate) authorities: u16,
    pub(crate) additionals: u16,
}

impl HeaderInternal {
    pub(crate) fn serialize(&self, buf: &mut WireBuffer) -> Result<()> {
        buf.check_remaining(HEADER_LEN)?;
        buf.write_u16(self.id)?;
        buf.write_u16(self.bits)?;
        buf.write_u16(self.questions)?;
        buf.write_u16(self.answers)?;
        buf.write_u16(self.authorities)?;
        buf.write_u16(self.additionals)
    }

    pub(crate) fn parse(buf: &mut WireBuffer) -> Result<Self> {
        Ok(HeaderInternal {
            id: buf.read_u16()?,
            bits: buf.read_u16()?,
            questions: buf.read_u16()?,
            answers: buf.read_u16()?,
            authorities: buf.read_u16()?,
            additionals: buf.read_u16()?,
        })
    }

    pub(crate) fn header(&self) -> Header {
        Header::unpack(self.id, self.bits)
    }
}
