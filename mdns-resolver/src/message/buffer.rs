use std::collections::HashMap;

use bytes::Bytes;

use super::name::{NAME_LEN, Name};
use shared::error::{Error, Result};

// Top two bits of a length octet.
const LABEL_TYPE_MASK: u8 = 0xC0;
const LABEL_TYPE_NORMAL: u8 = 0x00;
const LABEL_TYPE_POINTER: u8 = 0xC0;

// Pointers carry a 14-bit offset.
const POINTER_OFFSET_MAX: usize = 0x3FFF;
const POINTER_BITS: u16 = 0xC000;

/// Cursor-based reader/writer over a fixed byte region.
///
/// The buffer tracks a read cursor, a write cursor and the end of valid
/// data. Reads never go past the valid data and writes never go past the
/// capacity; both fail with a decode error instead.
///
/// Names written through [`WireBuffer::write_name`] are remembered so a later
/// name sharing a suffix is compressed into a pointer (RFC 1035 section 4.1.4).
#[derive(Debug)]
pub struct WireBuffer {
    data: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
    limit: usize,
    compression: HashMap<Vec<Bytes>, u16>,
}

impl WireBuffer {
    /// Creates an empty buffer able to hold `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        WireBuffer {
            data: vec![0; capacity],
            read_pos: 0,
            write_pos: 0,
            limit: 0,
            compression: HashMap::new(),
        }
    }

    /// Creates a buffer holding a copy of `bytes`, ready for reading.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        WireBuffer {
            data: bytes.to_vec(),
            read_pos: 0,
            write_pos: bytes.len(),
            limit: bytes.len(),
            compression: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current read cursor.
    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.limit - self.read_pos
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.write_pos
    }

    /// Consumes the buffer, returning the valid bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.truncate(self.limit);
        self.data
    }

    /// Fails with [`Error::ErrBufferOverflow`] if fewer than `n` bytes of
    /// capacity remain for writing.
    pub fn check_remaining(&self, n: usize) -> Result<()> {
        if self.data.len() - self.write_pos < n {
            return Err(Error::ErrBufferOverflow);
        }
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_bytes(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_bytes(&v.to_be_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_bytes(&v.to_be_bytes())
    }

    pub fn write_bytes(&mut self, b: &[u8]) -> Result<()> {
        self.check_remaining(b.len())?;
        self.data[self.write_pos..self.write_pos + b.len()].copy_from_slice(b);
        self.write_pos += b.len();
        self.limit = self.limit.max(self.write_pos);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(Error::ErrBufferUnderflow);
        }
        let start = self.read_pos;
        self.read_pos += n;
        Ok(&self.data[start..start + n])
    }

    /// Writes `name`, replacing the longest suffix already present in the
    /// buffer with a pointer to it.
    pub fn write_name(&mut self, name: &Name) -> Result<()> {
        if name.encoded_len() > NAME_LEN {
            return Err(Error::ErrNameTooLong);
        }

        let labels = name.labels();
        for i in 0..labels.len() {
            let suffix = &labels[i..];
            if let Some(&ptr) = self.compression.get(suffix) {
                return self.write_u16(POINTER_BITS | ptr);
            }

            let label = &labels[i];
            if label.is_empty() {
                return Err(Error::ErrZeroSegLen);
            }
            if label.len() > super::name::SEGMENT_LEN {
                return Err(Error::ErrSegTooLong);
            }

            let off = self.write_pos;
            self.write_u8(label.len() as u8)?;
            self.write_bytes(label)?;
            if off <= POINTER_OFFSET_MAX {
                self.compression.insert(suffix.to_vec(), off as u16);
            }
        }

        self.write_u8(0)
    }

    /// Reads a possibly compressed name.
    ///
    /// The read cursor ends up right after the name as it appears at the
    /// current position, i.e. after the first pointer if there is one.
    /// Every pointer must target an offset before the label run containing
    /// it, which rules out loops and forward references.
    pub fn read_name(&mut self) -> Result<Name> {
        let mut labels: Vec<Bytes> = vec![];
        let mut pos = self.read_pos;
        let mut run_start = pos;
        let mut resume: Option<usize> = None;
        let mut name_len = 1;

        loop {
            let c = self.byte_at(pos)?;
            match c & LABEL_TYPE_MASK {
                LABEL_TYPE_NORMAL => {
                    pos += 1;
                    if c == 0 {
                        break;
                    }
                    let len = c as usize;
                    if self.limit - pos < len {
                        return Err(Error::ErrBufferUnderflow);
                    }
                    name_len += len + 1;
                    if name_len > NAME_LEN {
                        return Err(Error::ErrNameTooLong);
                    }
                    labels.push(Bytes::copy_from_slice(&self.data[pos..pos + len]));
                    pos += len;
                }
                LABEL_TYPE_POINTER => {
                    let lo = self.byte_at(pos + 1)?;
                    let target = (((c & !LABEL_TYPE_MASK) as usize) << 8) | lo as usize;
                    if target >= run_start {
                        return Err(Error::ErrInvalidPointer);
                    }
                    if resume.is_none() {
                        resume = Some(pos + 2);
                    }
                    pos = target;
                    run_start = target;
                }
                _ => return Err(Error::ErrReservedLabelType),
            }
        }

        self.read_pos = resume.unwrap_or(pos);
        Ok(Name::from_labels(labels))
    }

    fn byte_at(&self, pos: usize) -> Result<u8> {
        if pos >= self.limit {
            return Err(Error::ErrBufferUnderflow);
        }
        Ok(self.data[pos])
    }
}
