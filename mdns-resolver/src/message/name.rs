use std::fmt;

use bytes::Bytes;
use shared::error::{Error, Result};

// Maximum encoded length of a name, including length octets and the root label.
pub(crate) const NAME_LEN: usize = 255;

// Maximum length of a single label.
pub(crate) const SEGMENT_LEN: usize = 63;

/// A domain name such as `"printer.local"`.
///
/// Labels are kept as raw bytes, exactly as they appear on the wire, so a
/// label may contain a dot or bytes that are not UTF-8 (DNS-SD instance
/// names such as `HP M401 (B2.C3)` do). Names compare equal label by label,
/// ignoring ASCII case.
///
/// The presentation form (`Display`, [`Name::new`]) always ends in a dot and
/// escapes `.` and `\` inside a label with a backslash, and any other byte
/// outside printable ASCII as `\DDD`.
#[derive(Clone, Debug, Default, Eq)]
pub struct Name {
    labels: Vec<Bytes>,
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        labels_eq(&self.labels, &other.labels)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for label in &self.labels {
            for &b in label.iter() {
                match b {
                    b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x20..=0x7E => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{b:03}")?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl Name {
    /// Creates a validated name from its presentation form.
    ///
    /// A single trailing dot is optional and `""` or `"."` is the root.
    /// Fails with [`Error::ErrZeroSegLen`] on an empty label, with
    /// [`Error::ErrSegTooLong`] on a label over 63 bytes, with
    /// [`Error::ErrNameTooLong`] when the encoded form exceeds 255 bytes and
    /// with [`Error::ErrInvalidEscape`] on a malformed `\` sequence.
    ///
    /// ```rust
    /// use mdns_resolver::message::Name;
    ///
    /// let name = Name::new("printer.local").unwrap();
    /// assert_eq!(name, Name::new("PRINTER.LOCAL.").unwrap());
    /// assert_eq!(name.encoded_len(), 15);
    ///
    /// let instance = Name::new(r"HP M401 (B2\.C3)._ipp._tcp.local").unwrap();
    /// assert_eq!(instance.labels()[0].as_ref(), b"HP M401 (B2.C3)");
    /// ```
    pub fn new(data: &str) -> Result<Self> {
        let s = data.as_bytes();
        let s = if s == b"." { &s[..0] } else { s };

        let mut labels = vec![];
        let mut label = Vec::new();
        let mut i = 0;
        while i < s.len() {
            match s[i] {
                b'.' => {
                    push_label(&mut labels, std::mem::take(&mut label))?;
                }
                b'\\' => match s.get(i + 1..i + 4) {
                    Some(d) if d.iter().all(u8::is_ascii_digit) => {
                        let v = d
                            .iter()
                            .fold(0u16, |acc, c| acc * 10 + u16::from(c - b'0'));
                        label.push(u8::try_from(v).map_err(|_| Error::ErrInvalidEscape)?);
                        i += 3;
                    }
                    _ => {
                        label.push(*s.get(i + 1).ok_or(Error::ErrInvalidEscape)?);
                        i += 1;
                    }
                },
                b => label.push(b),
            }
            i += 1;
        }
        if !label.is_empty() {
            push_label(&mut labels, label)?;
        }

        let name = Name { labels };
        if name.encoded_len() > NAME_LEN {
            return Err(Error::ErrNameTooLong);
        }
        Ok(name)
    }

    // Builds a name from labels read off the wire; the caller has already
    // enforced the length limits.
    pub(crate) fn from_labels(labels: Vec<Bytes>) -> Self {
        Name { labels }
    }

    /// Returns true for the root name (`"."`).
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// The raw labels of the name, without the root label.
    pub fn labels(&self) -> &[Bytes] {
        &self.labels
    }

    /// Number of bytes the name occupies on the wire without compression,
    /// including the terminating root label.
    pub fn encoded_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }
}

fn push_label(labels: &mut Vec<Bytes>, label: Vec<u8>) -> Result<()> {
    if label.is_empty() {
        return Err(Error::ErrZeroSegLen);
    }
    if label.len() > SEGMENT_LEN {
        return Err(Error::ErrSegTooLong);
    }
    labels.push(Bytes::from(label));
    Ok(())
}

/// Label-wise comparison ignoring ASCII case.
pub(crate) fn labels_eq(a: &[Bytes], b: &[Bytes]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}
