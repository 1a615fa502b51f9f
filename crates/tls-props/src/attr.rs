/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

use cleanup_protocol::varint;

/// Errors raised while scanning an attribute bundle off the wire.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer ended before a field's value was fully read.
    #[error("truncated attribute stream")]
    Truncated,
    /// A length-prefixed string was not valid UTF-8.
    #[error("{0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// The bundle did not carry the expected number of fields for its
    /// schema version.
    #[error("expected {expected} fields, got {got}")]
    FieldCountMismatch {
        /// Number of fields the current schema defines.
        expected: usize,
        /// Number of fields actually present.
        got: usize,
    },
}

/// Result alias for attribute marshaling.
pub type Result<T> = std::result::Result<T, Error>;

/// Appends typed fields to an in-memory buffer in schema order.
///
/// Mirrors `attr_print`'s `SEND_ATTR_*` call chain: each call appends one
/// field; there is no random access and no field may be skipped, so the
/// writer and its matching [`AttrReader`] stay in lockstep purely by call
/// order.
#[derive(Debug, Default)]
pub struct AttrWriter {
    buf: Vec<u8>,
    fields: usize,
}

impl AttrWriter {
    /// Start an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a signed integer field.
    pub fn write_int(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.fields += 1;
        self
    }

    /// Append a string field. Absent optional strings must be passed as
    /// `""`, not skipped: the wire format has no concept of a missing
    /// field, only an empty one.
    pub fn write_str(&mut self, value: &str) -> &mut Self {
        #[allow(clippy::cast_possible_truncation)]
        varint::encode(value.len() as u32, &mut self.buf);
        self.buf.extend_from_slice(value.as_bytes());
        self.fields += 1;
        self
    }

    /// Append a nested variable-length array of strings, via a recursive
    /// call into the same writer — the match-argv field's shape.
    pub fn write_list(&mut self, values: &[String]) -> &mut Self {
        #[allow(clippy::cast_possible_truncation)]
        varint::encode(values.len() as u32, &mut self.buf);
        for value in values {
            self.write_str(value);
        }
        self.fields += 1;
        self
    }

    /// Number of top-level fields written so far (a nested list counts as
    /// one field, matching the schema's field-count versioning rule).
    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.fields
    }

    /// Consume the writer, returning the encoded bundle.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads fields back out of a buffer written by [`AttrWriter`], in the same
/// order they were written.
pub struct AttrReader<'a> {
    buf: &'a [u8],
    fields: usize,
}

impl<'a> AttrReader<'a> {
    /// Wrap a buffer for sequential field reads.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, fields: 0 }
    }

    /// Read the next signed integer field.
    pub fn read_int(&mut self) -> Result<i64> {
        const WIDTH: usize = std::mem::size_of::<i64>();
        if self.buf.len() < WIDTH {
            return Err(Error::Truncated);
        }
        let (head, tail) = self.buf.split_at(WIDTH);
        self.buf = tail;
        self.fields += 1;
        Ok(i64::from_le_bytes(head.try_into().expect("checked width")))
    }

    /// Read the next string field.
    pub fn read_str(&mut self) -> Result<String> {
        let (len, consumed) = varint::decode(self.buf).ok_or(Error::Truncated)?;
        let len = len as usize;
        if self.buf.len() < consumed + len {
            return Err(Error::Truncated);
        }
        let bytes = self.buf[consumed..consumed + len].to_vec();
        self.buf = &self.buf[consumed + len..];
        self.fields += 1;
        Ok(String::from_utf8(bytes)?)
    }

    /// Read the next nested array-of-strings field.
    pub fn read_list(&mut self) -> Result<Vec<String>> {
        let (count, consumed) = varint::decode(self.buf).ok_or(Error::Truncated)?;
        self.buf = &self.buf[consumed..];
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(self.read_str()?);
        }
        self.fields += 1;
        Ok(out)
    }

    /// Number of top-level fields consumed so far.
    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.fields
    }

    /// Assert that exactly `expected` fields were read, the schema's
    /// version-by-field-count check.
    pub fn finish(self, expected: usize) -> Result<()> {
        if self.fields != expected {
            return Err(Error::FieldCountMismatch {
                expected,
                got: self.fields,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut writer = AttrWriter::new();
        writer.write_int(30).write_str("").write_list(&["a".into(), "b".into(), "c".into()]);
        let bytes = writer.into_bytes();

        let mut reader = AttrReader::new(&bytes);
        assert_eq!(reader.read_int().unwrap(), 30);
        assert_eq!(reader.read_str().unwrap(), "");
        assert_eq!(reader.read_list().unwrap(), vec!["a", "b", "c"]);
        reader.finish(3).unwrap();
    }

    #[test]
    fn field_count_mismatch_is_reported() {
        let mut writer = AttrWriter::new();
        writer.write_int(1);
        let bytes = writer.into_bytes();
        let mut reader = AttrReader::new(&bytes);
        reader.read_int().unwrap();
        assert!(matches!(
            reader.finish(2),
            Err(Error::FieldCountMismatch { expected: 2, got: 1 })
        ));
    }
}
