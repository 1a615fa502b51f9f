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

use crate::{varint, Error, Record, RecordType, Result};
use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;

/// Reads `(type, varint-length, payload)` records off an async byte stream.
///
/// Mirrors the windowed-buffer approach of the SMTP command reader: bytes
/// accumulate in `buffer` until a complete record is available, so a single
/// `read` syscall can satisfy several queued records.
pub struct Reader<R: tokio::io::AsyncRead + Unpin + Send> {
    inner: R,
    buffer: BytesMut,
    max_payload: usize,
}

impl<R: tokio::io::AsyncRead + Unpin + Send> Reader<R> {
    /// Default cap on a single record's payload, well above any realistic
    /// envelope field but still bounded so a hostile stream cannot force
    /// unbounded buffering.
    pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

    /// Wrap an async reader with the default payload cap.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self::with_max_payload(inner, Self::DEFAULT_MAX_PAYLOAD)
    }

    /// Wrap an async reader with an explicit payload cap.
    #[must_use]
    pub fn with_max_payload(inner: R, max_payload: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(256),
            max_payload,
        }
    }

    async fn fill(&mut self, want: usize) -> Result<bool> {
        while self.buffer.len() < want {
            self.buffer.reserve(want - self.buffer.len());
            if self.inner.read_buf(&mut self.buffer).await? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Read the next record, or `None` at a clean end-of-stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the stream ends mid-record,
    /// [`Error::BadLength`] if the length prefix cannot be decoded, and
    /// [`Error::PayloadTooLong`] if the declared payload exceeds the
    /// configured cap.
    pub async fn read_record(&mut self) -> Result<Option<Record>> {
        if !self.fill(1).await? {
            return Ok(None);
        }
        let tag = self.buffer[0];
        let kind = RecordType::from_tag(tag).ok_or(Error::UnknownType(tag))?;

        // Grow the window until a full varint is buffered, or bail if the
        // stream runs out mid-prefix.
        let len = loop {
            if let Some((len, consumed)) = varint::decode(&self.buffer[1..]) {
                self.buffer.advance(1 + consumed);
                break len as usize;
            }
            if self.buffer.len() >= 1 + varint::MAX_ENCODED_LEN {
                return Err(Error::BadLength);
            }
            if !self.fill(self.buffer.len() + 1).await? {
                return Err(Error::Truncated);
            }
        };

        if len > self.max_payload {
            return Err(Error::PayloadTooLong {
                expected: self.max_payload,
                got: len,
            });
        }

        if !self.fill(len).await? {
            return Err(Error::Truncated);
        }
        let payload = self.buffer.split_to(len).to_vec();

        tracing::trace!(kind = %kind, len, "envelope record >> ");
        Ok(Some(Record::new(kind, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    async fn round_trip(records: &[Record]) -> Vec<Record> {
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(&mut buf);
            for record in records {
                writer.write_record(record).await.unwrap();
            }
        }
        let mut reader = Reader::new(buf.as_slice());
        let mut out = Vec::new();
        while let Some(record) = reader.read_record().await.unwrap() {
            out.push(record);
        }
        out
    }

    #[tokio::test]
    async fn reads_back_what_was_written() {
        let records = vec![
            Record::from_str(RecordType::Time, "1700000000"),
            Record::from_str(RecordType::From, "alice@example"),
            Record::from_str(RecordType::Rcpt, "bob@example"),
            Record::from_str(RecordType::Mesg, ""),
        ];
        assert_eq!(round_trip(&records).await, records);
    }

    #[tokio::test]
    async fn truncated_length_prefix_errors() {
        // tag byte, then a continuation byte that never terminates.
        let buf = [RecordType::Time.tag(), 0x80];
        let mut reader = Reader::new(&buf[..]);
        assert!(matches!(
            reader.read_record().await,
            Err(Error::Truncated)
        ));
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(&mut buf);
            writer
                .write_record(&Record::from_str(RecordType::Attr, "k=".to_owned() + &"v".repeat(100)))
                .await
                .unwrap();
        }
        let mut reader = Reader::with_max_payload(buf.as_slice(), 16);
        assert!(matches!(
            reader.read_record().await,
            Err(Error::PayloadTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let mut reader = Reader::new(&b""[..]);
        assert_eq!(reader.read_record().await.unwrap(), None);
    }
}
