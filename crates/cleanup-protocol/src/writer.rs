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

use crate::{varint, Error, Record, Result};
use tokio::io::AsyncWriteExt;

/// Appends records to a queue-file-shaped byte sink.
#[allow(clippy::module_name_repetitions)]
pub struct Writer<W: tokio::io::AsyncWrite + Unpin + Send> {
    inner: W,
}

impl<W: tokio::io::AsyncWrite + Unpin + Send> Writer<W> {
    /// Wrap an async writer.
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consume the writer, returning the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Emit one record: type tag, varint payload length, payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on a write failure.
    pub async fn write_record(&mut self, record: &Record) -> Result<()> {
        tracing::trace!(kind = %record.kind, len = record.len(), "<< record");

        let mut framed = Vec::with_capacity(1 + varint::MAX_ENCODED_LEN + record.len());
        framed.push(record.kind.tag());
        #[allow(clippy::cast_possible_truncation)]
        varint::encode(record.len() as u32, &mut framed);
        framed.extend_from_slice(&record.payload);

        self.inner.write_all(&framed).await.map_err(Error::Io)
    }

    /// Flush any buffered writes to the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on a flush failure.
    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await.map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordType;

    #[tokio::test]
    async fn writes_tag_length_payload() {
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(&mut buf);
            writer
                .write_record(&Record::from_str(RecordType::Time, "1700000000"))
                .await
                .unwrap();
        }
        assert_eq!(buf[0], RecordType::Time.tag());
        assert_eq!(buf[1] as usize, "1700000000".len());
        assert_eq!(&buf[2..], b"1700000000");
    }
}
