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

use cleanup_protocol::{Record, RecordType};

/// The typed-record sink the cleanup core writes through. Owned by external
/// code (`cleanup_out` / `cleanup_out_format` in the surrounding project);
/// the processor never touches queue-file storage directly.
///
/// An I/O failure here is the one place this crate treats as fatal to the
/// message: the queue file is abandoned along with the rest of the state.
#[async_trait::async_trait]
pub trait RecordSink: Send {
    /// Append a fully-formed record to the queue file.
    async fn emit_record(&mut self, record: &Record) -> std::io::Result<()>;

    /// Append a record built from a type and a string payload. Equivalent
    /// to `emit_record`, kept as a distinct entry point because most
    /// call sites build their payload with `format!` rather than handling
    /// bytes directly.
    async fn emit_formatted_record(&mut self, kind: RecordType, payload: &str) -> std::io::Result<()> {
        self.emit_record(&Record::from_str(kind, payload.to_owned()))
            .await
    }
}

/// An in-memory [`RecordSink`] that appends to a `Vec`, used by tests and by
/// the `vqueue` debugging CLI to print what would have been written.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Every record emitted so far, in order.
    pub records: Vec<Record>,
}

impl VecSink {
    /// Build an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordSink for VecSink {
    async fn emit_record(&mut self, record: &Record) -> std::io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
