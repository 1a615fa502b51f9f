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

/// Errors raised while framing or parsing the record stream.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The stream ended in the middle of a record.
    #[error("truncated record stream")]
    Truncated,
    /// The record's length prefix could not be decoded.
    #[error("malformed varint length prefix")]
    BadLength,
    /// The record's payload exceeded the configured maximum.
    #[error("record payload of {got} bytes exceeds the {expected}-byte limit")]
    PayloadTooLong {
        /// Configured limit.
        expected: usize,
        /// Actual payload size.
        got: usize,
    },
    /// The type tag byte is not one of the closed set of record types.
    #[error("unknown record type tag {0:#04x}")]
    UnknownType(u8),
    /// The peer sent `*` to abandon an in-progress exchange.
    ///
    /// Distinct from [`Error::ResponseTooLong`]: this is a deliberate client
    /// abort, not truncation.
    #[error("client aborted the exchange")]
    ClientAbort,
    /// A peer response exceeded the maximum accepted length.
    ///
    /// Named separately from [`Error::ClientAbort`] so that callers do not
    /// conflate "the client gave up" with "we refused to buffer more".
    #[error("response of {got} bytes exceeds the {expected}-byte limit")]
    ResponseTooLong {
        /// Configured limit.
        expected: usize,
        /// Actual response size.
        got: usize,
    },
}

/// Convenience alias for fallible protocol operations.
pub type Result<T> = std::result::Result<T, Error>;
