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

//! Wire format for the queue-file record stream consumed by the cleanup
//! envelope processor: self-delimiting `(type, varint-length, payload)`
//! records over a byte stream.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod error;
mod reader;
mod record;
mod writer;

/// LEB128 varint framing, reused by [`tls-props`](../tls_props/index.html)
/// for its attribute marshaling — the queue-file protocol's sibling
/// discipline shares this primitive rather than reimplementing it.
pub mod varint;

pub use error::{Error, Result};
pub use reader::Reader;
pub use record::{size_slot, Record, RecordType};
pub use writer::Writer;
