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

//! Structured attribute bundles exchanged across the local IPC boundary
//! between the mail daemon and its TLS helper process. Each bundle is a
//! flat, ordered sequence of typed fields; the receiver validates the
//! bundle by field count rather than by an explicit version tag, so
//! adding a field to one side without the other is caught immediately
//! instead of silently misreading the stream.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod attr;
mod client_start;
mod server_init;

pub use attr::{AttrReader, AttrWriter, Error, Result};
pub use client_start::{ClientStartProps, CLIENT_START_FIELD_COUNT};
pub use server_init::{ServerInitProps, SERVER_INIT_FIELD_COUNT};
