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

//! Envelope ingestion core: the state machine that validates, rewrites and
//! re-emits the envelope segment of a queue file before handing control to
//! the (out of scope) content processor.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod error_mask;
mod processor;
mod rewrite;
mod sink;
mod state;

pub use error_mask::{CleanupFlags, ErrorMask};
pub use processor::{EnvelopeProcessor, ProcessorError};
pub use rewrite::{AddressRewriter, AliasRewriter, IdentityRewriter};
pub use sink::{RecordSink, VecSink};
pub use state::CleanupState;
