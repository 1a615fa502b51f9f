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

bitflags::bitflags! {
    /// Accumulated error kinds. Bits are OR-ed in as records are rejected
    /// and are never cleared; `errs == 0` after the envelope segment is the
    /// sole "accepted cleanly" signal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ErrorMask: u32 {
        /// Protocol or structural violation: missing sender/time, duplicate
        /// sender, unknown record type, negative warn-time, attribute limit
        /// exceeded, bad VERP, malformed attribute.
        const BAD = 0b0001;
        /// Message exceeds the configured size limit.
        const SIZE = 0b0010;
        /// Sink I/O failure.
        const WRITE = 0b0100;
        /// Reserved for content-phase errors; never set by this crate.
        const CONTENT = 0b1000;
    }
}

bitflags::bitflags! {
    /// Bitmask of active cleanup options, OR-updated by `FLGS` records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CleanupFlags: u32 {
        /// Placeholder bit reserved for the first extra-flag extension.
        const EXTRA_0 = 0b0001;
        /// Placeholder bit reserved for the second extra-flag extension.
        const EXTRA_1 = 0b0010;
    }
}
