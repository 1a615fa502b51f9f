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

use crate::{CleanupFlags, ErrorMask};
use indexmap::IndexMap;

/// The per-message state owned exclusively by one processing pipeline.
///
/// `CleanupState` owns every heap string it holds; a [`crate::RecordSink`]
/// or [`crate::AddressRewriter`] only ever borrows them for the duration of
/// a call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CleanupState {
    /// Opaque identifier used only for diagnostics.
    pub queue_id: String,
    /// Bitmask of active cleanup options.
    pub flags: CleanupFlags,
    /// Accumulated error kinds. Never cleared once set.
    pub errs: ErrorMask,
    /// Message arrival timestamp, seconds since epoch.
    pub time: Option<i64>,
    /// Scheduled delay-warning timestamp.
    pub warn_time: Option<i64>,
    /// Canonicalized envelope sender.
    pub sender: Option<String>,
    /// RFC-822 full name of the sender.
    pub fullname: Option<String>,
    /// Pending "original recipient" label, bound to the next `Rcpt` record.
    pub orig_rcpt: Option<String>,
    /// Ordered, size-capped `name -> value` attribute mapping.
    pub attr: IndexMap<String, String>,
    /// Number of recipients accepted so far, for diagnostics and the size
    /// slot's recipient-count field.
    pub recipient_count: u64,
}

impl CleanupState {
    /// Construct a fresh state for a message identified by `queue_id`.
    #[must_use]
    pub fn new(queue_id: impl Into<String>) -> Self {
        Self {
            queue_id: queue_id.into(),
            flags: CleanupFlags::empty(),
            errs: ErrorMask::empty(),
            time: None,
            warn_time: None,
            sender: None,
            fullname: None,
            orig_rcpt: None,
            attr: IndexMap::new(),
            recipient_count: 0,
        }
    }

    /// Whether the envelope, as processed so far, is free of errors.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errs.is_empty()
    }

    /// OR a bit into the accumulated error mask. Never clears a bit.
    pub fn mark(&mut self, bit: ErrorMask) {
        self.errs |= bit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_clean() {
        let state = CleanupState::new("A1B2C3");
        assert!(state.is_clean());
        assert!(state.sender.is_none());
        assert!(state.time.is_none());
        assert!(state.attr.is_empty());
    }

    #[test]
    fn mark_is_monotonic() {
        let mut state = CleanupState::new("A1B2C3");
        state.mark(ErrorMask::BAD);
        state.mark(ErrorMask::WRITE);
        assert!(state.errs.contains(ErrorMask::BAD));
        assert!(state.errs.contains(ErrorMask::WRITE));
    }
}
