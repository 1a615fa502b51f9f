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

/// Closed set of record types carried by the queue-file stream.
///
/// `Mesg` is the content-segment boundary marker; everything else belongs
/// to the envelope segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordType {
    /// Size/count placeholder, rewritten in place once the message is fully queued.
    Size,
    /// Message arrival timestamp.
    Time,
    /// RFC-822 full name of the sender.
    Full,
    /// Envelope sender.
    From,
    /// Envelope recipient.
    Rcpt,
    /// Acknowledgement marker, carries no state.
    Done,
    /// Scheduled delay-warning timestamp.
    Warn,
    /// Variable Envelope Return Path delimiters.
    Verp,
    /// `name=value` queue-file attribute.
    Attr,
    /// Original recipient, pending attachment to the next `Rcpt`.
    Orcp,
    /// Extra cleanup option bitmask.
    Flgs,
    /// Envelope-to-content boundary.
    Mesg,
}

impl RecordType {
    /// Single-byte wire tag for this record type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Size => b'C',
            Self::Time => b'T',
            Self::Full => b'N',
            Self::From => b'F',
            Self::Rcpt => b'R',
            Self::Done => b'D',
            Self::Warn => b'W',
            Self::Verp => b'V',
            Self::Attr => b'A',
            Self::Orcp => b'O',
            Self::Flgs => b'L',
            Self::Mesg => b'M',
        }
    }

    /// Recover a [`RecordType`] from its wire tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'C' => Some(Self::Size),
            b'T' => Some(Self::Time),
            b'N' => Some(Self::Full),
            b'F' => Some(Self::From),
            b'R' => Some(Self::Rcpt),
            b'D' => Some(Self::Done),
            b'W' => Some(Self::Warn),
            b'V' => Some(Self::Verp),
            b'A' => Some(Self::Attr),
            b'O' => Some(Self::Orcp),
            b'L' => Some(Self::Flgs),
            b'M' => Some(Self::Mesg),
            _ => None,
        }
    }

    /// Whether this type is valid while the envelope segment is being read,
    /// i.e. everything except the content boundary marker.
    #[must_use]
    pub const fn is_envelope(self) -> bool {
        !matches!(self, Self::Mesg)
    }
}

/// A single `(type, payload)` record as read from, or written to, the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record type tag.
    pub kind: RecordType,
    /// Raw payload bytes, exclusive of any framing.
    pub payload: Vec<u8>,
}

impl Record {
    /// Build a record from owned bytes.
    #[must_use]
    pub const fn new(kind: RecordType, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    /// Build a record from a string payload.
    #[must_use]
    pub fn from_str(kind: RecordType, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into().into_bytes(),
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Interpret the payload as UTF-8, lossily.
    #[must_use]
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Fixed-width ASCII layout for the size/count placeholder record.
///
/// Three integer fields, zero-padded, separated by single spaces, wide
/// enough that any later in-place rewrite never needs to relocate the
/// surrounding file.
pub mod size_slot {
    /// Width (in bytes, excluding field separators) reserved per integer field.
    pub const FIELD_WIDTH: usize = 19;

    /// Encode `(message_size, recipient_count, qmgr_options)` into the
    /// fixed-width slot payload.
    #[must_use]
    pub fn encode(message_size: u64, recipient_count: u64, qmgr_opts: u64) -> String {
        format!(
            "{message_size:0>FIELD_WIDTH$} {recipient_count:0>FIELD_WIDTH$} {qmgr_opts:0>FIELD_WIDTH$}"
        )
    }

    /// Decode a size-slot payload back into its three fields.
    #[must_use]
    pub fn decode(payload: &str) -> Option<(u64, u64, u64)> {
        let mut parts = payload.split(' ');
        let a = parts.next()?.parse().ok()?;
        let b = parts.next()?.parse().ok()?;
        let c = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((a, b, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for kind in <RecordType as strum::IntoEnumIterator>::iter() {
            assert_eq!(RecordType::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn envelope_membership() {
        assert!(RecordType::Rcpt.is_envelope());
        assert!(RecordType::Attr.is_envelope());
        assert!(!RecordType::Mesg.is_envelope());
    }

    #[test]
    fn size_slot_round_trip() {
        let encoded = size_slot::encode(0, 0, 0);
        assert_eq!(size_slot::decode(&encoded), Some((0, 0, 0)));

        let encoded = size_slot::encode(4096, 3, 7);
        assert_eq!(size_slot::decode(&encoded), Some((4096, 3, 7)));
    }
}
