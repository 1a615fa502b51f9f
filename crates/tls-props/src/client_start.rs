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

use crate::attr::{AttrReader, AttrWriter, Result};

/// Number of top-level fields the client-start schema currently defines.
/// `matchargv` counts as one field even though it nests an array.
pub const CLIENT_START_FIELD_COUNT: usize = 12;

/// Parameters a TLS helper process needs to start a client-side handshake
/// on behalf of the mail daemon, sent once across the local IPC boundary.
///
/// Absent optional strings are carried as `""`, never omitted: the wire
/// format has no "missing field" representation, only an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStartProps {
    /// Handshake timeout, in seconds.
    pub timeout: i64,
    /// Requested TLS security level.
    pub tls_level: i64,
    /// Next-hop domain, if the route differs from `host`.
    pub nexthop: String,
    /// Destination hostname.
    pub host: String,
    /// Combined name/address used in logging.
    pub namaddr: String,
    /// Session cache lookup key.
    pub serverid: String,
    /// HELO/EHLO name presented to the peer.
    pub helo: String,
    /// Acceptable protocol version list.
    pub protocols: String,
    /// Requested cipher grade.
    pub cipher_grade: String,
    /// Cipher exclusion list.
    pub cipher_exclusions: String,
    /// Patterns the peer certificate's name must match.
    pub matchargv: Vec<String>,
    /// Message digest algorithm for fingerprinting.
    pub mdalg: String,
}

impl ClientStartProps {
    /// Encode this bundle for transmission across the IPC boundary.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = AttrWriter::new();
        writer
            .write_int(self.timeout)
            .write_int(self.tls_level)
            .write_str(&self.nexthop)
            .write_str(&self.host)
            .write_str(&self.namaddr)
            .write_str(&self.serverid)
            .write_str(&self.helo)
            .write_str(&self.protocols)
            .write_str(&self.cipher_grade)
            .write_str(&self.cipher_exclusions)
            .write_list(&self.matchargv)
            .write_str(&self.mdalg);
        debug_assert_eq!(writer.field_count(), CLIENT_START_FIELD_COUNT);
        writer.into_bytes()
    }

    /// Decode a bundle previously produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is truncated, contains invalid UTF-8
    /// in a string field, or does not carry exactly
    /// [`CLIENT_START_FIELD_COUNT`] fields.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = AttrReader::new(bytes);
        let props = Self {
            timeout: reader.read_int()?,
            tls_level: reader.read_int()?,
            nexthop: reader.read_str()?,
            host: reader.read_str()?,
            namaddr: reader.read_str()?,
            serverid: reader.read_str()?,
            helo: reader.read_str()?,
            protocols: reader.read_str()?,
            cipher_grade: reader.read_str()?,
            cipher_exclusions: reader.read_str()?,
            matchargv: reader.read_list()?,
            mdalg: reader.read_str()?,
        };
        reader.finish(CLIENT_START_FIELD_COUNT)?;
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_empty_optionals() {
        let props = ClientStartProps {
            timeout: 30,
            tls_level: 2,
            nexthop: String::new(),
            host: "mail.example.com".to_owned(),
            namaddr: "mail.example.com[192.0.2.1]".to_owned(),
            serverid: "smtp:mail.example.com".to_owned(),
            helo: "relay.example.net".to_owned(),
            protocols: "!SSLv2".to_owned(),
            cipher_grade: "high".to_owned(),
            cipher_exclusions: String::new(),
            matchargv: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            mdalg: "sha256".to_owned(),
        };

        let decoded = ClientStartProps::decode(&props.encode()).unwrap();
        assert_eq!(decoded, props);
        assert_eq!(decoded.nexthop, "");
        assert_eq!(decoded.matchargv, vec!["a", "b", "c"]);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let mut bytes = ClientStartProps {
            timeout: 1,
            tls_level: 1,
            nexthop: String::new(),
            host: String::new(),
            namaddr: String::new(),
            serverid: String::new(),
            helo: String::new(),
            protocols: String::new(),
            cipher_grade: String::new(),
            cipher_exclusions: String::new(),
            matchargv: vec![],
            mdalg: String::new(),
        }
        .encode();
        bytes.truncate(bytes.len() - 1);
        assert!(ClientStartProps::decode(&bytes).is_err());
    }
}
