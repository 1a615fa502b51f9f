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

/// Number of fields the server-init schema currently defines.
pub const SERVER_INIT_FIELD_COUNT: usize = 19;

/// Parameters a TLS helper process needs to initialize a server-side
/// context, read back from the local IPC boundary by the mail daemon.
///
/// Built by [`Self::decode`] as a single atomic step: there is no
/// intermediate, partially-populated value visible to callers, so unlike
/// the scan routine this mirrors, no paired free routine is needed — the
/// struct's own `Drop` releases every owned string when it goes out of
/// scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInitProps {
    /// Diagnostic logging parameter string.
    pub log_param: String,
    /// Diagnostic logging verbosity level.
    pub log_level: String,
    /// Certificate verification depth.
    pub verifydepth: i64,
    /// Session cache backend identifier.
    pub cache_type: String,
    /// Whether to set a session id for caching.
    pub set_sessid: i64,
    /// RSA certificate file path.
    pub cert_file: String,
    /// RSA private key file path.
    pub key_file: String,
    /// DSA certificate file path.
    pub dcert_file: String,
    /// DSA private key file path.
    pub dkey_file: String,
    /// ECDSA certificate file path.
    pub eccert_file: String,
    /// ECDSA private key file path.
    pub eckey_file: String,
    /// Trusted CA bundle file path.
    pub cafile: String,
    /// Trusted CA directory path.
    pub capath: String,
    /// Acceptable protocol version list.
    pub protocols: String,
    /// ECDH curve grade.
    pub eecdh_grade: String,
    /// Legacy 1024-bit DH parameter file path.
    pub dh1024_param_file: String,
    /// Legacy 512-bit DH parameter file path.
    pub dh512_param_file: String,
    /// Whether to request a client certificate.
    pub ask_ccert: i64,
    /// Message digest algorithm for fingerprinting.
    pub mdalg: String,
}

impl ServerInitProps {
    /// Encode this bundle for transmission across the IPC boundary.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = AttrWriter::new();
        writer
            .write_str(&self.log_param)
            .write_str(&self.log_level)
            .write_int(self.verifydepth)
            .write_str(&self.cache_type)
            .write_int(self.set_sessid)
            .write_str(&self.cert_file)
            .write_str(&self.key_file)
            .write_str(&self.dcert_file)
            .write_str(&self.dkey_file)
            .write_str(&self.eccert_file)
            .write_str(&self.eckey_file)
            .write_str(&self.cafile)
            .write_str(&self.capath)
            .write_str(&self.protocols)
            .write_str(&self.eecdh_grade)
            .write_str(&self.dh1024_param_file)
            .write_str(&self.dh512_param_file)
            .write_int(self.ask_ccert)
            .write_str(&self.mdalg);
        debug_assert_eq!(writer.field_count(), SERVER_INIT_FIELD_COUNT);
        writer.into_bytes()
    }

    /// Decode a bundle previously produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is truncated, contains invalid UTF-8
    /// in a string field, or does not carry exactly
    /// [`SERVER_INIT_FIELD_COUNT`] fields.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = AttrReader::new(bytes);
        let props = Self {
            log_param: reader.read_str()?,
            log_level: reader.read_str()?,
            verifydepth: reader.read_int()?,
            cache_type: reader.read_str()?,
            set_sessid: reader.read_int()?,
            cert_file: reader.read_str()?,
            key_file: reader.read_str()?,
            dcert_file: reader.read_str()?,
            dkey_file: reader.read_str()?,
            eccert_file: reader.read_str()?,
            eckey_file: reader.read_str()?,
            cafile: reader.read_str()?,
            capath: reader.read_str()?,
            protocols: reader.read_str()?,
            eecdh_grade: reader.read_str()?,
            dh1024_param_file: reader.read_str()?,
            dh512_param_file: reader.read_str()?,
            ask_ccert: reader.read_int()?,
            mdalg: reader.read_str()?,
        };
        reader.finish(SERVER_INIT_FIELD_COUNT)?;
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerInitProps {
        ServerInitProps {
            log_param: "smtpd".to_owned(),
            log_level: "1".to_owned(),
            verifydepth: 5,
            cache_type: "btree".to_owned(),
            set_sessid: 1,
            cert_file: "/etc/ssl/cert.pem".to_owned(),
            key_file: "/etc/ssl/key.pem".to_owned(),
            dcert_file: String::new(),
            dkey_file: String::new(),
            eccert_file: String::new(),
            eckey_file: String::new(),
            cafile: "/etc/ssl/ca.pem".to_owned(),
            capath: String::new(),
            protocols: "!SSLv2, !SSLv3".to_owned(),
            eecdh_grade: "strong".to_owned(),
            dh1024_param_file: String::new(),
            dh512_param_file: String::new(),
            ask_ccert: 0,
            mdalg: "sha256".to_owned(),
        }
    }

    #[test]
    fn round_trip_is_exact() {
        let props = sample();
        let decoded = ServerInitProps::decode(&props.encode()).unwrap();
        assert_eq!(decoded, props);
    }

    #[test]
    fn wrong_field_count_is_an_error() {
        let mut writer = AttrWriter::new();
        writer.write_str("short").write_int(1);
        let bytes = writer.into_bytes();
        assert!(ServerInitProps::decode(&bytes).is_err());
    }
}
