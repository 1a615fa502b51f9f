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

//! Immutable configuration captured once at process start and handed to the
//! [`cleanup-core`](../cleanup_core/index.html) processor.
//!
//! Mirrors the knobs named in `var_delay_warn_time`, `var_qattr_count_limit`
//! and the SASL/extra-flags option masks: a process-wide, read-only
//! singleton is an acceptable *source*, but the processor itself only ever
//! sees this struct.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod default;

pub use default::*;

/// Configuration for one running instance of the envelope processor.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Seconds after arrival at which a delay-warning `WARN` record is
    /// synthesized, if the client did not already supply one. Zero disables
    /// synthesis.
    pub delay_warn_time: u64,
    /// Maximum number of `ATTR` records admitted into a single envelope.
    pub qattr_count_limit: usize,
    /// Bitmask of extra cleanup flags a `FLGS` record is allowed to set.
    pub allowed_extra_flags: u32,
    /// Timeout for the cross-process IPC used by the TLS-property marshaler
    /// and the fast-flush client.
    pub ipc_timeout_secs: u64,
    /// Maximum payload accepted for a single envelope record.
    pub max_record_payload: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_warn_time: DEFAULT_DELAY_WARN_TIME,
            qattr_count_limit: DEFAULT_QATTR_COUNT_LIMIT,
            allowed_extra_flags: DEFAULT_ALLOWED_EXTRA_FLAGS,
            ipc_timeout_secs: DEFAULT_IPC_TIMEOUT_SECS,
            max_record_payload: DEFAULT_MAX_RECORD_PAYLOAD,
        }
    }
}

/// Builder for [`Config`], following the same `with_*` fluent style the
/// surrounding project uses for its (considerably larger) typestate config
/// builder, simplified here since this crate only exposes a handful of
/// independent knobs rather than a staged multi-section document.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay-warning interval, in seconds.
    #[must_use]
    pub const fn with_delay_warn_time(mut self, seconds: u64) -> Self {
        self.config.delay_warn_time = seconds;
        self
    }

    /// Set the maximum number of admitted `ATTR` records.
    #[must_use]
    pub const fn with_qattr_count_limit(mut self, limit: usize) -> Self {
        self.config.qattr_count_limit = limit;
        self
    }

    /// Set the bitmask of flags a `FLGS` record may set.
    #[must_use]
    pub const fn with_allowed_extra_flags(mut self, mask: u32) -> Self {
        self.config.allowed_extra_flags = mask;
        self
    }

    /// Set the IPC timeout, in seconds, for the sibling marshaler and
    /// fast-flush clients.
    #[must_use]
    pub const fn with_ipc_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.ipc_timeout_secs = seconds;
        self
    }

    /// Set the maximum payload size accepted for a single record.
    #[must_use]
    pub const fn with_max_record_payload(mut self, bytes: usize) -> Self {
        self.config.max_record_payload = bytes;
        self
    }

    /// Freeze the builder into an immutable [`Config`].
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builder_defaults() {
        assert_eq!(Config::default().qattr_count_limit, ConfigBuilder::new().build().qattr_count_limit);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = ConfigBuilder::new()
            .with_qattr_count_limit(2)
            .with_delay_warn_time(0)
            .build();
        assert_eq!(config.qattr_count_limit, 2);
        assert_eq!(config.delay_warn_time, 0);
    }

    #[test]
    fn serde_round_trip() {
        let config = ConfigBuilder::new().build();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.qattr_count_limit, back.qattr_count_limit);
    }
}
