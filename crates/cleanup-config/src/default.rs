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

/// Disabled by default; the original only synthesizes a warning when an
/// operator opts in.
pub const DEFAULT_DELAY_WARN_TIME: u64 = 0;

/// Order-of-100 safety cap on queue-file attributes per message.
pub const DEFAULT_QATTR_COUNT_LIMIT: usize = 100;

/// No extra flags allowed unless explicitly configured.
pub const DEFAULT_ALLOWED_EXTRA_FLAGS: u32 = 0;

/// Matches the conservative default most local IPC clients in this family use.
pub const DEFAULT_IPC_TIMEOUT_SECS: u64 = 3600;

/// Generous enough for any realistic envelope field, small enough to bound
/// a hostile stream's memory use.
pub const DEFAULT_MAX_RECORD_PAYLOAD: usize = 64 * 1024;
