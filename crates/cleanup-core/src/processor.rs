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

use crate::{AddressRewriter, CleanupFlags, CleanupState, ErrorMask, RecordSink};
use cleanup_config::Config;
use cleanup_protocol::{size_slot, Record, RecordType};
use std::sync::Arc;

/// Two-state indirect dispatch for the record handler, modeled as a tagged
/// variant rather than a stored function pointer. Transitions are total
/// functions of the current stage and the next record's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// `begin` has not yet installed the envelope handler.
    Init,
    /// Reading envelope-segment records.
    Envelope,
    /// The `Mesg` boundary was seen; content-segment records are no longer
    /// this crate's concern.
    Content,
}

/// Errors the processor itself can report. Everything else funnels into
/// [`CleanupState::errs`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The sink failed to accept a record. Treated as fatal: the queue file
    /// is abandoned along with the rest of the message state.
    #[error("record sink write failed: {0}")]
    Sink(#[from] std::io::Error),
    /// `process` was called after the envelope-to-content boundary.
    #[error("envelope segment already closed for this message")]
    EnvelopeClosed,
}

/// Drives the state machine over incoming envelope records for one message.
///
/// One instance per message. `begin` must be called exactly once before any
/// call to `process`; calling it twice is a library misuse and aborts the
/// process, matching the one fatal failure class this subsystem has.
pub struct EnvelopeProcessor {
    config: Arc<Config>,
    stage: Stage,
}

/// RFC-822 "specials" a VERP delimiter may not be, on top of whitespace.
const VERP_ILLEGAL: &[u8] = b"<>()[]\\,;:\"@";

fn is_legal_verp_delim(byte: u8) -> bool {
    byte.is_ascii_graphic() && !VERP_ILLEGAL.contains(&byte)
}

impl EnvelopeProcessor {
    /// Build a processor bound to an immutable configuration.
    #[must_use]
    pub const fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            stage: Stage::Init,
        }
    }

    /// Whether the envelope-to-content boundary has been crossed.
    #[must_use]
    pub fn is_content(&self) -> bool {
        self.stage == Stage::Content
    }

    async fn emit(
        &self,
        sink: &mut dyn RecordSink,
        state: &mut CleanupState,
        record: &Record,
    ) -> Result<(), ProcessorError> {
        sink.emit_record(record).await.map_err(|err| {
            state.mark(ErrorMask::WRITE);
            ProcessorError::Sink(err)
        })
    }

    /// Initialize envelope processing for a message and handle `first`.
    ///
    /// Emits the size/count placeholder record before anything else, so it
    /// can be rewritten in place later without relocating the rest of the
    /// queue file.
    ///
    /// # Panics
    ///
    /// If called more than once on the same processor.
    ///
    /// # Errors
    ///
    /// See [`Self::process`].
    pub async fn begin(
        &mut self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        rewriter: &dyn AddressRewriter,
        first: Record,
    ) -> Result<(), ProcessorError> {
        assert_eq!(
            self.stage,
            Stage::Init,
            "begin() must be called exactly once per message"
        );

        let placeholder = Record::from_str(RecordType::Size, size_slot::encode(0, 0, 0));
        self.emit(sink, state, &placeholder).await?;

        self.stage = Stage::Envelope;
        self.process(state, sink, rewriter, first).await
    }

    /// Handle one envelope record.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Sink`] if the record sink rejects a write,
    /// and [`ProcessorError::EnvelopeClosed`] if called after the boundary.
    pub async fn process(
        &mut self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        rewriter: &dyn AddressRewriter,
        record: Record,
    ) -> Result<(), ProcessorError> {
        match self.stage {
            Stage::Init => unreachable!("process() called before begin() installed the handler"),
            Stage::Content => return Err(ProcessorError::EnvelopeClosed),
            Stage::Envelope => {}
        }

        // 1. Boundary check.
        if record.kind == RecordType::Mesg {
            if state.sender.is_none() || state.time.is_none() {
                tracing::warn!(queue_id = %state.queue_id, "missing sender or time envelope record");
                state.mark(ErrorMask::BAD);
            } else {
                if state.warn_time.is_none() && self.config.delay_warn_time > 0 {
                    #[allow(clippy::cast_possible_wrap)]
                    let delay = self.config.delay_warn_time as i64;
                    state.warn_time = Some(state.time.unwrap_or(0) + delay);
                }
                if let Some(warn_time) = state.warn_time {
                    let warn_record = Record::from_str(RecordType::Warn, warn_time.to_string());
                    self.emit(sink, state, &warn_record).await?;
                }
                self.stage = Stage::Content;
            }
            return Ok(());
        }

        // 2. Flags record: bits outside the allowed mask are dropped with a
        // warning, not an error, preserved verbatim from the behavior this
        // was grounded on rather than promoted to BAD.
        if record.kind == RecordType::Flgs {
            let raw = record.as_str_lossy();
            let extra_flags: u32 = raw.trim().parse().unwrap_or(0);
            if extra_flags & !self.config.allowed_extra_flags != 0 {
                tracing::warn!(queue_id = %state.queue_id, flags = format_args!("{extra_flags:#x}"), "bad extra flags");
            } else {
                state.flags |= CleanupFlags::from_bits_truncate(extra_flags);
            }
            return Ok(());
        }

        // `record.kind` is drawn from the closed `RecordType` enum and the
        // reader already rejects unrecognized tags, so every remaining
        // value is by construction a member of the envelope segment's
        // record-type set; no further membership check is reachable here.

        // 4. Orphan ORCP cleanup.
        if record.kind != RecordType::Rcpt {
            if let Some(orphan) = state.orig_rcpt.take() {
                if record.kind != RecordType::Done {
                    tracing::warn!(
                        queue_id = %state.queue_id,
                        original_recipient = %orphan,
                        "out-of-order original recipient record"
                    );
                }
            }
        }

        // 5. Per-type dispatch.
        match record.kind {
            RecordType::Time => {
                state.time = Some(record.as_str_lossy().trim().parse().unwrap_or(0));
                self.emit(sink, state, &record).await?;
            }
            RecordType::Full => {
                state.fullname = Some(record.as_str_lossy().into_owned());
            }
            RecordType::From => {
                if state.sender.is_some() {
                    tracing::warn!(queue_id = %state.queue_id, "too many envelope sender records");
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                let raw = record.as_str_lossy().into_owned();
                rewriter
                    .rewrite_sender(state, sink, &raw)
                    .await
                    .map_err(|err| {
                        state.mark(ErrorMask::WRITE);
                        ProcessorError::Sink(err)
                    })?;
            }
            RecordType::Rcpt => {
                if state.sender.is_none() {
                    tracing::warn!(queue_id = %state.queue_id, "envelope recipient precedes sender");
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                let raw = record.as_str_lossy().into_owned();
                if state.orig_rcpt.is_none() {
                    state.orig_rcpt = Some(raw.clone());
                }
                let result = rewriter.rewrite_recipient(state, sink, &raw).await;
                state.orig_rcpt = None;
                result.map_err(|err| {
                    state.mark(ErrorMask::WRITE);
                    ProcessorError::Sink(err)
                })?;
            }
            RecordType::Done => {}
            RecordType::Warn => {
                let value: i64 = record.as_str_lossy().trim().parse().unwrap_or(0);
                if value < 0 {
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                state.warn_time = Some(value);
            }
            RecordType::Verp => {
                let sender_non_empty = matches!(state.sender.as_deref(), Some(s) if !s.is_empty());
                if !sender_non_empty {
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                let delims = &record.payload;
                if delims.len() != 2 || !delims.iter().copied().all(is_legal_verp_delim) {
                    tracing::warn!(
                        queue_id = %state.queue_id,
                        delims = %record.as_str_lossy(),
                        "bad VERP delimiters"
                    );
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                self.emit(sink, state, &record).await?;
            }
            RecordType::Attr => {
                if state.attr.len() >= self.config.qattr_count_limit {
                    tracing::warn!(
                        queue_id = %state.queue_id,
                        limit = self.config.qattr_count_limit,
                        "queue file attribute count exceeds safety limit"
                    );
                    state.mark(ErrorMask::BAD);
                    return Ok(());
                }
                self.emit(sink, state, &record).await?;
                let raw = record.as_str_lossy();
                match raw.split_once('=') {
                    Some((name, value)) => {
                        state.attr.insert(name.to_owned(), value.to_owned());
                    }
                    None => {
                        tracing::warn!(queue_id = %state.queue_id, attr = %raw, "malformed attribute");
                        state.mark(ErrorMask::BAD);
                    }
                }
            }
            RecordType::Orcp => {
                state.orig_rcpt = Some(record.as_str_lossy().into_owned());
            }
            // `Size`, and any future envelope-only addition, pass through verbatim.
            _ => {
                self.emit(sink, state, &record).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityRewriter, VecSink};

    fn config() -> Arc<Config> {
        Arc::new(
            cleanup_config::ConfigBuilder::new()
                .with_delay_warn_time(300)
                .with_qattr_count_limit(2)
                .build(),
        )
    }

    #[tokio::test]
    #[should_panic(expected = "exactly once")]
    async fn double_begin_panics() {
        let mut state = CleanupState::new("q");
        let mut sink = VecSink::new();
        let rewriter = IdentityRewriter;
        let mut processor = EnvelopeProcessor::new(config());
        processor
            .begin(
                &mut state,
                &mut sink,
                &rewriter,
                Record::from_str(RecordType::Time, "1"),
            )
            .await
            .unwrap();
        processor
            .begin(
                &mut state,
                &mut sink,
                &rewriter,
                Record::from_str(RecordType::Time, "2"),
            )
            .await
            .unwrap();
    }
}
