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

use crate::{CleanupState, RecordSink};
use cleanup_protocol::{Record, RecordType};
use std::collections::HashMap;

/// Canonicalizes and, for recipients, expands envelope addresses.
///
/// The contract: implementations must never touch `state.errs` except to
/// flag policy errors (e.g. unresolvable alias recursion), must treat the
/// sink as append-only, and must leave `state` valid even on failure.
#[async_trait::async_trait]
pub trait AddressRewriter: Send + Sync {
    /// Canonicalize `raw_addr`, set `state.sender`, and emit the canonical
    /// `From` record to `sink`.
    async fn rewrite_sender(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()>;

    /// Canonicalize and expand `raw_addr`. For each resulting recipient,
    /// emit an `Orcp` record carrying `state.orig_rcpt` (or `raw_addr`
    /// itself if no original recipient is pending) followed by the
    /// canonical `Rcpt` record, in expansion order.
    async fn rewrite_recipient(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()>;
}

fn lowercase_domain(addr: &str) -> String {
    match addr.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
        None => addr.to_owned(),
    }
}

/// Canonicalizes by lowercasing the domain part only; performs no alias
/// expansion. Useful as a default when no virtual table is configured.
#[derive(Debug, Default)]
pub struct IdentityRewriter;

#[async_trait::async_trait]
impl AddressRewriter for IdentityRewriter {
    async fn rewrite_sender(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()> {
        let canonical = lowercase_domain(raw_addr);
        sink.emit_record(&Record::from_str(RecordType::From, canonical.clone()))
            .await?;
        state.sender = Some(canonical);
        Ok(())
    }

    async fn rewrite_recipient(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()> {
        let canonical = lowercase_domain(raw_addr);
        let orig = state.orig_rcpt.clone().unwrap_or_else(|| raw_addr.to_owned());
        sink.emit_record(&Record::from_str(RecordType::Orcp, orig))
            .await?;
        sink.emit_record(&Record::from_str(RecordType::Rcpt, canonical))
            .await?;
        state.recipient_count += 1;
        Ok(())
    }
}

/// Canonicalizes like [`IdentityRewriter`], additionally expanding
/// recipients through a static virtual-alias table (one raw address maps
/// to zero or more delivery addresses, in table order).
#[derive(Debug, Default)]
pub struct AliasRewriter {
    aliases: HashMap<String, Vec<String>>,
}

impl AliasRewriter {
    /// Build a rewriter from an explicit alias table.
    #[must_use]
    pub fn new(aliases: HashMap<String, Vec<String>>) -> Self {
        Self { aliases }
    }
}

#[async_trait::async_trait]
impl AddressRewriter for AliasRewriter {
    async fn rewrite_sender(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()> {
        IdentityRewriter.rewrite_sender(state, sink, raw_addr).await
    }

    async fn rewrite_recipient(
        &self,
        state: &mut CleanupState,
        sink: &mut dyn RecordSink,
        raw_addr: &str,
    ) -> std::io::Result<()> {
        let canonical = lowercase_domain(raw_addr);
        let orig = state.orig_rcpt.clone().unwrap_or_else(|| raw_addr.to_owned());

        let expansion = self.aliases.get(&canonical).cloned().unwrap_or_else(|| vec![canonical]);
        for delivered in expansion {
            sink.emit_record(&Record::from_str(RecordType::Orcp, orig.clone()))
                .await?;
            sink.emit_record(&Record::from_str(RecordType::Rcpt, delivered))
                .await?;
            state.recipient_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VecSink;

    #[tokio::test]
    async fn identity_lowercases_domain_only() {
        let mut state = CleanupState::new("q1");
        let mut sink = VecSink::new();
        IdentityRewriter
            .rewrite_sender(&mut state, &mut sink, "Alice@Example.COM")
            .await
            .unwrap();
        assert_eq!(state.sender.as_deref(), Some("Alice@example.com"));
    }

    #[tokio::test]
    async fn alias_fan_out_preserves_order() {
        let mut aliases = HashMap::new();
        aliases.insert(
            "sales@example.com".to_owned(),
            vec!["alice@example.com".to_owned(), "bob@example.com".to_owned()],
        );
        let rewriter = AliasRewriter::new(aliases);

        let mut state = CleanupState::new("q1");
        let mut sink = VecSink::new();
        rewriter
            .rewrite_recipient(&mut state, &mut sink, "sales@example.com")
            .await
            .unwrap();

        assert_eq!(state.recipient_count, 2);
        let rcpts: Vec<_> = sink
            .records
            .iter()
            .filter(|r| r.kind == RecordType::Rcpt)
            .map(|r| r.as_str_lossy().into_owned())
            .collect();
        assert_eq!(rcpts, vec!["alice@example.com", "bob@example.com"]);
    }
}
