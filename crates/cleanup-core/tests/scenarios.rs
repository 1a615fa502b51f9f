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

use cleanup_config::ConfigBuilder;
use cleanup_core::{CleanupState, EnvelopeProcessor, ErrorMask, IdentityRewriter, VecSink};
use cleanup_protocol::{size_slot, Record, RecordType};
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn run(
    config: Arc<cleanup_config::Config>,
    records: Vec<Record>,
) -> (CleanupState, VecSink) {
    let mut state = CleanupState::new("TESTQUEUEID");
    let mut sink = VecSink::new();
    let rewriter = IdentityRewriter;
    let mut processor = EnvelopeProcessor::new(config);

    let mut iter = records.into_iter();
    let first = iter.next().expect("at least one record");
    processor
        .begin(&mut state, &mut sink, &rewriter, first)
        .await
        .unwrap();
    for record in iter {
        processor
            .process(&mut state, &mut sink, &rewriter, record)
            .await
            .unwrap();
    }
    (state, sink)
}

#[tokio::test]
async fn happy_path() {
    let config = Arc::new(ConfigBuilder::new().with_delay_warn_time(3600).build());
    let records = vec![
        Record::from_str(RecordType::Time, "1700000000"),
        Record::from_str(RecordType::From, "alice@example"),
        Record::from_str(RecordType::Orcp, "Bob@EXAMPLE"),
        Record::from_str(RecordType::Rcpt, "bob@example"),
        Record::from_str(RecordType::Attr, "log=main"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, sink) = run(config, records).await;

    assert!(state.is_clean());
    assert_eq!(state.sender.as_deref(), Some("alice@example"));
    assert_eq!(state.attr.get("log").map(String::as_str), Some("main"));

    let kinds: Vec<_> = sink.records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordType::Size,
            RecordType::Time,
            RecordType::From,
            RecordType::Orcp,
            RecordType::Rcpt,
            RecordType::Attr,
            RecordType::Warn,
        ]
    );
    assert_eq!(
        size_slot::decode(&sink.records[0].as_str_lossy()),
        Some((0, 0, 0))
    );
    assert_eq!(sink.records[3].as_str_lossy(), "Bob@EXAMPLE");
    assert_eq!(sink.records[4].as_str_lossy(), "bob@example");
    assert_eq!(sink.records[6].as_str_lossy(), "1700003600");
}

#[tokio::test]
async fn recipient_before_sender_is_rejected() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![
        Record::from_str(RecordType::Time, "1"),
        Record::from_str(RecordType::Rcpt, "bob@example"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, sink) = run(config, records).await;

    assert!(state.errs.contains(ErrorMask::BAD));
    assert!(state.sender.is_none());
    let kinds: Vec<_> = sink.records.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RecordType::Size, RecordType::Time]);
}

#[tokio::test]
async fn attribute_limit_is_enforced() {
    let config = Arc::new(ConfigBuilder::new().with_qattr_count_limit(2).build());
    let records = vec![
        Record::from_str(RecordType::Attr, "a=1"),
        Record::from_str(RecordType::Attr, "b=2"),
        Record::from_str(RecordType::Attr, "c=3"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, _sink) = run(config, records).await;

    assert!(state.errs.contains(ErrorMask::BAD));
    assert_eq!(state.attr.len(), 2);
    assert_eq!(state.attr.get("a").map(String::as_str), Some("1"));
    assert_eq!(state.attr.get("b").map(String::as_str), Some("2"));
    assert!(!state.attr.contains_key("c"));
}

#[tokio::test]
async fn orphan_orcp_is_dropped_with_a_warning() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![
        Record::from_str(RecordType::Time, "1"),
        Record::from_str(RecordType::From, "a@x"),
        Record::from_str(RecordType::Orcp, "X"),
        Record::from_str(RecordType::Time, "2"),
        Record::from_str(RecordType::Rcpt, "b@y"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, sink) = run(config, records).await;

    assert!(state.is_clean());
    let times: Vec<_> = sink
        .records
        .iter()
        .filter(|r| r.kind == RecordType::Time)
        .map(|r| r.as_str_lossy().into_owned())
        .collect();
    assert_eq!(times, vec!["1", "2"]);

    let orcp_payloads: Vec<_> = sink
        .records
        .iter()
        .filter(|r| r.kind == RecordType::Orcp)
        .map(|r| r.as_str_lossy().into_owned())
        .collect();
    // the orphaned "X" label was dropped; the later RCPT used its own payload.
    assert_eq!(orcp_payloads, vec!["b@y"]);
}

#[tokio::test]
async fn bad_verp_is_rejected_and_not_forwarded() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![
        Record::from_str(RecordType::From, "a@x"),
        Record::new(RecordType::Verp, b"a ".to_vec()),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, sink) = run(config, records).await;

    assert!(state.errs.contains(ErrorMask::BAD));
    assert!(!sink.records.iter().any(|r| r.kind == RecordType::Verp));
}

#[tokio::test]
async fn empty_envelope_is_bad_for_missing_sender_and_time() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![Record::from_str(RecordType::Mesg, "")];
    let (state, _sink) = run(config, records).await;
    assert!(state.errs.contains(ErrorMask::BAD));
}

#[tokio::test]
async fn negative_warn_time_is_bad() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![
        Record::from_str(RecordType::Time, "1"),
        Record::from_str(RecordType::From, "a@x"),
        Record::from_str(RecordType::Warn, "-1"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, _sink) = run(config, records).await;
    assert!(state.errs.contains(ErrorMask::BAD));
}

#[tokio::test]
async fn verp_with_empty_sender_is_bad() {
    let config = Arc::new(ConfigBuilder::new().build());
    // sender is set, then wiped back to empty is not directly possible via
    // the public API; instead exercise the no-sender-yet path.
    let records = vec![
        Record::new(RecordType::Verp, b"+-".to_vec()),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, sink) = run(config, records).await;
    assert!(state.errs.contains(ErrorMask::BAD));
    assert!(!sink.records.iter().any(|r| r.kind == RecordType::Verp));
}

#[tokio::test]
async fn replaying_a_clean_envelope_stays_clean() {
    let config = Arc::new(ConfigBuilder::new().build());
    let records = vec![
        Record::from_str(RecordType::Time, "42"),
        Record::from_str(RecordType::From, "a@x"),
        Record::from_str(RecordType::Rcpt, "b@y"),
        Record::from_str(RecordType::Mesg, ""),
    ];
    let (state, _sink) = run(config, records).await;
    assert!(state.is_clean());
    assert_eq!(state.sender.as_deref(), Some("a@x"));
    assert_eq!(state.time, Some(42));
}
