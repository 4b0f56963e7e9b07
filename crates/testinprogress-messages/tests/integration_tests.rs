// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for testinprogress-messages
//!
//! These tests push complete runs through the sender backends and check that the
//! recorded streams decode and satisfy the protocol ordering rules.

use proptest::prelude::*;
use similar_asserts::assert_eq;
use testinprogress_messages::{
    CapturingSenderFactory, Event, Message, MessageKind, MessageSender, MessageSenderFactory,
    MessagesError, WriterSender, parse_stream, validate_stream,
};

/// A minimal but complete run: one class, one passing and one failing method
fn complete_run(run_id: &str) -> Vec<Message> {
    let node = |test_id: &str, name: &str, parent: Option<&str>, container: bool, count| {
        Message::new(
            run_id,
            Event::TreeNode {
                test_id: test_id.to_string(),
                name: name.to_string(),
                parent_id: parent.map(str::to_string),
                is_container: container,
                child_count: count,
            },
        )
    };
    vec![
        Message::new(
            run_id,
            Event::RunStarted {
                total_method_count: 2,
            },
        ),
        node("1", "smoke", None, true, 1),
        node("2", "pkg.Foo", Some("1"), true, 2),
        node("3", "a(pkg.Foo)", Some("2"), false, 1),
        node("4", "b(pkg.Foo)", Some("2"), false, 1),
        Message::new(
            run_id,
            Event::TestStarted {
                test_id: "3".to_string(),
                name: "a(pkg.Foo)".to_string(),
                is_skipped: false,
            },
        ),
        Message::new(
            run_id,
            Event::TestEnded {
                test_id: "3".to_string(),
                name: "a(pkg.Foo)".to_string(),
                is_skipped: false,
            },
        ),
        Message::new(
            run_id,
            Event::TestStarted {
                test_id: "4".to_string(),
                name: "b(pkg.Foo)".to_string(),
                is_skipped: false,
            },
        ),
        Message::new(
            run_id,
            Event::TestError {
                test_id: "4".to_string(),
                name: "b(pkg.Foo)".to_string(),
                trace: "IllegalStateException: x".to_string(),
            },
        ),
        Message::new(
            run_id,
            Event::TestEnded {
                test_id: "4".to_string(),
                name: "b(pkg.Foo)".to_string(),
                is_skipped: false,
            },
        ),
        Message::new(run_id, Event::RunEnded { elapsed_millis: 42 }),
    ]
}

fn send_all(sender: &mut dyn MessageSender, messages: &[Message]) {
    sender.init().expect("init");
    for message in messages {
        sender.send(message).expect("send");
    }
    sender.shutdown().expect("shutdown");
}

#[test]
fn test_writer_stream_round_trips_through_validator() {
    let messages = complete_run("Suite1-smoke");
    let mut sender = WriterSender::new(Vec::new());
    send_all(&mut sender, &messages);

    let output = String::from_utf8(sender.into_inner()).expect("utf8");
    let decoded = parse_stream(&output).expect("decode");
    assert_eq!(decoded, messages);

    let summaries = validate_stream(&output).expect("valid stream");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].run_id, "Suite1-smoke");
    assert_eq!(summaries[0].messages, messages.len());
    assert_eq!(summaries[0].leaves, 2);
}

#[test]
fn test_capturing_factory_keeps_runs_apart() {
    let factory = CapturingSenderFactory::new();
    let mut first = factory.create_sender();
    let mut second = factory.create_sender();
    send_all(first.as_mut(), &complete_run("Suite-order"));
    send_all(second.as_mut(), &complete_run("Suite-database"));

    let runs = factory.messages().expect("decode");
    assert_eq!(runs.len(), 2);
    assert!(runs[0].iter().all(|m| m.run_id == "Suite-order"));
    assert!(runs[1].iter().all(|m| m.run_id == "Suite-database"));
    assert_eq!(runs[0][0].kind(), MessageKind::RunStarted);
    assert_eq!(runs[1].last().map(Message::kind), Some(MessageKind::RunEnded));
}

#[test]
fn test_interleaved_runs_validate_independently() {
    let first = complete_run("S-one");
    let second = complete_run("S-two");
    let interleaved: Vec<String> = first
        .iter()
        .zip(second.iter())
        .flat_map(|(a, b)| [a, b])
        .map(|m| m.to_json_line().expect("encode"))
        .collect();

    let summaries = validate_stream(&interleaved.join("\n")).expect("valid");
    let ids: Vec<&str> = summaries.iter().map(|s| s.run_id.as_str()).collect();
    assert_eq!(ids, vec!["S-one", "S-two"]);
}

#[test]
fn test_truncated_stream_is_a_protocol_violation() {
    let mut messages = complete_run("Suite1-smoke");
    messages.pop();
    let lines: Vec<String> = messages
        .iter()
        .map(|m| m.to_json_line().expect("encode"))
        .collect();

    assert!(matches!(
        validate_stream(&lines.join("\n")),
        Err(MessagesError::Protocol { .. })
    ));
}

proptest! {
    #[test]
    fn prop_parse_stream_never_panics(input in ".*{0,200}") {
        let _ = parse_stream(&input);
        let _ = validate_stream(&input);
    }

    #[test]
    fn prop_dropping_run_ended_is_always_detected(cut in 1usize..11) {
        let messages = complete_run("Suite1-smoke");
        let lines: Vec<String> = messages[..cut]
            .iter()
            .map(|m| m.to_json_line().expect("encode"))
            .collect();
        prop_assert!(validate_stream(&lines.join("\n")).is_err());
    }
}
