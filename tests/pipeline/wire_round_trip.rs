use super::scripted_model::ScriptedModel;
use futures_util::StreamExt;
use std::sync::Arc;
use streamchat::config::PipelineConfig;
use streamchat::config::schema::default_models;
use streamchat::pipeline::{ChatAdapter, concat_text};
use streamchat::providers::Conversation;
use streamchat::tools::ToolRegistry;
use streamchat::transport::{FenceParser, Reassembler, Segment, classify, encode};
use tokio_util::sync::CancellationToken;

const FRAGMENTS: [&str; 9] = [
    "Sure<e",
    "os>! Here ",
    "is a Python example:\n",
    "```py",
    "thon\nprint('caf\u{e9}')\n",
    "```",
    "\nIt prints a word ",
    "with an accent",
    ".</s>",
];

async fn wire_bytes() -> (Vec<u8>, String) {
    let entry = default_models()
        .into_iter()
        .find(|entry| entry.id == "mistral")
        .expect("mistral is in the default catalog");
    let adapter = ChatAdapter::new(
        Arc::new(ScriptedModel::new(&FRAGMENTS)),
        &entry,
        &PipelineConfig::default(),
    );
    let conversation = Conversation::new(None, Vec::new(), "example?");

    let expected = concat_text(
        &adapter
            .generate_once(&conversation, Arc::new(ToolRegistry::new()))
            .await
            .expect("single-shot generation"),
    );

    let cancel = CancellationToken::new();
    let chunks = adapter
        .generate(&conversation, Arc::new(ToolRegistry::new()), cancel.clone())
        .await
        .expect("streaming generation");
    let frames: Vec<String> = encode(chunks, cancel).collect().await;
    (frames.concat().into_bytes(), expected)
}

#[tokio::test]
async fn any_byte_window_reassembles_the_same_message() {
    let (bytes, expected) = wire_bytes().await;
    assert!(!expected.contains("<eos>"));
    assert!(!expected.contains("</s>"));

    for window in [1, 2, 3, 5, 7, 16, 64, bytes.len()] {
        let mut reassembler = Reassembler::new();
        for part in bytes.chunks(window) {
            reassembler.push(part).expect("no error frames");
        }
        reassembler.finish().expect("no error frames");
        assert!(reassembler.is_done(), "window {window}");
        assert_eq!(reassembler.message(), expected, "window {window}");
    }
}

#[tokio::test]
async fn incremental_fence_parse_converges_on_full_classification() {
    let (bytes, expected) = wire_bytes().await;

    let mut reassembler = Reassembler::new();
    let mut parser = FenceParser::new();
    let mut last = Vec::new();
    let mut saw_streaming_code = false;
    for part in bytes.chunks(4) {
        for payload in reassembler.push(part).expect("no error frames") {
            last = parser.push(&payload);
            saw_streaming_code |= last.iter().any(|s| matches!(s, Segment::Code { streaming: true, .. }));
        }
    }
    for payload in reassembler.finish().expect("no error frames") {
        last = parser.push(&payload);
    }

    assert!(saw_streaming_code);
    assert_eq!(last, classify(&expected));
    assert!(last.iter().any(|segment| matches!(
        segment,
        Segment::Code { language, streaming: false, content }
            if language == "python" && content == "print('caf\u{e9}')\n"
    )));
}
