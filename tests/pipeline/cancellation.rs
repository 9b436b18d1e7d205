use super::scripted_model::ScriptedModel;
use futures_util::StreamExt;
use std::sync::Arc;
use streamchat::config::PipelineConfig;
use streamchat::config::schema::default_models;
use streamchat::pipeline::ChatAdapter;
use streamchat::providers::Conversation;
use streamchat::tools::ToolRegistry;
use streamchat::transport::{Reassembler, encode};
use tokio_util::sync::CancellationToken;

fn adapter(model: ScriptedModel) -> ChatAdapter {
    let entry = default_models()
        .into_iter()
        .find(|entry| entry.id == "gemma")
        .expect("gemma is in the default catalog");
    ChatAdapter::new(Arc::new(model), &entry, &PipelineConfig::default())
}

#[tokio::test]
async fn abort_after_two_frames_sends_terminal_frame_only() {
    let adapter = adapter(ScriptedModel::hanging(&["One.", " Two.", " Three."]));
    let cancel = CancellationToken::new();
    let chunks = adapter
        .generate(
            &Conversation::new(None, Vec::new(), "count"),
            Arc::new(ToolRegistry::new()),
            cancel.clone(),
        )
        .await
        .expect("generation should start");
    let mut frames = Box::pin(encode(chunks, cancel.clone()));

    let first = frames.next().await.expect("first frame");
    let second = frames.next().await.expect("second frame");
    assert_eq!(first, "data: One.\n\n");
    assert_eq!(second, "data:  Two.\n\n");

    cancel.cancel();
    let rest: Vec<String> = frames.collect().await;
    assert_eq!(rest, vec!["data: [DONE]\n\n".to_string()]);

    let mut reassembler = Reassembler::new();
    for frame in [first, second].iter().chain(&rest) {
        reassembler.push(frame.as_bytes()).expect("no error frames");
    }
    reassembler.finish().expect("no error frames");
    assert!(reassembler.is_done());
    assert_eq!(reassembler.message(), "One. Two.");
}

#[tokio::test]
async fn cancel_before_first_frame_yields_only_done() {
    let adapter = adapter(ScriptedModel::hanging(&[]));
    let cancel = CancellationToken::new();
    let chunks = adapter
        .generate(
            &Conversation::new(None, Vec::new(), "hi"),
            Arc::new(ToolRegistry::new()),
            cancel.clone(),
        )
        .await
        .expect("generation should start");

    cancel.cancel();
    let frames: Vec<String> = encode(chunks, cancel).collect().await;
    assert_eq!(frames, vec!["data: [DONE]\n\n".to_string()]);
}
