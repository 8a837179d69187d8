//! Conversation agent behavior against a scripted provider.

mod common;

use common::CaptureProvider;
use gemini_chat::types::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn first_turn_injects_system_prompt() {
    let provider = CaptureProvider::new();
    provider.queue_response("Hello.");
    let mut agent = provider.agent();

    let reply = agent.send("Hi", Some("Be terse")).await;

    assert_eq!(reply.text, "Hello.");
    assert_eq!(reply.usage, Some(common::usage()));
    assert_eq!(
        provider.last_messages(),
        vec![ModelMessage::system("Be terse"), ModelMessage::user("Hi")]
    );
}

#[tokio::test]
async fn second_turn_replays_history_without_system_prompt() {
    let provider = CaptureProvider::new();
    provider.queue_response("Hello.").queue_response("Sure.");
    let mut agent = provider.agent();

    agent.send("Hi", Some("Be terse")).await;
    agent.send("More?", Some("Be terse")).await;

    assert_eq!(
        provider.last_messages(),
        vec![
            ModelMessage::user("Hi"),
            ModelMessage::assistant("Hello."),
            ModelMessage::user("More?"),
        ]
    );
}

#[tokio::test]
async fn blank_system_prompt_is_not_sent() {
    let provider = CaptureProvider::new();
    let mut agent = provider.agent();

    agent.send("Hi", Some("   ")).await;

    assert_eq!(provider.last_messages(), vec![ModelMessage::user("Hi")]);
}

#[tokio::test]
async fn history_grows_by_two_per_exchange() {
    let provider = CaptureProvider::new();
    let mut agent = provider.agent();

    for n in 1..=5 {
        agent.send(&format!("message {n}"), None).await;
        assert_eq!(agent.history().len(), 2 * n);
    }

    let roles: Vec<TurnRole> = agent.history().iter().map(Turn::role).collect();
    for pair in roles.chunks(2) {
        assert_eq!(pair, &[TurnRole::User, TurnRole::Assistant][..]);
    }
    assert_eq!(agent.history()[8].content(), "message 5");
}

#[tokio::test]
async fn failed_call_reports_error_and_keeps_history() {
    let provider = CaptureProvider::new();
    provider
        .queue_response("Hello.")
        .queue_failure(400, "API key not valid");
    let mut agent = provider.agent();

    agent.send("Hi", None).await;
    let before: Vec<String> = agent.history().iter().map(|t| t.content().to_string()).collect();

    let reply = agent.send("More?", None).await;

    assert!(reply.text.starts_with("Error: "));
    assert!(reply.text.contains("API key not valid"));
    assert_eq!(reply.usage, None);
    let after: Vec<String> = agent.history().iter().map(|t| t.content().to_string()).collect();
    assert_eq!(after, before);
}

#[tokio::test]
async fn failed_first_call_still_injects_prompt_on_retry() {
    let provider = CaptureProvider::new();
    provider.queue_failure(503, "overloaded").queue_response("Hello.");
    let mut agent = provider.agent();

    agent.send("Hi", Some("Be terse")).await;
    agent.send("Hi", Some("Be terse")).await;

    assert_eq!(
        provider.last_messages(),
        vec![ModelMessage::system("Be terse"), ModelMessage::user("Hi")]
    );
}

#[tokio::test]
async fn clear_empties_history_and_reenables_system_prompt() {
    let provider = CaptureProvider::new();
    let mut agent = provider.agent();

    agent.send("Hi", Some("Be terse")).await;
    agent.clear();
    assert!(agent.history().is_empty());

    agent.send("Again", Some("Be verbose")).await;
    assert_eq!(
        provider.last_messages(),
        vec![ModelMessage::system("Be verbose"), ModelMessage::user("Again")]
    );
}

#[tokio::test]
async fn build_messages_does_not_mutate_history() {
    let provider = CaptureProvider::new();
    let agent = provider.agent();

    let messages = agent.build_messages("Hi", Some("Be terse"));

    assert_eq!(messages.len(), 2);
    assert!(agent.history().is_empty());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn settings_are_forwarded() {
    let provider = CaptureProvider::new();
    let settings = GenerationSettings::builder()
        .temperature(0.1)
        .max_tokens(64)
        .build();
    let mut agent = provider.agent().with_settings(settings.clone());

    agent.send("Hi", None).await;

    assert_eq!(provider.requests()[0].settings, settings);
}

#[tokio::test]
async fn streaming_forwards_chunks_and_records_history() {
    let provider = CaptureProvider::new();
    provider.queue_response("Hello there, friend.");
    let mut agent = provider.agent();

    let mut chunks = Vec::new();
    let reply = agent
        .send_streaming("Hi", None, |chunk| chunks.push(chunk.to_string()))
        .await;

    assert_eq!(chunks.concat(), "Hello there, friend.");
    assert!(chunks.len() > 1);
    assert_eq!(reply.text, "Hello there, friend.");
    assert_eq!(reply.usage, Some(common::usage()));
    assert_eq!(agent.history()[1].content(), "Hello there, friend.");
}

#[tokio::test]
async fn broken_stream_leaves_history_untouched() {
    let provider = CaptureProvider::new();
    provider.queue_broken_stream("Partial ans");
    let mut agent = provider.agent();

    let mut streamed = String::new();
    let reply = agent
        .send_streaming("Hi", None, |chunk| streamed.push_str(chunk))
        .await;

    assert_eq!(streamed, "Partial ans");
    assert!(reply.is_error());
    assert!(reply.text.contains("connection reset"));
    assert_eq!(reply.usage, None);
    assert!(agent.history().is_empty());
}

#[tokio::test]
async fn streaming_connect_failure_is_reported() {
    let provider = CaptureProvider::new();
    provider.queue_failure(429, "quota exceeded");
    let mut agent = provider.agent();

    let reply = agent.send_streaming("Hi", None, |_| {}).await;

    assert!(reply.text.starts_with("Error: "));
    assert!(agent.history().is_empty());
}

#[tokio::test]
async fn empty_answer_is_reported_and_not_stored() {
    let provider = CaptureProvider::new();
    provider.queue_response("");
    let mut agent = provider.agent();

    let reply = agent.send("Hi", None).await;

    assert!(reply.is_error());
    assert_eq!(reply.usage, None);
    assert!(agent.history().is_empty());
}
