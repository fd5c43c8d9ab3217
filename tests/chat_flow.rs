//! Chat view state machine tests: submit guards, in-place message
//! patching, and the scroll affordance. No terminal and no network;
//! worker updates are injected as `ApiEvent`s.

use lookuply_tui::api::Source;
use lookuply_tui::app::{ApiEvent, App, ChatMessage, ChatRole, InputMode, NO_RESULTS_MESSAGE};
use lookuply_tui::config::Config;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn new_app() -> (App, UnboundedReceiver<ApiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (App::new(&Config::new(), tx), rx)
}

fn type_query(app: &mut App, text: &str) {
    app.query_input = text.to_string();
    app.query_cursor = app.query_input.chars().count();
}

fn source(id: &str, title: &str) -> Source {
    Source {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://example.com/{}", id),
        snippet: "snippet".to_string(),
        relevance_score: 0.8,
    }
}

#[test]
fn empty_or_whitespace_submit_is_ignored() {
    let (mut app, _rx) = new_app();

    type_query(&mut app, "");
    assert!(app.begin_query().is_none());

    type_query(&mut app, "   \t ");
    assert!(app.begin_query().is_none());

    assert!(app.chat_messages.is_empty());
    assert!(!app.query_loading);
    // Rejected input stays in the box
    assert_eq!(app.query_input, "   \t ");
}

#[test]
fn submit_trims_appends_and_clears() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "  capital of france  ");

    let pending = app.begin_query().expect("valid query accepted");
    assert_eq!(pending.query, "capital of france");

    assert_eq!(app.chat_messages.len(), 2);
    let user = &app.chat_messages[0];
    assert_eq!(user.role, ChatRole::User);
    assert_eq!(user.content.as_deref(), Some("capital of france"));

    let assistant = &app.chat_messages[1];
    assert_eq!(assistant.role, ChatRole::Assistant);
    assert_eq!(assistant.id, pending.message_id);
    assert!(assistant.content.is_none());
    assert!(assistant.sources.is_empty());
    assert!(assistant.loading_answer);
    assert!(assistant.error.is_none());

    assert!(app.query_loading);
    assert_eq!(app.query_input, "");
    assert_eq!(app.query_cursor, 0);
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn second_submit_rejected_while_in_flight() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "first");
    assert!(app.begin_query().is_some());

    type_query(&mut app, "second");
    assert!(app.begin_query().is_none());

    // Only the first query's two messages exist
    assert_eq!(app.chat_messages.len(), 2);
    assert_eq!(app.query_input, "second");
}

#[test]
fn sources_patch_lands_before_answer() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "capital of france");
    let pending = app.begin_query().unwrap();

    app.apply_api_event(ApiEvent::SourcesLoaded {
        message_id: pending.message_id,
        sources: vec![source("s1", "First"), source("s2", "Second")],
        answer_pending: true,
    });

    let assistant = &app.chat_messages[1];
    assert_eq!(assistant.sources.len(), 2);
    assert!(assistant.content.is_none());
    assert!(assistant.loading_answer);
    assert!(app.query_loading, "answer still pending");

    app.apply_api_event(ApiEvent::AnswerReady {
        message_id: pending.message_id,
        answer: "**Paris** is the capital of France.".to_string(),
    });

    let assistant = &app.chat_messages[1];
    assert_eq!(assistant.sources.len(), 2);
    assert_eq!(
        assistant.content.as_deref(),
        Some("**Paris** is the capital of France.")
    );
    assert!(!assistant.loading_answer);
    assert!(!app.query_loading);
    assert_eq!(app.input_mode, InputMode::Editing);
}

#[test]
fn empty_search_shows_no_results_message() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "gibberish");
    let pending = app.begin_query().unwrap();

    app.apply_api_event(ApiEvent::SourcesLoaded {
        message_id: pending.message_id,
        sources: Vec::new(),
        answer_pending: false,
    });

    let assistant = &app.chat_messages[1];
    assert_eq!(assistant.content.as_deref(), Some(NO_RESULTS_MESSAGE));
    assert!(assistant.sources.is_empty());
    assert!(!assistant.loading_answer);
    assert!(assistant.error.is_none());

    assert!(!app.query_loading);
    assert_eq!(app.input_mode, InputMode::Editing);
}

#[test]
fn failure_sets_error_and_unblocks_input() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "flaky backend");
    let pending = app.begin_query().unwrap();

    app.apply_api_event(ApiEvent::QueryFailed {
        message_id: pending.message_id,
        error: "Search failed: 500 Internal Server Error".to_string(),
    });

    let assistant = &app.chat_messages[1];
    assert_eq!(
        assistant.error.as_deref(),
        Some("Search failed: 500 Internal Server Error")
    );
    assert!(assistant.content.is_none());
    assert!(!assistant.loading_answer);

    assert!(!app.query_loading);
    assert_eq!(app.input_mode, InputMode::Editing);

    // A new query is accepted afterwards
    type_query(&mut app, "retry");
    assert!(app.begin_query().is_some());
}

#[test]
fn message_ids_are_unique_and_increasing() {
    let (mut app, _rx) = new_app();

    type_query(&mut app, "one");
    let first = app.begin_query().unwrap();
    app.apply_api_event(ApiEvent::QueryFailed {
        message_id: first.message_id,
        error: "boom".to_string(),
    });

    type_query(&mut app, "two");
    let second = app.begin_query().unwrap();

    let ids: Vec<u64> = app.chat_messages.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 4);
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert!(first.message_id < second.message_id);
}

#[test]
fn terminal_event_for_unknown_id_still_clears_loading() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "question");
    let pending = app.begin_query().unwrap();

    app.apply_api_event(ApiEvent::AnswerReady {
        message_id: pending.message_id + 1000,
        answer: "orphaned".to_string(),
    });

    // Placeholder untouched, but the input is not wedged
    let assistant = &app.chat_messages[1];
    assert!(assistant.content.is_none());
    assert!(assistant.loading_answer);
    assert!(!app.query_loading);
    assert_eq!(app.input_mode, InputMode::Editing);
}

#[test]
fn health_probe_updates_indicator_only() {
    let (mut app, _rx) = new_app();
    assert_eq!(app.backend_online, None);

    app.apply_api_event(ApiEvent::HealthChecked { online: true });
    assert_eq!(app.backend_online, Some(true));
    assert!(app.chat_messages.is_empty());
    assert!(!app.query_loading);

    app.apply_api_event(ApiEvent::HealthChecked { online: false });
    assert_eq!(app.backend_online, Some(false));
}

#[test]
fn jump_hint_appears_only_when_scrolled_away() {
    let (mut app, _rx) = new_app();
    app.total_chat_lines = 50;
    app.chat_height = 10;

    // Pinned to the bottom
    app.chat_scroll = 40;
    assert_eq!(app.distance_from_bottom(), 0);
    assert!(!app.show_jump_hint());

    // Within the follow distance
    app.chat_scroll = 37;
    assert_eq!(app.distance_from_bottom(), 3);
    assert!(!app.show_jump_hint());

    // Scrolled up past the threshold
    app.chat_scroll = 20;
    assert_eq!(app.distance_from_bottom(), 20);
    assert!(app.show_jump_hint());
}

#[test]
fn incoming_patch_keeps_view_pinned_at_bottom() {
    let (mut app, _rx) = new_app();
    app.chat_height = 5;
    app.chat_width = 40;

    type_query(&mut app, "long transcript");
    let pending = app.begin_query().unwrap();
    assert_eq!(app.distance_from_bottom(), 0, "submit scrolls to bottom");

    app.apply_api_event(ApiEvent::SourcesLoaded {
        message_id: pending.message_id,
        sources: vec![
            source("s1", "First"),
            source("s2", "Second"),
            source("s3", "Third"),
            source("s4", "Fourth"),
        ],
        answer_pending: true,
    });

    assert!(app.total_chat_lines > app.chat_height);
    assert_eq!(app.distance_from_bottom(), 0, "still pinned after patch");
}

#[test]
fn line_estimate_saturates_on_huge_transcripts() {
    let (mut app, _rx) = new_app();
    app.chat_height = 10;
    app.chat_width = 80;

    // One turn with far more content lines than the u16 estimate can hold
    app.chat_messages.push(ChatMessage {
        id: 0,
        role: ChatRole::Assistant,
        content: Some("line\n".repeat(70_000)),
        sources: Vec::new(),
        loading_answer: false,
        error: None,
    });

    app.scroll_chat_to_bottom();

    assert_eq!(app.total_chat_lines, u16::MAX);
    assert_eq!(app.chat_scroll, u16::MAX - 10);
    assert_eq!(app.distance_from_bottom(), 0);
}

#[test]
fn patch_leaves_scroll_alone_when_reading_history() {
    let (mut app, _rx) = new_app();
    type_query(&mut app, "question");
    let pending = app.begin_query().unwrap();

    // Simulate a tall transcript scrolled back to the top
    app.total_chat_lines = 60;
    app.chat_height = 10;
    app.chat_scroll = 0;

    app.apply_api_event(ApiEvent::AnswerReady {
        message_id: pending.message_id,
        answer: "late answer".to_string(),
    });

    assert_eq!(app.chat_scroll, 0);
}
