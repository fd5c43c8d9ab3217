use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{ChatRequest, SearchApiClient, SearchRequest, SummarizeRequest};
use crate::app::{ApiEvent, App, InputMode, PendingQuery};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus the input box
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            // Cursor at end of existing text
            app.query_cursor = app.query_input.chars().count();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Jump to top/bottom of the transcript
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if let Some(pending) = app.begin_query() {
                spawn_query(app, pending);
            }
        }
        KeyCode::Backspace => {
            if app.query_cursor > 0 {
                app.query_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.query_input.chars().count();
            if app.query_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.query_cursor = app.query_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.query_input.chars().count();
            app.query_cursor = (app.query_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.query_cursor = 0;
        }
        KeyCode::End => {
            app.query_cursor = app.query_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
            app.query_input.insert(byte_pos, c);
            app.query_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

/// Spawn a background worker for a validated submission.
fn spawn_query(app: &App, pending: PendingQuery) {
    let api = app.api.clone();
    let language = app.language.clone();
    let limit = app.source_limit;
    let progressive = app.progressive;
    let tx = app.update_tx.clone();

    tokio::spawn(async move {
        run_query(api, language, limit, progressive, pending, tx).await;
    });
}

/// One query round trip: search then summarize, or the combined chat
/// endpoint in legacy mode. Progress is reported as `ApiEvent`s; sources
/// always arrive before the answer. No summarize call is made when the
/// search comes back empty.
pub async fn run_query(
    api: SearchApiClient,
    language: String,
    limit: Option<usize>,
    progressive: bool,
    pending: PendingQuery,
    tx: UnboundedSender<ApiEvent>,
) {
    let PendingQuery { message_id, query } = pending;

    if !progressive {
        match api.chat(&ChatRequest { query, limit }).await {
            Ok(response) => {
                let answer_pending = !response.sources.is_empty();
                let _ = tx.send(ApiEvent::SourcesLoaded {
                    message_id,
                    sources: response.sources,
                    answer_pending,
                });
                if answer_pending {
                    let _ = tx.send(ApiEvent::AnswerReady {
                        message_id,
                        answer: response.answer,
                    });
                }
            }
            Err(err) => {
                let _ = tx.send(ApiEvent::QueryFailed {
                    message_id,
                    error: err.to_string(),
                });
            }
        }
        return;
    }

    let search_response = match api
        .search(&SearchRequest {
            query: query.clone(),
            language: language.clone(),
            limit,
        })
        .await
    {
        Ok(response) => response,
        Err(err) => {
            let _ = tx.send(ApiEvent::QueryFailed {
                message_id,
                error: err.to_string(),
            });
            return;
        }
    };

    let source_ids: Vec<String> = search_response
        .sources
        .iter()
        .map(|source| source.id.clone())
        .collect();
    let answer_pending = !source_ids.is_empty();

    let _ = tx.send(ApiEvent::SourcesLoaded {
        message_id,
        sources: search_response.sources,
        answer_pending,
    });

    if !answer_pending {
        return;
    }

    match api
        .summarize(&SummarizeRequest {
            query,
            language,
            query_id: search_response.query_id,
            source_ids,
        })
        .await
    {
        Ok(response) => {
            let _ = tx.send(ApiEvent::AnswerReady {
                message_id,
                answer: response.answer,
            });
        }
        Err(err) => {
            let _ = tx.send(ApiEvent::QueryFailed {
                message_id,
                error: err.to_string(),
            });
        }
    }
}

/// Probe the backend once at startup for the header indicator.
pub fn spawn_health_probe(api: SearchApiClient, tx: UnboundedSender<ApiEvent>) {
    tokio::spawn(async move {
        let online = api.health().await.is_ok();
        let _ = tx.send(ApiEvent::HealthChecked { online });
    });
}
