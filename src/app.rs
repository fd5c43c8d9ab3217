use tokio::sync::mpsc::UnboundedSender;

use crate::api::{SearchApiClient, Source};
use crate::config::{Config, DEFAULT_API_URL, DEFAULT_LANGUAGE};

/// Shown in place of an answer when the backend returns zero sources.
pub const NO_RESULTS_MESSAGE: &str = "No results found. Try a different search.";

/// Rows away from the transcript bottom before the "jump to latest"
/// hint appears (and auto-follow of incoming patches stops).
pub const JUMP_HINT_DISTANCE: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: Option<String>,
    pub sources: Vec<Source>,
    pub loading_answer: bool,
    pub error: Option<String>,
}

/// Updates sent back from a query worker (or the health probe) to the
/// main loop. Message patches carry the id of the assistant placeholder
/// they target.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    HealthChecked { online: bool },
    SourcesLoaded {
        message_id: u64,
        sources: Vec<Source>,
        answer_pending: bool,
    },
    AnswerReady { message_id: u64, answer: String },
    QueryFailed { message_id: u64, error: String },
}

/// A validated submission handed to the caller for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub message_id: u64,
    pub query: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub backend_online: Option<bool>,

    // Query input state
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input

    // Chat transcript
    pub chat_messages: Vec<ChatMessage>,
    pub query_loading: bool,
    pub next_message_id: u64,

    // Chat viewport (dimensions updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub total_chat_lines: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend plumbing
    pub api: SearchApiClient,
    pub language: String,
    pub source_limit: Option<usize>,
    pub progressive: bool,
    pub update_tx: UnboundedSender<ApiEvent>,
}

impl App {
    pub fn new(config: &Config, update_tx: UnboundedSender<ApiEvent>) -> Self {
        // Base URL: env var first, then config file, then local default
        let api_url = std::env::var("LOOKUPLY_API_URL")
            .ok()
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let language = config
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            backend_online: None,

            query_input: String::new(),
            query_cursor: 0,

            chat_messages: Vec::new(),
            query_loading: false,
            next_message_id: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            total_chat_lines: 0,

            animation_frame: 0,

            api: SearchApiClient::new(&api_url),
            language,
            source_limit: config.source_limit,
            progressive: config.progressive.unwrap_or(true),
            update_tx,
        }
    }

    /// Validates a submission. On success the transcript gains the user
    /// message and an assistant placeholder, and the returned work should
    /// be handed to a query worker. Returns None when the trimmed input
    /// is empty or a query is already in flight.
    pub fn begin_query(&mut self) -> Option<PendingQuery> {
        let query = self.query_input.trim().to_string();
        if query.is_empty() || self.query_loading {
            return None;
        }

        let user_id = self.next_id();
        self.chat_messages.push(ChatMessage {
            id: user_id,
            role: ChatRole::User,
            content: Some(query.clone()),
            sources: Vec::new(),
            loading_answer: false,
            error: None,
        });

        let message_id = self.next_id();
        self.chat_messages.push(ChatMessage {
            id: message_id,
            role: ChatRole::Assistant,
            content: None,
            sources: Vec::new(),
            loading_answer: true,
            error: None,
        });

        self.query_input.clear();
        self.query_cursor = 0;
        self.query_loading = true;
        self.input_mode = InputMode::Normal;
        self.scroll_chat_to_bottom();

        Some(PendingQuery { message_id, query })
    }

    /// Applies a worker update to the transcript. Terminal events clear
    /// the in-flight flag even when the target message is gone, so the
    /// input can never stay blocked.
    pub fn apply_api_event(&mut self, event: ApiEvent) {
        let follow = self.distance_from_bottom() <= JUMP_HINT_DISTANCE;

        match event {
            ApiEvent::HealthChecked { online } => {
                self.backend_online = Some(online);
                return;
            }
            ApiEvent::SourcesLoaded {
                message_id,
                sources,
                answer_pending,
            } => {
                if let Some(message) = self.message_mut(message_id) {
                    if sources.is_empty() {
                        message.content = Some(NO_RESULTS_MESSAGE.to_string());
                        message.loading_answer = false;
                    } else {
                        message.sources = sources;
                        message.loading_answer = answer_pending;
                    }
                }
                if !answer_pending {
                    self.finish_query();
                }
            }
            ApiEvent::AnswerReady { message_id, answer } => {
                if let Some(message) = self.message_mut(message_id) {
                    message.content = Some(answer);
                    message.loading_answer = false;
                }
                self.finish_query();
            }
            ApiEvent::QueryFailed { message_id, error } => {
                if let Some(message) = self.message_mut(message_id) {
                    message.error = Some(error);
                    message.loading_answer = false;
                }
                self.finish_query();
            }
        }

        if follow {
            self.scroll_chat_to_bottom();
        }
    }

    /// Clears the in-flight flag and hands focus back to the input box.
    pub fn finish_query(&mut self) {
        self.query_loading = false;
        self.input_mode = InputMode::Editing;
        self.query_cursor = self.query_input.chars().count();
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    fn message_mut(&mut self, id: u64) -> Option<&mut ChatMessage> {
        self.chat_messages.iter_mut().find(|m| m.id == id)
    }

    // Transcript scrolling
    pub fn scroll_down(&mut self) {
        if self.chat_scroll < self.total_chat_lines.saturating_sub(self.chat_height) {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max_scroll = self.total_chat_lines.saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.chat_scroll = self.chat_scroll.saturating_sub(half_page);
    }

    /// Rows between the current scroll position and the transcript bottom.
    pub fn distance_from_bottom(&self) -> u16 {
        self.total_chat_lines
            .saturating_sub(self.chat_height)
            .saturating_sub(self.chat_scroll)
    }

    /// Whether the "jump to latest" hint should be drawn.
    pub fn show_jump_hint(&self) -> bool {
        self.distance_from_bottom() > JUMP_HINT_DISTANCE
    }

    /// Scroll the transcript so the newest message (or the loading
    /// indicator) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.chat_messages {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Lookuply:")
            if let Some(content) = &msg.content {
                // Calculate wrapped lines for each line of content
                for line in content.lines() {
                    // Use character count, not byte length, for proper UTF-8 handling
                    let char_count = line.chars().count();
                    if char_count == 0 {
                        total_lines = total_lines.saturating_add(1); // Empty line still takes one line
                    } else {
                        total_lines =
                            total_lines.saturating_add(((char_count / wrap_width) + 1) as u16);
                    }
                }
            }
            if !msg.sources.is_empty() {
                total_lines = total_lines.saturating_add(1); // "Sources:" heading
                for source in &msg.sources {
                    let char_count =
                        source.title.chars().count() + source.url.chars().count() + 7;
                    total_lines =
                        total_lines.saturating_add(((char_count / wrap_width) + 1) as u16);
                    if !source.snippet.is_empty() {
                        let snippet_count = source.snippet.chars().count();
                        total_lines = total_lines
                            .saturating_add(((snippet_count / wrap_width) + 1) as u16);
                    }
                }
            }
            if let Some(error) = &msg.error {
                total_lines = total_lines
                    .saturating_add(((error.chars().count() / wrap_width) + 1) as u16);
            }
            if msg.loading_answer {
                total_lines = total_lines.saturating_add(1); // "Searching..." / "Summarizing..." indicator
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        self.total_chat_lines = total_lines;

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.query_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
