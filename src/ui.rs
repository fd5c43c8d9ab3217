use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::{App, ChatRole, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' {
            // Check for ** (bold)
            if chars.peek().map(|(_, c)| *c) == Some('*') {
                // Consume the second *
                chars.next();

                // Push any accumulated plain text
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }

                // Find closing **
                let mut bold_text = String::new();
                let mut found_close = false;

                while let Some((_, c)) = chars.next() {
                    if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                        chars.next(); // consume second *
                        found_close = true;
                        break;
                    }
                    bold_text.push(c);
                }

                if found_close && !bold_text.is_empty() {
                    spans.push(Span::styled(
                        bold_text,
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                } else {
                    // No closing **, treat as literal
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            } else {
                // Single * - could be italic, but for now treat as literal
                current_text.push(c);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_jump_hint() {
        render_jump_hint(frame, chat_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    // Backend indicator: green online, red offline, hollow while probing
    let status = match app.backend_online {
        Some(true) => Span::styled("●", Style::default().fg(Color::Green)),
        Some(false) => Span::styled("●", Style::default().fg(Color::Red)),
        None => Span::styled("○", Style::default().fg(Color::Gray)),
    };

    let title = Line::from(vec![
        Span::styled(" Lookuply ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "Privacy-first AI search ",
            Style::default().fg(Color::Gray),
        ),
        status,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_focused = app.input_mode == InputMode::Normal;
    let border_color = if chat_focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    if app.chat_messages.is_empty() {
        let welcome = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Ask me anything",
                Style::default().fg(Color::Cyan).bold(),
            )),
            Line::from(Span::styled(
                "Get instant answers from the web with AI-powered search",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        let placeholder = Paragraph::new(welcome).block(block).wrap(Wrap { trim: true });
        frame.render_widget(placeholder, area);
        app.total_chat_lines = 0;
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.chat_messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                if let Some(content) = &msg.content {
                    lines.push(Line::from(content.clone()));
                }
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Lookuply:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));

                // Sources arrive before the answer and stay above it
                if !msg.sources.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "Sources:",
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )));
                    for (i, source) in msg.sources.iter().enumerate() {
                        lines.push(Line::from(vec![
                            Span::styled(
                                format!("[{}] ", i + 1),
                                Style::default().fg(Color::Green),
                            ),
                            Span::raw(source.title.clone()),
                            Span::styled(
                                format!(" ({})", source.url),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]));
                        if !source.snippet.is_empty() {
                            lines.push(Line::from(Span::styled(
                                source.snippet.clone(),
                                Style::default().fg(Color::DarkGray),
                            )));
                        }
                    }
                }

                if let Some(content) = &msg.content {
                    // Split answer into lines and parse markdown
                    for line in content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }

                if let Some(error) = &msg.error {
                    lines.push(Line::from(Span::styled(
                        error.clone(),
                        Style::default().fg(Color::Red),
                    )));
                }

                if msg.loading_answer {
                    let label = if msg.sources.is_empty() {
                        "Searching"
                    } else {
                        "Summarizing"
                    };
                    // Animated ellipsis: cycles through ".", "..", "..."
                    let dots = ".".repeat((app.animation_frame as usize) + 1);
                    lines.push(Line::from(Span::styled(
                        format!("{}{}", label, dots),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    )));
                }

                lines.push(Line::default());
            }
        }
    }

    // Estimate wrapped height the same way scroll_chat_to_bottom does
    let wrap_width = app.chat_width.max(1) as usize;
    let mut total_lines: u16 = 0;
    for line in &lines {
        let width = line.width();
        if width == 0 {
            total_lines = total_lines.saturating_add(1);
        } else {
            total_lines = total_lines.saturating_add((width / wrap_width + 1) as u16);
        }
    }
    app.total_chat_lines = total_lines;

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    // Render scrollbar
    if app.total_chat_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_chat_lines as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.query_loading {
        " Ask (waiting for answer) "
    } else {
        " Ask "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " ASK ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" ask ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" G ", key_style),
            Span::styled(" latest ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .chain(std::iter::once(Span::styled(
            " No tracking • No cookies • Privacy-first ",
            Style::default().bg(Color::Black).fg(Color::DarkGray),
        )))
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Small overlay in the transcript's bottom corner when scrolled away
/// from the newest message.
fn render_jump_hint(frame: &mut Frame, chat_area: Rect) {
    use ratatui::widgets::Clear;

    let label = " ↓ latest (G) ";
    let width = label.chars().count() as u16;

    if chat_area.width <= width + 2 || chat_area.height < 3 {
        return;
    }

    let hint_area = Rect::new(
        chat_area.x + chat_area.width - width - 2,
        chat_area.y + chat_area.height - 2,
        width,
        1,
    );

    // Clear the area behind the overlay
    frame.render_widget(Clear, hint_area);

    let hint = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default().bg(Color::Blue).fg(Color::White).bold(),
    )));
    frame.render_widget(hint, hint_area);
}
