use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use corprag_core::{ChatRole, View, ViewEntry};
use crate::app::{App, InputMode};

const PLACEHOLDER: &str = "Ask a question about company policies...";
const DISCLAIMER: &str = "AI-generated answers may vary. Always verify with official documents.";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // Not a bold run, keep the markers as typed
                current_text.push_str("**");
                current_text.push_str(&bold_text);
                if found_close {
                    current_text.push_str("**");
                }
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Wrap the transcript the way the chat pane renders it.
fn chat_paragraph(lines: Vec<Line<'static>>) -> Paragraph<'static> {
    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
}

/// Rows the transcript occupies once wrapped at `width`.
fn wrapped_rows(lines: &[Line<'static>], width: u16) -> u16 {
    let rows = chat_paragraph(lines.to_vec()).line_count(width);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Build the chat transcript.
fn chat_lines(view: &View) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for entry in &view.entries {
        match entry {
            ViewEntry::Message(msg) => {
                let label = match msg.role() {
                    ChatRole::User => Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    ChatRole::Assistant => Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                };
                lines.push(Line::from(label));

                for line in msg.content().lines() {
                    lines.push(match msg.role() {
                        ChatRole::User => Line::from(line.to_string()),
                        ChatRole::Assistant => parse_markdown_line(line),
                    });
                }
                lines.push(Line::default());
            }
            ViewEntry::Loading => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    "Thinking...",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let view = app.session.view();
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(2),
    ])
    .areas(area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(30),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_sidebar(&view, frame, sidebar_area);
    render_chat(app, &view, frame, main_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" CorpRAG ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.server_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(view: &View, frame: &mut Frame, area: Rect) {
    let [upload_area, kb_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(0),
    ])
    .areas(area);

    let status_style = if view.upload_status == "failed" {
        Style::default().fg(Color::Red)
    } else if view.upload_status.starts_with("ingested") {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };
    let status_text = if view.upload_status.is_empty() {
        Span::styled("Press 'u' to upload", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(view.upload_status.clone(), status_style)
    };

    let upload = Paragraph::new(status_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Upload Document "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(upload, upload_area);

    let items: Vec<ListItem> = if view.knowledge_base.is_empty() {
        vec![ListItem::new(Span::styled(
            " (nothing ingested yet)",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        view.knowledge_base
            .iter()
            .map(|name| ListItem::new(format!(" {} ", name)))
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Knowledge Base "),
    );
    frame.render_widget(list, kb_area);
}

fn render_chat(app: &mut App, view: &View, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing and inner size for scrolling
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let lines = chat_lines(view);
    app.settle_scroll(wrapped_rows(&lines, app.chat_width));

    let chat = chat_paragraph(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Chat "),
        )
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, view, frame, input_area);
}

fn render_input(app: &App, view: &View, frame: &mut Frame, area: Rect) {
    let (title, text, cursor_pos, editing) = match app.input_mode {
        InputMode::Upload => (
            " Upload: path to .pdf, .docx or .txt (Enter to send, Esc to cancel) ",
            app.upload_input.as_str(),
            app.upload_cursor,
            true,
        ),
        InputMode::Editing => (
            if view.awaiting_answer { " Ask (waiting for answer) " } else { " Ask " },
            view.pending_query.as_str(),
            app.query_cursor,
            true,
        ),
        InputMode::Normal => (" Ask (i to type) ", view.pending_query.as_str(), 0, false),
    };

    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;

    // Scroll horizontally to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if text.is_empty() && app.input_mode != InputMode::Upload {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let [hints_area, disclaimer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Upload => (" UPLOAD ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[("i", "ask"), ("u", "upload"), ("j/k", "scroll"), ("G", "bottom"), ("q", "quit")],
        InputMode::Editing => &[("Enter", "send"), ("Esc", "done")],
        InputMode::Upload => &[("Enter", "upload"), ("Esc", "cancel")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Red)));
    } else {
        for (key, label) in hints {
            spans.push(Span::styled(format!(" {} ", key), key_style));
            spans.push(Span::styled(format!(" {} ", label), label_style));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), hints_area);

    let disclaimer = Paragraph::new(Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray)))
        .centered();
    frame.render_widget(disclaimer, disclaimer_area);
}
