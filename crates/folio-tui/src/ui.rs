use folio_core::content::{
    EXAMPLE_QUESTIONS, HEADER_SUBTITLE, HEADER_TITLE, INPUT_PLACEHOLDER, WELCOME_MESSAGE,
};
use folio_core::{ChatRole, SessionSnapshot};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::App;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

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

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let snapshot = app.session.snapshot();

    let header_height = if app.fullscreen { 0 } else { 2 };
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(header_height),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    if !app.fullscreen {
        render_header(frame, header_area);
    }
    render_chat(app, &snapshot, frame, chat_area);
    render_input(app, &snapshot, frame, input_area);
    render_footer(app, &snapshot, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", HEADER_TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let subtitle = Line::from(Span::styled(
        format!(" {}", HEADER_SUBTITLE),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Text::from(vec![title, subtitle]))
        .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, snapshot: &SessionSnapshot, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let title = if app.fullscreen {
        format!(" {} ", HEADER_TITLE)
    } else {
        " Chat ".to_string()
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let chat_text = if snapshot.messages.is_empty() {
        welcome_text(app)
    } else {
        let mut lines: Vec<Line> = Vec::new();
        let last_index = snapshot.messages.len() - 1;

        for (index, msg) in snapshot.messages.iter().enumerate() {
            let speaking_marker = if snapshot.speaking == Some(msg.id) {
                Span::styled(" [speaking]", Style::default().fg(Color::Magenta))
            } else {
                Span::raw("")
            };

            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.clone()));
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            "AI:",
                            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                        ),
                        speaking_marker,
                    ]));

                    let waiting = index == last_index && msg.content.is_empty() && snapshot.loading;
                    if waiting {
                        // Animated ellipsis: cycles through ".", "..", "..."
                        let dots = ".".repeat((app.animation_frame as usize) + 1);
                        lines.push(Line::from(Span::styled(
                            format!("Thinking{}", dots),
                            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                        )));
                    } else {
                        for line in msg.content.lines() {
                            lines.push(parse_markdown_line(line));
                        }
                    }
                }
            }
            lines.push(Line::default());
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn welcome_text(app: &App) -> Text<'static> {
    let mut lines = vec![
        Line::from(Span::styled(WELCOME_MESSAGE, Style::default().fg(Color::White))),
        Line::default(),
    ];

    if app.examples_visible() {
        lines.push(Line::from(Span::styled(
            "Try asking:",
            Style::default().fg(Color::DarkGray),
        )));
        for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::raw(" "),
                Span::styled(*question, Style::default().fg(Color::Cyan)),
            ]));
        }
    }

    Text::from(lines)
}

fn render_input(app: &App, snapshot: &SessionSnapshot, frame: &mut Frame, area: Rect) {
    let border_color = if snapshot.loading {
        Color::DarkGray
    } else if snapshot.listening {
        Color::Red
    } else {
        Color::Yellow
    };
    let title = if snapshot.listening {
        " Listening... (Ctrl-V to stop) "
    } else {
        " Message (Enter to send) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor.min(snapshot.input.chars().count());

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if snapshot.input.is_empty() {
        Paragraph::new(INPUT_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = snapshot
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if app.notice.is_none() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, snapshot: &SessionSnapshot, frame: &mut Frame, area: Rect) {
    let mode_style = if snapshot.loading {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };
    let mode_text = if snapshot.loading { " STREAMING " } else { " CHAT " };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::raw(" "),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ^V ", key_style),
        Span::styled(if snapshot.listening { " stop mic " } else { " voice " }, label_style),
        Span::styled(" ^S ", key_style),
        Span::styled(if snapshot.speaking.is_some() { " stop " } else { " speak " }, label_style),
        Span::styled(" ^F ", key_style),
        Span::styled(if app.fullscreen { " exit fullscreen " } else { " fullscreen " }, label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    if snapshot.listening {
        spans.push(Span::styled(" ● REC ", Style::default().fg(Color::Red).bold()));
    }
    spans.push(Span::styled(
        format!(" {} ", app.endpoint),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice (Enter to dismiss) ");

    let body = Paragraph::new(notice.to_string())
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(body, popup_area);
}
