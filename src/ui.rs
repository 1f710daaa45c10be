use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Sparkline, Wrap,
    },
    Frame,
};

use crate::app::{App, InputMode, ProfileField, Screen};
use crate::models::{EnglishLevel, KnowledgeItem, Sender};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Progress => render_progress_screen(app, frame, body_area),
        Screen::Knowledge => render_knowledge_screen(app, frame, body_area),
        Screen::Profile => render_profile_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_feedback {
        render_feedback_popup(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let offline_indicator = if app.offline { " [offline]" } else { "" };

    let title = Line::from(vec![
        Span::styled(" Lingua ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(
                "{} ({})",
                app.profile.username,
                app.profile.english_level.as_str()
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(offline_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Chat => " CHAT ",
        Screen::Progress => " PROGRESS ",
        Screen::Knowledge => " KNOWLEDGE ",
        Screen::Profile => " PROFILE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.show_feedback {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" v ", key_style),
            Span::styled(" hear ", label_style),
            Span::styled(" w ", key_style),
            Span::styled(" practice ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Chat, InputMode::Normal) => vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" select ", label_style),
                Span::styled(" v ", key_style),
                Span::styled(" hear ", label_style),
                Span::styled(" p ", key_style),
                Span::styled(" pronounce ", label_style),
                Span::styled(" 1-4 ", key_style),
                Span::styled(" screens ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Chat, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ],
            (Screen::Progress, _) => vec![
                Span::styled(" r ", key_style),
                Span::styled(" refresh ", label_style),
                Span::styled(" 1-4 ", key_style),
                Span::styled(" screens ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Knowledge, _) => vec![
                Span::styled(" f ", key_style),
                Span::styled(" filter ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" select ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" refresh ", label_style),
                Span::styled(" 1-4 ", key_style),
                Span::styled(" screens ", label_style),
            ],
            (Screen::Profile, InputMode::Normal) => vec![
                Span::styled(" e ", key_style),
                Span::styled(" edit ", label_style),
                Span::styled(" 1-4 ", key_style),
                Span::styled(" screens ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Profile, InputMode::Editing) => vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" field ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" add ", label_style),
                Span::styled(" Del ", key_style),
                Span::styled(" remove ", label_style),
                Span::styled(" Ctrl-S ", key_style),
                Span::styled(" save ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" cancel ", label_style),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);
    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}

// --- Chat ---------------------------------------------------------------

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store inner dimensions for scroll calculations (minus borders)
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let transcript_text = if app.messages.is_empty() && !app.chat_loading {
        Text::from(Span::styled(
            "Say hello to start practicing...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for (i, msg) in app.messages.iter().enumerate() {
            let selected = app.selected_message_idx == Some(i);
            let (name, name_color) = match msg.sender {
                Sender::User => ("You", Color::Cyan),
                Sender::Assistant => ("Tutor", Color::Yellow),
            };
            let mut header_style = Style::default().fg(name_color).add_modifier(Modifier::BOLD);
            if selected {
                header_style = header_style.add_modifier(Modifier::REVERSED);
            }
            lines.push(Line::from(vec![
                Span::styled(format!("{}:", name), header_style),
                Span::styled(
                    format!(" {}", msg.timestamp.format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            if let Some(analysis) = msg.analysis.as_ref().filter(|a| !a.is_empty()) {
                let mut badges: Vec<Span> = Vec::new();
                if !analysis.positive_aspects.is_empty() {
                    badges.push(Span::styled(
                        format!("+ {}", analysis.positive_aspects.join(", ")),
                        Style::default().fg(Color::Green),
                    ));
                }
                if !analysis.grammar_errors.is_empty() {
                    if !badges.is_empty() {
                        badges.push(Span::raw("  "));
                    }
                    badges.push(Span::styled(
                        format!("! {}", analysis.grammar_errors.join(", ")),
                        Style::default().fg(Color::Red),
                    ));
                }
                if let Some(score) = analysis.confidence_score {
                    if !badges.is_empty() {
                        badges.push(Span::raw("  "));
                    }
                    badges.push(Span::styled(
                        format!("confidence {:.0}%", score * 100.0),
                        Style::default().fg(Color::Magenta),
                    ));
                }
                if !badges.is_empty() {
                    lines.push(Line::from(badges));
                }
            }
            lines.push(Line::default());
        }

        if app.chat_loading {
            lines.push(Line::from(Span::styled(
                "Tutor:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Typing{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // Same wrap-aware estimate that scroll_chat_to_bottom uses, so the
    // scrollbar range matches the scroll position
    let total_lines = app.chat_total_lines();
    let transcript = Paragraph::new(transcript_text)
        .block(transcript_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, transcript_area);

    if total_lines > app.chat_height {
        let mut scrollbar_state = ScrollbarState::new(
            total_lines.saturating_sub(app.chat_height) as usize,
        )
        .position(app.chat_scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        frame.render_stateful_widget(
            scrollbar,
            transcript_area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    // Input box at the bottom
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Message ('i' to type) ");

    // Horizontal scroll keeps the cursor visible in a narrow box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };
    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

// --- Progress dashboard -------------------------------------------------

fn render_progress_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(records) = app.progress.clone() else {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let placeholder = Paragraph::new(format!("Loading your progress{}", dots))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Progress "));
        frame.render_widget(placeholder, area);
        return;
    };

    let [stats_area, gauges_area, spark_area, insights_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    render_stat_cards(&records, frame, stats_area);
    render_skill_gauges(&records, frame, gauges_area);
    render_confidence_sparkline(&records, frame, spark_area);
    render_insights(app, frame, insights_area);
}

fn render_stat_cards(records: &[crate::models::ProgressRecord], frame: &mut Frame, area: Rect) {
    let total_messages: u32 = records.iter().map(|r| r.messages_sent).sum();
    let total_minutes: u32 = records.iter().map(|r| r.conversation_duration).sum();
    let latest_overall = records.last().map(|r| r.overall()).unwrap_or(0.0);

    let cards: [(String, &str); 4] = [
        (records.len().to_string(), "days tracked"),
        (total_messages.to_string(), "messages"),
        (format!("{}m", total_minutes), "practice time"),
        (format!("{:.0}%", latest_overall * 100.0), "overall"),
    ];

    let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((value, label), card_area) in cards.iter().zip(areas.iter()) {
        let card = Paragraph::new(Line::from(vec![
            Span::styled(
                value.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(*label, Style::default().fg(Color::DarkGray)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(card, *card_area);
    }
}

fn render_skill_gauges(records: &[crate::models::ProgressRecord], frame: &mut Frame, area: Rect) {
    let Some(latest) = records.last() else {
        return;
    };

    let skills: [(&str, f64, Color); 4] = [
        ("Vocabulary", latest.vocabulary_score, Color::Cyan),
        ("Grammar", latest.grammar_score, Color::Green),
        ("Fluency", latest.fluency_score, Color::Yellow),
        ("Pronunciation", latest.pronunciation_score, Color::Magenta),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Skills today ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(1); 4]).split(inner);
    for ((name, score, color), row) in skills.iter().zip(rows.iter()) {
        let [label_area, gauge_area] =
            Layout::horizontal([Constraint::Length(15), Constraint::Min(0)]).areas(*row);
        frame.render_widget(Paragraph::new(*name), label_area);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(*color))
            .ratio(score.clamp(0.0, 1.0))
            .label(format!("{:.0}%", score * 100.0));
        frame.render_widget(gauge, gauge_area);
    }
}

fn render_confidence_sparkline(
    records: &[crate::models::ProgressRecord],
    frame: &mut Frame,
    area: Rect,
) {
    let data: Vec<u64> = records
        .iter()
        .map(|r| (r.confidence_score.clamp(0.0, 1.0) * 100.0) as u64)
        .collect();

    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Confidence trend "),
        )
        .style(Style::default().fg(Color::Green))
        .data(&data);
    frame.render_widget(sparkline, area);
}

fn render_insights(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Insights ");

    let Some(insights) = &app.insights else {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let placeholder = Paragraph::new(format!("Gathering insights{}", dots))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    if !insights.overall_progress.is_empty() {
        lines.push(Line::from(insights.overall_progress.clone()));
        lines.push(Line::default());
    }

    let sections: [(&str, &Vec<String>, Color); 4] = [
        ("Strengths", &insights.strengths, Color::Green),
        (
            "Areas to improve",
            &insights.areas_for_improvement,
            Color::Yellow,
        ),
        ("Achievements", &insights.achievements, Color::Cyan),
        ("Next goals", &insights.next_goals, Color::Magenta),
    ];
    for (title, entries, color) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(Line::from(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for entry in entries {
            lines.push(Line::from(format!("  - {}", entry)));
        }
        lines.push(Line::default());
    }

    if !insights.motivation_message.is_empty() {
        lines.push(Line::from(Span::styled(
            insights.motivation_message.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// --- Knowledge cloud ----------------------------------------------------

fn mastery_style(item: &KnowledgeItem) -> Style {
    if item.mastery_level >= 0.8 {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if item.mastery_level >= 0.6 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Red)
    }
}

fn render_knowledge_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    if app.knowledge.is_none() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let placeholder = Paragraph::new(format!("Loading your knowledge{}", dots))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Knowledge "));
        frame.render_widget(placeholder, area);
        return;
    }

    let [filter_area, body_area, detail_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(4),
    ])
    .areas(area);

    // Filter tabs
    use crate::app::KnowledgeFilter;
    let filters = [
        KnowledgeFilter::All,
        KnowledgeFilter::Words,
        KnowledgeFilter::Phrases,
        KnowledgeFilter::Topics,
    ];
    let mut tab_spans: Vec<Span> = vec![Span::raw(" ")];
    for filter in filters {
        let style = if filter == app.knowledge_filter {
            Style::default().bg(Color::Cyan).fg(Color::Black)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(format!(" {} ", filter.label()), style));
        tab_spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(tab_spans)), filter_area);

    let filtered = app.filtered_knowledge();
    let mastered = filtered.iter().filter(|i| i.mastery_level >= 0.8).count();

    // Word cloud on the left, selectable list on the right
    let [cloud_area, list_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .areas(body_area);

    let mut cloud_spans: Vec<Span> = Vec::new();
    for item in &filtered {
        cloud_spans.push(Span::styled(item.content.clone(), mastery_style(item)));
        cloud_spans.push(Span::raw("   "));
    }
    let cloud = Paragraph::new(Line::from(cloud_spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(
                    " Cloud ({} items, {} mastered) ",
                    filtered.len(),
                    mastered
                )),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(cloud, cloud_area);

    let items: Vec<ListItem> = filtered
        .iter()
        .map(|item| {
            ListItem::new(Line::from(vec![
                Span::styled(item.content.clone(), mastery_style(item)),
                Span::styled(
                    format!("  {} ({:.0}%)", item.mastery_label(), item.mastery_level * 100.0),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    let selected = app
        .knowledge_state
        .selected()
        .and_then(|i| filtered.get(i))
        .map(|item| (*item).clone());

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Items "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.knowledge_state);

    // Detail for the selected item
    let detail_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Detail ");
    let detail_text = match selected {
        Some(item) => {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    item.content.clone(),
                    mastery_style(&item).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  [{} / {}]", item.item_type.as_str(), item.category),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];
            lines.push(Line::from(format!(
                "Seen {} times, used correctly {} times ({} difficulty)",
                item.times_encountered, item.times_used_correctly, item.difficulty
            )));
            Text::from(lines)
        }
        None => Text::from(Span::styled(
            "Select an item with j/k",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(detail_text).block(detail_block), detail_area);
}

// --- Profile ------------------------------------------------------------

fn render_profile_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    if app.is_editing_profile() {
        render_profile_edit(app, frame, area);
    } else {
        render_profile_view(app, frame, area);
    }
}

fn render_profile_view(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Profile ('e' to edit) ");

    let label_style = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Username: ", label_style),
            Span::styled(
                app.profile.username.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Email:    ", label_style),
            Span::raw(app.profile.email.clone()),
        ]),
        Line::from(vec![
            Span::styled("Level:    ", label_style),
            Span::styled(
                app.profile.english_level.as_str().to_string(),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("  {}", app.profile.english_level.description()),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("Interests: ", label_style),
            Span::raw(app.profile.interests.join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Goals:     ", label_style),
            Span::raw(app.profile.goals.join(", ")),
        ]),
    ];

    if let Some(status) = &app.profile_status {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn field_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title))
}

fn render_profile_edit(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(draft) = app.draft.clone() else {
        return;
    };

    let [username_area, email_area, level_area, tags_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let username = Paragraph::new(draft.username.clone()).block(field_block(
        "Username",
        app.profile_field == ProfileField::Username,
    ));
    frame.render_widget(username, username_area);

    let email = Paragraph::new(draft.email.clone()).block(field_block(
        "Email",
        app.profile_field == ProfileField::Email,
    ));
    frame.render_widget(email, email_area);

    let mut level_spans: Vec<Span> = Vec::new();
    for level in EnglishLevel::all() {
        let style = if level == draft.english_level {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        level_spans.push(Span::styled(format!(" {} ", level.as_str()), style));
    }
    level_spans.push(Span::styled(
        format!("  {}", draft.english_level.description()),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));
    let level_line = Line::from(level_spans);
    let level = Paragraph::new(level_line).block(field_block(
        "Level (Left/Right)",
        app.profile_field == ProfileField::Level,
    ));
    frame.render_widget(level, level_area);

    // Interests and goals side by side, each with its add-field as the title
    let [interests_area, goals_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(tags_area);

    let interest_title = if app.profile_field == ProfileField::NewInterest {
        format!("Interests - add: {}_", draft.new_interest)
    } else {
        "Interests".to_string()
    };
    let interest_items: Vec<ListItem> = draft
        .interests
        .iter()
        .map(|tag| ListItem::new(format!(" {} ", tag)))
        .collect();
    let interests = List::new(interest_items)
        .block(field_block(
            &interest_title,
            app.profile_field == ProfileField::NewInterest,
        ))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");
    frame.render_stateful_widget(interests, interests_area, &mut app.interests_state);

    let goal_title = if app.profile_field == ProfileField::NewGoal {
        format!("Goals - add: {}_", draft.new_goal)
    } else {
        "Goals".to_string()
    };
    let goal_items: Vec<ListItem> = draft
        .goals
        .iter()
        .map(|tag| ListItem::new(format!(" {} ", tag)))
        .collect();
    let goals = List::new(goal_items)
        .block(field_block(
            &goal_title,
            app.profile_field == ProfileField::NewGoal,
        ))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");
    frame.render_stateful_widget(goals, goals_area, &mut app.goals_state);

    let status = app.profile_status.clone().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Yellow)),
        status_area,
    );
}

// --- Pronunciation feedback popup ---------------------------------------

fn render_feedback_popup(app: &mut App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = (area.height * 4 / 5).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Pronunciation coach (Esc to close) ");

    if app.feedback_loading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let placeholder = Paragraph::new(format!("Analyzing your sentence{}", dots))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, popup_area);
        return;
    }

    let Some(feedback) = app.feedback.clone() else {
        frame.render_widget(Paragraph::new("").block(block), popup_area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("\"", Style::default().fg(Color::DarkGray)),
        Span::styled(app.feedback_text.clone(), Style::default().fg(Color::Cyan)),
        Span::styled("\"", Style::default().fg(Color::DarkGray)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Score: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.0}%", feedback.pronunciation.overall_score * 100.0),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    ]));
    if !feedback.pronunciation.encouragement.is_empty() {
        lines.push(Line::from(Span::styled(
            feedback.pronunciation.encouragement.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::default());

    if !feedback.pronunciation.difficult_words.is_empty() {
        lines.push(Line::from(Span::styled(
            "Tricky words",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for word in &feedback.pronunciation.difficult_words {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", word.word),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(word.phonetic.clone(), Style::default().fg(Color::Magenta)),
            ]));
            if !word.tips.is_empty() {
                lines.push(Line::from(format!("    {}", word.tips)));
            }
        }
        lines.push(Line::default());
    }

    if !feedback.pronunciation.sound_focus_areas.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sounds to practice",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for sound in &feedback.pronunciation.sound_focus_areas {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", sound.sound),
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                ),
                Span::raw(sound.description.clone()),
            ]));
            if !sound.practice_words.is_empty() {
                lines.push(Line::from(format!(
                    "    Try: {}",
                    sound.practice_words.join(", ")
                )));
            }
            if !sound.tip.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    {}", sound.tip),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines.push(Line::default());
    }

    if !feedback.personalized_tips.is_empty() {
        lines.push(Line::from(Span::styled(
            "Tips for you",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for tip in &feedback.personalized_tips {
            lines.push(Line::from(format!("  - {}", tip)));
        }
        lines.push(Line::default());
    }

    if let Some(exercises) = &app.exercises {
        lines.push(Line::from(Span::styled(
            "Practice exercises",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for exercise in &exercises.warm_up_exercises {
            lines.push(Line::from(Span::styled(
                format!("  {}", exercise.title),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if !exercise.description.is_empty() {
                lines.push(Line::from(format!("    {}", exercise.description)));
            }
            for example in &exercise.examples {
                lines.push(Line::from(Span::styled(
                    format!("    \"{}\"", example),
                    Style::default().fg(Color::Cyan),
                )));
            }
        }
        if let Some(plan) = &exercises.daily_practice_plan {
            lines.push(Line::from(Span::styled(
                format!("  Daily plan ({})", plan.duration),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for step in &plan.sequence {
                lines.push(Line::from(format!("    - {}", step)));
            }
        }
    }

    let total_lines = lines.len() as u16;
    let inner_height = popup_height.saturating_sub(2);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.feedback_scroll, 0));
    frame.render_widget(paragraph, popup_area);

    if total_lines > inner_height {
        let mut scrollbar_state =
            ScrollbarState::new(total_lines.saturating_sub(inner_height) as usize)
                .position(app.feedback_scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        frame.render_stateful_widget(
            scrollbar,
            popup_area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}
