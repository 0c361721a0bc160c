//! Render functions for the TUI.
//!
//! The feed is a vertical strip of cards, one viewport tall each, scrolled
//! by `App::scroll_offset`. Only mounted cards are drawn.

use std::borrow::Cow;

use crate::app::{App, PX_PER_COLUMN};
use crate::engine::{
    ContentItem, DragPresentation, FeedbackState, LoadState, Playback, Progress,
};
use crate::util::{compact_count, display_width, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::events::SPINNER_FRAMES;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Widest a card gets on large terminals.
const MAX_CARD_WIDTH: u16 = 72;

/// Cards with fewer visible rows than this are not drawn.
const MIN_VISIBLE_ROWS: u16 = 3;

/// Drag labels appear once their opacity passes this.
const LABEL_VISIBLE: f64 = 0.3;

const SPINNER: [&str; SPINNER_FRAMES] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // EDGE-001: Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    app.set_viewport_height(chunks[1].height);

    match app.engine.load_state() {
        LoadState::Idle => render_message(f, chunks[1], "Press r to load the feed", Color::Gray),
        LoadState::Loading if app.engine.cursor().is_empty() => {
            let text = format!("{} Loading pitches...", SPINNER[app.spinner_frame % SPINNER_FRAMES]);
            render_message(f, chunks[1], &text, Color::Cyan);
        }
        LoadState::Failed(err) => {
            let text = format!("{}\n\nPress r to retry", err);
            render_message(f, chunks[1], &text, Color::Red);
        }
        _ if app.engine.cursor().is_exhausted() => {
            let text = if app.engine.cursor().is_empty() {
                "No pitches to show yet\n\nPress r to refresh"
            } else {
                "You've seen every pitch!\n\nPress r to start over"
            };
            render_message(f, chunks[1], text, Color::Green);
        }
        _ => render_strip(f, app, chunks[1]),
    }

    render_status(f, app, chunks[2]);
}

fn render_message(f: &mut Frame, area: Rect, text: &str, color: Color) {
    let top_pad = area.height.saturating_sub(3) / 2;
    let inner = Rect {
        y: area.y + top_pad,
        height: area.height - top_pad,
        ..area
    };
    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, inner);
}

// ============================================================================
// Header
// ============================================================================

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let cursor = app.engine.cursor();
    let mut spans = vec![
        Span::styled(
            " pitchswipe ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
    ];

    if !cursor.is_empty() {
        let shown = (cursor.position() + 1).min(cursor.len());
        spans.push(Span::styled(
            format!("{}/{} ", shown, cursor.len()),
            Style::default().fg(Color::Gray),
        ));
    }

    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let mute = if app.engine.is_muted() { " muted" } else { "" };
    let room = (area.width as usize).saturating_sub(used + mute.len());
    for marker in cursor.progress().into_iter().take(room) {
        let (glyph, style) = match marker {
            Progress::Seen => ("━", Style::default().fg(Color::DarkGray)),
            Progress::Current => (
                "━",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Progress::Upcoming => ("─", Style::default().fg(Color::DarkGray)),
        };
        spans.push(Span::styled(glyph, style));
    }
    if !mute.is_empty() {
        spans.push(Span::styled(mute, Style::default().fg(Color::Yellow)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ============================================================================
// Card Strip
// ============================================================================

fn render_strip(f: &mut Frame, app: &App, area: Rect) {
    let items = app.engine.cursor().items();
    let card_width = area.width.min(MAX_CARD_WIDTH);
    let base_x = area.x + (area.width - card_width) / 2;

    for index in app.mounted_range() {
        let item = &items[index];
        let top = app.card_top(index) - app.scroll_offset;
        let bottom = top + i64::from(app.card_height);
        let visible_top = top.max(0);
        let visible_bottom = bottom.min(i64::from(area.height));
        if visible_bottom - visible_top < i64::from(MIN_VISIBLE_ROWS) {
            continue;
        }

        let active = app.engine.cursor().is_active(&item.id);
        let drag = if active {
            app.engine.drag_presentation()
        } else {
            None
        };

        let shift = drag
            .map(|d| (d.displacement / PX_PER_COLUMN).round() as i64)
            .unwrap_or(0);
        let x = (i64::from(base_x) + shift)
            .clamp(i64::from(area.x), i64::from(area.x + area.width - card_width));

        let rect = Rect {
            x: x as u16,
            y: area.y + visible_top as u16,
            width: card_width,
            height: (visible_bottom - visible_top) as u16,
        };
        render_card(f, app, item, active, drag, rect);
    }
}

fn render_card(
    f: &mut Frame,
    app: &App,
    item: &ContentItem,
    active: bool,
    drag: Option<DragPresentation>,
    area: Rect,
) {
    let mut border_style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if drag.is_some_and(|d| d.opacity < 0.75) {
        border_style = border_style.add_modifier(Modifier::DIM);
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ", item.category.label()),
            Style::default().fg(category_color(item)),
        ));
    if let Some(d) = drag {
        block = block.title(
            Line::from(format!(" ↻ {:+.0}° ", d.rotation)).alignment(Alignment::Right),
        );
    }

    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text_width = inner.width.saturating_sub(2) as usize;
    let paragraph = Paragraph::new(card_lines(app, item, active, text_width));
    f.render_widget(paragraph, inner.inner(ratatui::layout::Margin::new(1, 0)));

    if let Some(d) = drag {
        render_drag_labels(f, inner, d);
    }
    if active {
        render_feedback(f, inner, item, app.engine.feedback_for(&item.id));
    }
}

fn category_color(item: &ContentItem) -> Color {
    match item.category {
        crate::engine::ItemCategory::Pitch => Color::Magenta,
        crate::engine::ItemCategory::Investment => Color::Green,
    }
}

/// Text that came from another user: escapes stripped, cut to width.
fn clean(s: &str, width: usize) -> String {
    truncate_to_width(&strip_control_chars(s), width).into_owned()
}

fn card_lines(app: &App, item: &ContentItem, active: bool, width: usize) -> Vec<Line<'static>> {
    let owner = &item.owner;
    let title: Cow<'_, str> = match item.title.as_deref() {
        Some(t) if !t.trim().is_empty() => Cow::Borrowed(t),
        _ => Cow::Borrowed("Untitled pitch"),
    };

    let playback = match app.engine.playback(&item.id) {
        Playback::Playing => Span::styled("▶ playing", Style::default().fg(Color::Green)),
        Playback::Paused => Span::styled("⏸ paused", Style::default().fg(Color::DarkGray)),
    };

    let heart = if item.liked_by_viewer {
        Span::styled("♥ ", Style::default().fg(Color::Red))
    } else {
        Span::raw("♡ ")
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("({}) ", owner.initial()),
                Style::default().fg(Color::Black).bg(Color::Gray),
            ),
            Span::styled(
                clean(&owner.display_name, width.saturating_sub(16)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" · {}", owner.user_type.label()),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::styled(
            clean(owner.subtitle(), width),
            Style::default().fg(Color::DarkGray),
        ),
        Line::raw(""),
        Line::styled(
            clean(&title, width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(vec![
            playback,
            Span::raw("  "),
            Span::styled(
                clean(&item.media_ref, width.saturating_sub(14)),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::raw(""),
        Line::from(vec![
            heart,
            Span::raw(compact_count(item.like_count)),
            Span::raw("   views "),
            Span::raw(compact_count(item.view_count)),
        ]),
    ];

    if let Some(bio) = owner.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        lines.push(Line::raw(""));
        lines.push(Line::styled(clean(bio, width), Style::default().fg(Color::Gray)));
    }

    if active {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "← pass   → connect   l like   s share",
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines
}

fn render_drag_labels(f: &mut Frame, area: Rect, drag: DragPresentation) {
    if area.height < 1 || area.width < 10 {
        return;
    }
    if drag.connect_label > LABEL_VISIBLE {
        let label = Paragraph::new(" CONNECT ").style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(label, Rect { width: 9, height: 1, ..area });
    }
    if drag.pass_label > LABEL_VISIBLE {
        let label = Paragraph::new(" PASS ").style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        );
        let x = area.x + area.width - 6;
        f.render_widget(label, Rect { x, width: 6, height: 1, ..area });
    }
}

fn render_feedback(f: &mut Frame, area: Rect, item: &ContentItem, state: FeedbackState) {
    let (text, color) = match state {
        FeedbackState::Idle => return,
        FeedbackState::Like if item.liked_by_viewer => ("♥ Liked", Color::Red),
        FeedbackState::Like => ("♡ Unliked", Color::Gray),
        FeedbackState::Connect => ("Connection request sent", Color::Green),
        FeedbackState::ConnectError => ("Connection failed", Color::Red),
        FeedbackState::Pass => ("✕ Passed", Color::Yellow),
    };

    let width = (display_width(text) as u16 + 4).min(area.width);
    let height = 3.min(area.height);
    let overlay = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
    f.render_widget(Clear, overlay);
    f.render_widget(paragraph, overlay);
}

// ============================================================================
// Status Bar
// ============================================================================

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.engine.drag_presentation().is_some() {
        Cow::Borrowed("[</>]drag [Enter]release [Esc]cancel")
    } else {
        Cow::Borrowed(
            "[←/x]pass [→/c]connect [l]ike [s]hare [space]play [m]ute [j/k]scroll [r]efresh [q]uit",
        )
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let text = truncate_to_width(&text, area.width as usize).into_owned();
    f.render_widget(Paragraph::new(text).style(style), area);
}
