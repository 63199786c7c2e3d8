//! The two-pane messenger screen.
//!
//! ```text
//! ┌─ Conversations ─┐┌─ bob ──────────────────────────┐
//! │ / car           ││ bob · Active now               │
//! │ bob    hi · 09:1││                                │
//! │ carol  ok · 08:4││                hello       │
//! │                 ││ hi there                       │
//! │                 ││────────────────────────────────│
//! │                 ││ > Type your message...         │
//! └─────────────────┘└────────────────────────────────┘
//!  Tab focus · Enter send · n new · r refresh · q quit
//! ```

use crate::app::{App, Focus, Mode};
use crate::screens::Screen;
use crate::ui::layout::{centered_fixed, main_layout, pane_layout};
use crate::ui::theme::{Styles, SPINNER};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

/// Fixed height for the composer area (in lines).
const COMPOSER_HEIGHT: u16 = 1;

/// Height for the divider line above the composer.
const DIVIDER_HEIGHT: u16 = 1;

/// The messenger screen.
pub struct MessengerScreen;

impl Screen for MessengerScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (content, status) = main_layout(area);
        let (list_area, thread_area) = pane_layout(content);

        render_conversation_list(app, list_area, buf);
        render_thread(app, thread_area, buf);
        render_status_bar(app, status, buf);

        if app.mode == Mode::NewContact {
            render_new_contact_modal(app, area, buf);
        }
    }
}

fn render_conversation_list(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.mode == Mode::Normal && app.focus == Focus::List;
    let title = if app.loading_conversations {
        format!(" Conversations {} ", SPINNER[app.tick % SPINNER.len()])
    } else {
        " Conversations ".to_string()
    };

    let block = Block::default()
        .title(title)
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(if focused {
            Styles::border_active()
        } else {
            Styles::border()
        })
        .style(Styles::default());
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height < 1 || inner.width < 1 {
        return;
    }

    // Search field on top whenever a filter is being edited or is active
    let show_search = app.mode == Mode::Search || !app.search_input.is_empty();
    let rows_area = if show_search {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        app.search_input
            .widget()
            .prompt("/ ")
            .focused(app.mode == Mode::Search)
            .placeholder("filter")
            .render(chunks[0], buf);
        chunks[1]
    } else {
        inner
    };

    let conversations = app.filtered_conversations();
    if conversations.is_empty() {
        let hint = if app.sync.conversations().is_empty() {
            "No conversations found"
        } else {
            "No match"
        };
        Paragraph::new(hint).style(Styles::dim()).render(rows_area, buf);
        return;
    }

    // Keep the highlighted row visible
    let visible = rows_area.height as usize;
    let offset = app.list_index.saturating_sub(visible.saturating_sub(1));

    let width = rows_area.width as usize;
    let mut lines = Vec::new();
    for (i, conversation) in conversations.iter().enumerate().skip(offset).take(visible) {
        let name = conversation
            .contact(app.sync.user())
            .unwrap_or("(unknown)");
        let time = conversation.last_message.timestamp.format("%H:%M");
        let preview = format!("{} · {time}", conversation.last_message.content.trim());

        let name_width = name.width().min(width);
        let rest = width.saturating_sub(name_width + 1);
        let row_style = if i == app.list_index {
            Styles::highlight()
        } else {
            Styles::default()
        };
        lines.push(Line::from(vec![
            Span::styled(truncate_to_width(name, width), row_style),
            Span::raw(" "),
            Span::styled(truncate_to_width(&preview, rest), Styles::dim()),
        ]));
    }

    Paragraph::new(lines).render(rows_area, buf);
}

fn render_thread(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.mode == Mode::Normal && app.focus == Focus::Composer;
    let busy = app.loading_thread() || app.send_in_flight;
    let title = match app.selected_contact_name() {
        Some(name) if busy => format!(" {name} {} ", SPINNER[app.tick % SPINNER.len()]),
        Some(name) => format!(" {name} "),
        None => " Messages ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(if focused {
            Styles::border_active()
        } else {
            Styles::border()
        })
        .style(Styles::default());
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height < 3 || inner.width < 4 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(DIVIDER_HEIGHT),
            Constraint::Length(COMPOSER_HEIGHT),
        ])
        .split(inner);

    render_thread_header(app, chunks[0], buf);
    render_messages(app, chunks[1], buf);

    let divider = "\u{2500}".repeat(chunks[2].width as usize);
    Paragraph::new(divider).style(Styles::border()).render(chunks[2], buf);

    render_composer(app, chunks[3], buf);
}

fn render_thread_header(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(name) = app.selected_contact_name() else {
        Paragraph::new("Select a conversation")
            .style(Styles::dim())
            .render(area, buf);
        return;
    };

    let presence = app
        .contact
        .as_ref()
        .map_or("offline", |user| user.status.as_str());
    let line = Line::from(vec![
        Span::styled(name, Styles::highlight()),
        Span::styled(format!(" · {presence}"), Styles::dim()),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn render_messages(app: &App, area: Rect, buf: &mut Buffer) {
    if app.sync.selected().is_none() {
        return;
    }

    if app.loading_thread() && app.sync.messages().is_empty() {
        Paragraph::new(format!("loading {}", SPINNER[app.tick % SPINNER.len()]))
            .style(Styles::dim())
            .render(area, buf);
        return;
    }

    let width = area.width as usize;
    // Bubbles take at most two thirds of the pane, like any messenger
    let bubble_width = (width * 2 / 3).max(8);
    let user = app.sync.user();

    let mut lines: Vec<Line<'_>> = Vec::new();
    for message in app.sync.visible_messages() {
        let own = message.from == user;
        let style = if own {
            Styles::own_message()
        } else {
            Styles::contact_message()
        };
        for wrapped in wrap(&message.content, bubble_width) {
            let text = wrapped.into_owned();
            if own {
                let pad = width.saturating_sub(text.width());
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(pad)),
                    Span::styled(text, style),
                ]));
            } else {
                lines.push(Line::from(Span::styled(text, style)));
            }
        }
        lines.push(Line::default());
    }

    // Follow the tail of the thread
    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    let lines: Vec<Line<'_>> = lines.into_iter().skip(skip).collect();
    Paragraph::new(lines).render(area, buf);
}

fn render_composer(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.mode == Mode::Normal && app.focus == Focus::Composer;
    app.composer_input
        .widget()
        .focused(focused)
        .placeholder("Type your message...")
        .render(area, buf);
}

fn render_status_bar(app: &App, area: Rect, buf: &mut Buffer) {
    let text = match &app.notification {
        Some(msg) => msg.clone(),
        None => format!(
            " {} · Tab focus · Enter open/send · n new · r refresh · / filter · ? help · q quit",
            app.sync.user()
        ),
    };
    Paragraph::new(truncate_to_width(&text, area.width as usize))
        .style(Styles::status_bar())
        .render(area, buf);
}

fn render_new_contact_modal(app: &App, area: Rect, buf: &mut Buffer) {
    let overlay = centered_fixed(46.min(area.width), 4, area);
    Clear.render(overlay, buf);

    let block = Block::default()
        .title(" New conversation ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());
    let inner = block.inner(overlay);
    block.render(overlay, buf);

    if inner.height < 2 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    app.contact_input
        .widget()
        .placeholder("contact name")
        .render(chunks[0], buf);
    Paragraph::new("Enter to create · Esc to cancel")
        .style(Styles::dim())
        .render(chunks[1], buf);
}

/// Truncate a string to a display width, column-accurately.
fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('\u{2026}');
    out
}
