//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Rendering only reads state; the
//! one thing it writes back is [`App::card_area`], the rectangle the top card
//! was drawn in, which the input layer uses for mouse hit-testing.
//!
//! ## For contributors
//!
//! * The layout is three columns (stats, card stack, likes) above a one-line
//!   status bar.  The reset dialog is drawn over everything when open.
//! * Cards below the top one are drawn as flattened outlines that shrink by
//!   [`DEPTH_SCALE_STEP`] per level; only the top card shows content.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::card::CardTransform;
use crate::coordinator::{FetchKind, FetchState};
use crate::gesture::Decision;
use crate::source::Article;

/// Each card below the top is this much narrower than the one above it.
pub const DEPTH_SCALE_STEP: f32 = 0.05;

/// How many cards below the top are drawn.
const VISIBLE_DEPTH: usize = 3;

const CARD_WIDTH: u16 = 48;
const CARD_HEIGHT: u16 = 18;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let [stats_area, stack_area, liked_area] = Layout::horizontal([
        Constraint::Length(30),
        Constraint::Min(20),
        Constraint::Length(34),
    ])
    .areas(main_area);

    draw_stats(app, frame, stats_area);
    draw_stack(app, frame, stack_area);
    draw_liked(app, frame, liked_area);
    draw_status_bar(app, frame, status_area);

    if app.confirm_reset {
        draw_reset_dialog(frame, main_area);
    }
}

// ---------------------------------------------------------------------------
// Side panels
// ---------------------------------------------------------------------------

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    ))
}

fn loading_line() -> Line<'static> {
    Line::from(Span::styled("Loading...", Style::default().fg(Color::Gray)))
}

/// Render the stats panel: top liked sources and total swipes.
fn draw_stats(app: &App, frame: &mut Frame, area: Rect) {
    let view = app.engine.stats();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("Top Liked Sources:", bold))];

    if view.is_loading() {
        lines.push(loading_line());
    } else if view.value().top_categories.is_empty() {
        lines.push(hint("Swipe right on articles to see your top sources!"));
    } else {
        let chips: Vec<Span> = view
            .value()
            .top_categories
            .iter()
            .flat_map(|topic| {
                [
                    Span::styled(
                        format!(" {topic} "),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();
        lines.push(Line::from(chips));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Total Swipes:", bold)));
    if view.is_loading() {
        lines.push(loading_line());
    } else {
        lines.push(Line::from(Span::styled(
            view.value().total_count.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(at) = view.updated_at() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(panel(" My Stats "))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Render the liked-articles panel.
fn draw_liked(app: &App, frame: &mut Frame, area: Rect) {
    let view = app.engine.liked();
    let block = panel(" My Likes ");

    if view.is_loading() || view.value().is_empty() {
        let line = if view.is_loading() {
            loading_line()
        } else {
            hint("Swipe right on articles to save them here!")
        };
        let paragraph = Paragraph::new(line)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = view
        .value()
        .iter()
        .map(|article| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    article.title.as_str(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    article.source_name.as_str(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

// ---------------------------------------------------------------------------
// Card stack
// ---------------------------------------------------------------------------

/// Render the centre column: spinner, exhausted notice, or the card stack.
fn draw_stack(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(" Feed ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.card_area = Rect::default();

    let base = card_rect(inner);
    if base.is_empty() {
        return;
    }

    if app.engine.is_loading() {
        let glyph = SPINNER[(app.frame as usize) % SPINNER.len()];
        let spinner = Paragraph::new(format!("{glyph} Loading…"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(spinner, centered_line(base));
        return;
    }

    if app.engine.is_exhausted() {
        draw_exhausted(frame, base);
        return;
    }

    // Lower cards first so the top card is painted over them; each one's
    // bottom edge peeks out one row below the card above.
    let lower: Vec<&Article> = app
        .engine
        .store()
        .iter_top_first()
        .skip(1)
        .take(VISIBLE_DEPTH)
        .collect();
    for (i, article) in lower.iter().enumerate().rev() {
        let depth = i + 1;
        let rect = depth_rect(base, depth, inner);
        if rect.is_empty() {
            continue;
        }
        let outline = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title_bottom(Span::styled(
                truncate(&article.title, rect.width.saturating_sub(4) as usize),
                Style::default().fg(Color::DarkGray),
            ));
        frame.render_widget(Clear, rect);
        frame.render_widget(outline, rect);
    }

    if let Some(top) = app.engine.store().top() {
        let rect = draw_top_card(app, top, frame, base, inner);
        app.card_area = rect;
    }
}

fn draw_top_card(app: &App, article: &Article, frame: &mut Frame, base: Rect, bounds: Rect) -> Rect {
    let (transform, badge, held) = match app.card() {
        Some(card) => (card.transform(), card.badge(), card.is_dragging()),
        None => (CardTransform::NEUTRAL, None, false),
    };

    let shift = (transform.offset / app.units_per_column()).round() as i32;
    let rect = shift_rect(scale_rect(base, transform.scale), shift, bounds);
    if rect.is_empty() {
        return rect;
    }

    let text_color = match transform.opacity {
        o if o > 0.75 => Color::White,
        o if o > 0.4 => Color::Gray,
        _ => Color::DarkGray,
    };
    let border_color = match badge {
        Some((Decision::Like, _)) => Color::Green,
        Some((Decision::Reject, _)) => Color::Red,
        None => Color::Cyan,
    };

    let mut border_style = Style::default().fg(border_color);
    if held {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ", article.source_name),
            Style::default().fg(Color::Cyan),
        ));
    if let Some((decision, strength)) = badge {
        let (label, color, alignment) = match decision {
            Decision::Like => (" ♥ LIKE ", Color::Green, Alignment::Right),
            Decision::Reject => (" ✗ NOPE ", Color::Red, Alignment::Left),
        };
        let mut style = Style::default().fg(color);
        if strength >= 1.0 {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        block = block.title(Line::from(Span::styled(label, style)).alignment(alignment));
    }

    let lines = vec![
        Line::from(Span::styled(
            article.title.as_str(),
            Style::default()
                .fg(text_color)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            article.description.as_str(),
            Style::default().fg(text_color),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("image: ", Style::default().fg(Color::DarkGray)),
            Span::styled(article.image_or_placeholder(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled("read:  ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                article.article_url.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        rect,
    );
    rect
}

fn draw_exhausted(frame: &mut Frame, base: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "No More News",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "You've seen all available articles.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Press r to reset swipes & reload",
            Style::default().fg(Color::Cyan),
        )),
    ];
    let card = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(card, base);
}

/// The resting rectangle of the top card, centred in `inner` with room
/// below it for the lower cards to peek out.
fn card_rect(inner: Rect) -> Rect {
    let width = CARD_WIDTH.min(inner.width);
    let height = CARD_HEIGHT.min(inner.height.saturating_sub(VISIBLE_DEPTH as u16));
    Rect::new(
        inner.x + (inner.width - width) / 2,
        inner.y,
        width,
        height,
    )
}

/// A card `depth` levels below the top: narrower and pushed down one row
/// per level.
fn depth_rect(base: Rect, depth: usize, bounds: Rect) -> Rect {
    let scaled = scale_rect(base, 1.0 - depth as f32 * DEPTH_SCALE_STEP);
    Rect::new(scaled.x, scaled.y + depth as u16, scaled.width, scaled.height).intersection(bounds)
}

/// Shrink `rect` horizontally around its centre.
fn scale_rect(rect: Rect, scale: f32) -> Rect {
    let width = ((f32::from(rect.width) * scale).round() as u16).min(rect.width);
    Rect::new(rect.x + (rect.width - width) / 2, rect.y, width, rect.height)
}

/// Move `rect` `dx` columns sideways, clipped to `bounds`.
fn shift_rect(rect: Rect, dx: i32, bounds: Rect) -> Rect {
    let left = (i32::from(rect.x) + dx).max(i32::from(bounds.x));
    let right = (i32::from(rect.right()) + dx).min(i32::from(bounds.right()));
    if right <= left {
        return Rect::new(rect.x, rect.y, 0, 0);
    }
    Rect::new(left as u16, rect.y, (right - left) as u16, rect.height).intersection(bounds)
}

fn centered_line(area: Rect) -> Rect {
    Rect::new(area.x, area.y + area.height / 2, area.width, area.height.min(1))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn draw_reset_dialog(frame: &mut Frame, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(9);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let lines = vec![
        Line::from(Span::styled(
            "This will permanently delete all of your swipe history.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "Your feed will be reset to random articles.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(
                " y: Confirm Reset ",
                Style::default().fg(Color::White).bg(Color::Red),
            ),
            Span::raw("   "),
            Span::styled(" n: Cancel ", Style::default().fg(Color::White)),
        ]),
    ];
    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(
                    " ⚠ Reset Taste Profile? ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );

    frame.render_widget(Clear, rect);
    frame.render_widget(dialog, rect);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let coordinator = app.engine.coordinator();
    let activity = if coordinator.is_resetting() {
        "resetting…"
    } else {
        match coordinator.state() {
            FetchState::Fetching(FetchKind::Append) => "fetching more…",
            FetchState::Fetching(FetchKind::Replace) => "loading…",
            FetchState::Idle => "",
        }
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} cards", app.engine.store().len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} swiped", app.engine.counter().value()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(activity, Style::default().fg(Color::DarkGray)),
        Span::raw("  ←/h: skip  →/l: like  drag: swipe  r: reset  L: logout  q: quit"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
