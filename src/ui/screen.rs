use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    ui::{option_spans, stars_line, HORIZONTAL_MARGIN, VERTICAL_MARGIN},
    App, AppState, GameKind,
};

/// A UI Screen boundary: renders one [`AppState`]
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

fn caption_line(app: &App) -> Paragraph<'static> {
    let text = app
        .caption
        .text()
        .map(|t| format!("🔊 {t}"))
        .unwrap_or_default();
    Paragraph::new(Span::styled(text, Style::default().fg(Color::Cyan))).alignment(Alignment::Center)
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new("Буквар")
            .block(Block::default().borders(Borders::ALL))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let lines: Vec<Line> = GameKind::all()
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let style = if i == app.menu_index {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("{}  {}", i + 1, kind.title()), style))
            })
            .collect();
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if !app.saving {
            Paragraph::new(Span::styled(
                "progress is not being saved",
                Style::default().fg(Color::Red),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }

        legend("(1-4) play / (↑↓ enter) / (q)uit").render(chunks[3], buf);
    }
}

pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title and round
                Constraint::Min(1),
                Constraint::Length(1), // prompt
                Constraint::Length(1), // status
                Constraint::Length(1),
                Constraint::Length(1), // options
                Constraint::Min(1),
                Constraint::Length(1), // caption
                Constraint::Length(1), // legend
            ])
            .split(area);

        let view = app.view.borrow();
        let title = app.current.map(|k| k.title()).unwrap_or_default();
        let round = view
            .round
            .map(|(r, total)| format!("{r}/{total}"))
            .unwrap_or_default();
        Paragraph::new(Line::from(vec![
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled(round, Style::default().add_modifier(Modifier::DIM)),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            view.prompt.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if let Some(status) = &view.status {
            Paragraph::new(Span::styled(
                status.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }
        drop(view);

        Paragraph::new(Line::from(option_spans(app)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);

        caption_line(app).render(chunks[7], buf);
        legend("(1-6) choose / (r)epeat / (esc) menu").render(chunks[8], buf);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let view = app.view.borrow();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1), // stars
                Constraint::Length(1),
                Constraint::Length(view.stickers.len() as u16 + 2),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(Span::styled(
            stars_line(view.stars.unwrap_or(0)),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        if !view.stickers.is_empty() {
            let lines: Vec<Line> = view
                .stickers
                .iter()
                .map(|a| Line::from(format!("{} {}  {}", a.emoji, a.name, a.description)))
                .collect();
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Нови стикери"))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        legend("(n)ew / (m)enu / (q)uit").render(chunks[5], buf);
    }
}

/// Helper to construct the screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::Playing => Box::new(PlayingScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
