pub mod screen;

use std::collections::HashMap;

use bukvar::{achievements::Achievement, item::Item, RenderSurface};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::App;

pub const HORIZONTAL_MARGIN: u16 = 5;
pub const VERTICAL_MARGIN: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Incorrect,
}

/// What the running session last told us to show
#[derive(Debug, Default)]
pub struct View {
    pub round: Option<(usize, usize)>,
    pub prompt: String,
    pub options: Vec<Item>,
    pub marks: HashMap<String, Mark>,
    pub status: Option<String>,
    pub stars: Option<u8>,
    pub stickers: Vec<&'static Achievement>,
}

impl View {
    pub fn clear(&mut self) {
        *self = View::default();
    }
}

impl RenderSurface for View {
    fn show_round(&mut self, round: usize, total: usize) {
        self.round = Some((round, total));
        self.status = None;
    }

    fn show_options(&mut self, prompt: &str, options: &[Item]) {
        self.prompt = prompt.to_string();
        self.options = options.to_vec();
        self.marks.clear();
    }

    fn mark_correct(&mut self, item_id: &str) {
        self.marks.insert(item_id.to_string(), Mark::Correct);
    }

    fn mark_incorrect(&mut self, item_id: &str) {
        self.marks.insert(item_id.to_string(), Mark::Incorrect);
    }

    fn show_results(&mut self, stars: u8) {
        self.stars = Some(stars);
    }

    fn show_achievements(&mut self, unlocked: &[&'static Achievement]) {
        self.stickers.extend_from_slice(unlocked);
    }

    fn show_status(&mut self, text: &str) {
        self.status = Some(text.to_string());
    }
}

/// Text for one answer button. Pictures only, unless labels are on or the
/// option has no picture.
pub fn option_label(index: usize, item: &Item, show_labels: bool) -> String {
    match (&item.emoji, show_labels) {
        (Some(emoji), true) => format!("{} {emoji} {}", index + 1, item.display_text),
        (Some(emoji), false) => format!("{} {emoji}", index + 1),
        (None, _) => format!("{} {}", index + 1, item.display_text),
    }
}

pub fn stars_line(stars: u8) -> String {
    let stars = stars.min(3) as usize;
    format!("{}{}", "★".repeat(stars), "☆".repeat(3 - stars))
}

/// Options laid out on one row, each padded to its display width
pub fn option_spans(app: &App) -> Vec<Span<'static>> {
    let view = app.view.borrow();
    let mut spans = Vec::new();
    for (i, item) in view.options.iter().enumerate() {
        let label = option_label(i, item, app.settings.show_labels);
        let style = match view.marks.get(&item.id) {
            Some(Mark::Correct) => Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            Some(Mark::Incorrect) => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::CROSSED_OUT),
            None => Style::default().add_modifier(Modifier::BOLD),
        };
        let pad = 2 + (12usize.saturating_sub(label.width())) / 2;
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(format!("[{label}]"), style));
    }
    spans
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.state).render(self, area, buf);
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
