//! src/panels/title.rs
//!
//! Header line: application title plus a one-line status message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub struct TitlePanel<'a> {
    pub title: &'a str,
    pub status: &'a str,
}

impl<'a> TitlePanel<'a> {
    pub fn new(title: &'a str, status: &'a str) -> Self {
        Self { title, status }
    }
}

impl crate::ui::Panel for TitlePanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::raw(self.title),
            Span::raw("  "),
            Span::styled(self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().title("Title").borders(Borders::ALL));
        f.render_widget(p, area);
    }
}
