//! src/panels/paragraph.rs
//!
//! Static help/text block.

use ratatui::{
    Frame,
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct ParagraphPanel<'a> {
    pub text: &'a str,
    pub title: &'a str,
}

impl<'a> ParagraphPanel<'a> {
    pub fn new(text: &'a str, title: &'a str) -> Self {
        Self { text, title }
    }
}

impl crate::ui::Panel for ParagraphPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let p = Paragraph::new(self.text)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(p, area);
    }
}
