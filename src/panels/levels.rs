//! src/panels/levels.rs
//!
//! Row of selectable target levels; the selected one is highlighted.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::tank::LevelTable;

pub struct LevelsPanel<'a> {
    pub table: &'a LevelTable,
    pub selected: Option<usize>,
}

impl crate::ui::Panel for LevelsPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans = Vec::new();
        for (i, level) in self.table.iter().enumerate() {
            let style = if self.selected == Some(i) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            spans.push(Span::styled(
                format!(
                    " {} {} ({:.1} cm) ",
                    level.command as char, level.label, level.centimeters
                ),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        let p = Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Levels").borders(Borders::ALL));
        f.render_widget(p, area);
    }
}
