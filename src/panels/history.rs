//! src/panels/history.rs
//!
//! Scrolling list of the newest accepted samples; the latest one is highlighted.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::tank::MeasurementHistory;

pub struct HistoryPanel<'a> {
    pub history: &'a MeasurementHistory,
}

impl<'a> HistoryPanel<'a> {
    pub fn new(history: &'a MeasurementHistory) -> Self {
        Self { history }
    }
}

impl crate::ui::Panel for HistoryPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        // Two rows go to the border.
        let block = Block::default().title("History").borders(Borders::ALL);
        if self.history.is_empty() {
            f.render_widget(Paragraph::new("No samples yet").block(block), area);
            return;
        }

        let rows = area.height.saturating_sub(2) as usize;
        let mapper = self.history.mapper();
        let samples = self.history.snapshot();
        let skip = samples.len().saturating_sub(rows);
        let last_seq = self.history.last().map(|s| s.seq);

        let lines: Vec<Line> = samples
            .iter()
            .skip(skip)
            .map(|s| {
                let value_style = if Some(s.seq) == last_seq {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                Line::from(vec![
                    Span::styled("#", Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{:<6}", s.seq), Style::default().fg(Color::Green)),
                    Span::styled("dist ", Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{:6.2}", s.distance_cm), value_style),
                    Span::styled("  water ", Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{:6.2}", mapper.water_height(s.distance_cm)),
                        value_style,
                    ),
                ])
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
