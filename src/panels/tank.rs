//! src/panels/tank.rs
//!
//! Vertical tank drawn with block characters, filled from the bottom.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

pub struct TankPanel<'a> {
    pub title: &'a str,
    /// Fill as a fraction of the tank, `None` when there is no data yet.
    pub fill: Option<f64>,
    /// Water height in centimeters, shown in the title.
    pub water_cm: Option<f64>,
}

/// Rows to paint for `fill` in a tank `rows` high. Clamped to the tank.
pub fn filled_rows(fill: f64, rows: u16) -> u16 {
    if !fill.is_finite() {
        return 0;
    }
    (fill.clamp(0.0, 1.0) * rows as f64).round() as u16
}

impl crate::ui::Panel for TankPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let title = match self.water_cm {
            Some(cm) => format!("{}  {:.1} cm", self.title, cm),
            None => format!("{}  no data", self.title),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        let width = inner.width as usize;

        let filled = self.fill.map_or(0, |fill| filled_rows(fill, inner.height));
        let empty = inner.height - filled;
        let water = Style::default().fg(Color::Blue);

        let lines: Vec<Line> = (0..inner.height)
            .map(|row| {
                if row < empty {
                    Line::from(" ".repeat(width))
                } else {
                    Line::styled("█".repeat(width), water)
                }
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Panel;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn filled_rows_clamps_and_rounds() {
        assert_eq!(filled_rows(0.0, 10), 0);
        assert_eq!(filled_rows(0.44, 10), 4);
        assert_eq!(filled_rows(0.46, 10), 5);
        assert_eq!(filled_rows(1.7, 10), 10);
        assert_eq!(filled_rows(-0.5, 10), 0);
        assert_eq!(filled_rows(f64::NAN, 10), 0);
    }

    #[test]
    fn paints_water_from_the_bottom() {
        let panel = TankPanel {
            title: "Tank",
            fill: Some(0.5),
            water_cm: Some(10.0),
        };
        let mut terminal = Terminal::new(TestBackend::new(6, 6)).unwrap();
        terminal.draw(|f| panel.draw(f, f.area())).unwrap();
        let buf = terminal.backend().buffer();
        // Inner area is 4x4: two empty rows above two water rows.
        assert_eq!(buf[(1, 1)].symbol(), " ");
        assert_eq!(buf[(1, 2)].symbol(), " ");
        assert_eq!(buf[(1, 3)].symbol(), "█");
        assert_eq!(buf[(4, 4)].symbol(), "█");
    }
}
