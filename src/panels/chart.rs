//! src/panels/chart.rs
//!
//! Live water-level chart with a stats row and, when the view is locked, red
//! guide lines at the locked bounds.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::chart::ChartView;

pub struct ChartPanel<'a> {
    /// `(sequence, water height cm)` points, oldest first.
    pub points: &'a [(f64, f64)],
    /// Y-bounds computed by the view for this frame.
    pub bounds: (f64, f64),
    pub view: &'a ChartView,
    /// Min, max and last water height over the whole retained history.
    pub stats: Option<(f64, f64, f64)>,
}

impl<'a> ChartPanel<'a> {
    pub fn new(
        points: &'a [(f64, f64)],
        bounds: (f64, f64),
        view: &'a ChartView,
        stats: Option<(f64, f64, f64)>,
    ) -> Self {
        Self {
            points,
            bounds,
            view,
            stats,
        }
    }

    fn x_bounds(&self) -> (f64, f64) {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
            (Some(first), _) => (first.0, first.0 + 1.0),
            _ => (0.0, 1.0),
        }
    }

    fn stats_text(&self) -> String {
        let Some((mn, mx, last)) = self.stats else {
            return "No data".to_string();
        };
        format!("Min: {:.2} cm  Max: {:.2} cm  Last: {:.2} cm", mn, mx, last)
    }
}

impl crate::ui::Panel for ChartPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let stats = Paragraph::new(self.stats_text())
            .block(Block::default().title("Stats").borders(Borders::ALL));
        f.render_widget(stats, chunks[0]);

        let (ymin, ymax) = self.bounds;
        let (xmin, xmax) = self.x_bounds();

        let guide_top = [(xmin, ymax), (xmax, ymax)];
        let guide_bot = [(xmin, ymin), (xmax, ymin)];
        let guide_style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);

        let mut datasets = vec![
            Dataset::default()
                .name("water (cm)")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(self.points),
        ];
        if self.view.locked_bounds.is_some() {
            for guide in [&guide_top, &guide_bot] {
                datasets.push(
                    Dataset::default()
                        .marker(symbols::Marker::Dot)
                        .graph_type(GraphType::Line)
                        .style(guide_style)
                        .data(guide),
                );
            }
        }

        let span = (ymax - ymin).max(1e-9);
        let y_labels: Vec<String> = (0..5)
            .map(|i| format!("{:.1}", ymin + span * i as f64 / 4.0))
            .collect();

        let chart = Chart::new(datasets)
            .block(Block::default().title("Water level").borders(Borders::ALL))
            .x_axis(Axis::default().bounds([xmin, xmax]))
            .y_axis(Axis::default().bounds([ymin, ymax]).labels(y_labels));

        f.render_widget(chart, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_row_reports_history_stats() {
        let view = ChartView::new((0.0, 20.0), true, 0.35);
        let points = [(4.0, 11.0)];
        let panel = ChartPanel::new(&points, (0.0, 20.0), &view, Some((11.0, 13.0, 11.0)));
        assert_eq!(
            panel.stats_text(),
            "Min: 11.00 cm  Max: 13.00 cm  Last: 11.00 cm"
        );
        let empty = ChartPanel::new(&[], (0.0, 20.0), &view, None);
        assert_eq!(empty.stats_text(), "No data");
    }
}
