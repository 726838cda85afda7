//! src/panels/info.rs
//!
//! Link state, ingest counters and chart view settings.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::chart::ChartView;
use crate::ingest::StatsSnapshot;
use crate::tank::MeasurementHistory;

pub struct InfoPanel<'a> {
    /// `None` when no reader is running (manual mode).
    pub stats: Option<&'a StatsSnapshot>,
    pub history: &'a MeasurementHistory,
    pub view: &'a ChartView,
    /// Frames still queued after this tick's drain.
    pub queue_backlog: usize,
    pub queue_dropped: u64,
}

impl crate::ui::Panel for InfoPanel<'_> {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let mut lines = Vec::new();

        match self.stats {
            Some(stats) => {
                let (text, color) = if stats.connected {
                    ("connected", Color::Green)
                } else {
                    ("disconnected", Color::Red)
                };
                lines.push(Line::from(vec![
                    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::raw(format!(
                        "  {}  connects={}",
                        stats.link.as_deref().unwrap_or("-"),
                        stats.connects
                    )),
                ]));
                lines.push(Line::from(format!(
                    "frames ok={}  malformed={}  line faults={}  read faults={}",
                    stats.frames_accepted,
                    stats.frames_rejected,
                    stats.line_faults,
                    stats.read_faults
                )));
                if let Some(fault) = &stats.last_fault {
                    lines.push(Line::from(Span::styled(
                        format!("last fault: {fault}"),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            None => lines.push(Line::from("manual mode, no device")),
        }

        lines.push(Line::from(format!(
            "samples={}  implausible={}  unparseable={}  queued={}  dropped={}",
            self.history.len(),
            self.history.implausible(),
            self.history.unparseable(),
            self.queue_backlog,
            self.queue_dropped
        )));

        let bounds = self.view.current_bounds.unwrap_or(self.view.fallback);
        let lock_text = if self.view.locked_bounds.is_some() {
            " (locked)"
        } else {
            ""
        };
        lines.push(Line::from(format!(
            "chart{}  autoscale={}  smoothing={:.2}  state={}  bounds=[{:.2},{:.2}]",
            lock_text,
            self.view.autoscale,
            self.view.smoothing,
            self.view.state.label(),
            bounds.0,
            bounds.1
        )));

        let block = Block::default().title("Info").borders(Borders::ALL);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
