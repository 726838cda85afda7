//! src/app.rs
//!
//! Live tank view.
//!
//! Readings arrive over a serial port (or from the simulated device) as lines
//! like `013,5cm`: the distance in centimeters from the sensor at the top of the
//! tank down to the water surface. A background thread owns the port, validates
//! each line and queues accepted frames. Once per frame the UI loop drains the
//! queue, range-checks the readings into the measurement history and redraws:
//! the tank with its reservoir, the level controls, a live chart, the recent
//! history and the link counters.
//!
//! # Running
//!
//! ```text
//! cargo run --release -- --port /dev/ttyUSB0 --baud 9600
//! cargo run --release -- --source simulate
//! cargo run --release -- --source manual
//! ```
//!
//! Logs go to `tankview.log` (see `--log-file`, `--log-level`, `RUST_LOG`).
//!
//! # Keyboard Controls
//!
//! - **0-9** select a level by its command digit.
//! - **Left/Right** step the selected level down/up.
//! - **a** toggle chart autoscale (clears a locked view).
//! - **s** cycle chart smoothing presets `0.0, 0.25, 0.5, 0.75, 1.0`.
//! - **l** lock/unlock the chart's y-bounds.
//! - **q** / **Esc** quit.
//!
//! Selecting a level writes its single command digit to the device. In manual
//! mode there is no device and the selection sets the tank directly.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::{Constraint, Direction};
use tracing::{info, warn};

use crate::chart::ChartView;
use crate::config::{Cli, Config, Source};
use crate::ingest::{
    CommandWriter, FrameConsumer, FrameQueue, ReaderHandle, ReaderStats, SerialConnect,
    SerialReader, SimulatedConnect, StatsSnapshot,
};
use crate::logging;
use crate::panels::{
    ChartPanel, HistoryPanel, InfoPanel, LevelsPanel, ParagraphPanel, TankPanel, TitlePanel,
};
use crate::tank::{Ingest, MeasurementHistory};
use crate::ui::{Node, group, leaf};

/// Render cadence.
const FRAME_TIME: Duration = Duration::from_millis(100);
/// Upper bound on frames ingested per render tick; the rest wait for the next.
const MAX_FRAMES_PER_TICK: usize = 1_024;
/// Period of the simulated device.
const SIMULATED_PERIOD: Duration = Duration::from_millis(200);

const HELP: &str = "0-9=Level  \u{2190}/\u{2192}=Step  A=Autoscale  S=Smoothing  L=Lock  Q=Quit";

pub fn run() -> Result<()> {
    let config = Cli::parse()
        .into_config()
        .wrap_err("invalid configuration")?;
    logging::init(&config.log_file, &config.log_level)?;
    info!(source = ?config.source, port = %config.serial.port, "Starting tankview");

    let mut app = App::start(config)?;
    let mut terminal = ratatui::init();
    let result = app.main_loop(&mut terminal);
    ratatui::restore();
    app.shutdown();
    info!("Stopped");
    result
}

/// Reader-side resources; absent in manual mode.
struct Ingestor {
    consumer: FrameConsumer,
    stats: Arc<ReaderStats>,
    handle: Option<ReaderHandle>,
}

pub struct App {
    config: Config,
    history: MeasurementHistory,
    ingestor: Option<Ingestor>,
    writer: CommandWriter,
    view: ChartView,
    selected: Option<usize>,
    /// Water height set directly in manual mode.
    manual_cm: Option<f64>,
    status: String,
    running: bool,
}

impl App {
    /// Build the app and, unless in manual mode, spawn the reader thread.
    pub fn start(config: Config) -> Result<Self> {
        let writer = CommandWriter::new();
        let ingestor = match config.source {
            Source::Manual => None,
            Source::Serial => Some(spawn_reader(
                SerialConnect::new(config.serial.clone()),
                &config,
                &writer,
            )?),
            Source::Simulate => Some(spawn_reader(
                SimulatedConnect::new(
                    config.levels.clone(),
                    config.mapper.tank_height(),
                    SIMULATED_PERIOD,
                ),
                &config,
                &writer,
            )?),
        };
        Ok(Self::with_parts(config, ingestor, writer))
    }

    fn with_parts(config: Config, ingestor: Option<Ingestor>, writer: CommandWriter) -> Self {
        let history = MeasurementHistory::new(config.mapper, config.history_window);
        let view = ChartView::new((0.0, config.mapper.tank_height()), true, 0.35);
        let status = match config.source {
            Source::Manual => "manual mode".to_string(),
            _ => "waiting for data".to_string(),
        };
        Self {
            config,
            history,
            ingestor,
            writer,
            view,
            selected: None,
            manual_cm: None,
            status,
            running: true,
        }
    }

    fn main_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while self.running {
            let frame_start = Instant::now();

            self.ingest_available();
            self.draw(terminal)?;

            while event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            let elapsed = frame_start.elapsed();
            if self.running && elapsed < FRAME_TIME {
                thread::sleep(FRAME_TIME - elapsed);
            }
        }
        Ok(())
    }

    /// Move every frame queued so far (up to the per-tick cap) into history.
    /// Returns the number of accepted samples.
    pub fn ingest_available(&mut self) -> usize {
        let Some(ingestor) = &self.ingestor else {
            return 0;
        };
        let mut accepted = 0;
        for frame in ingestor.consumer.drain_up_to(MAX_FRAMES_PER_TICK) {
            if let Ingest::Accepted(_) = self.history.ingest(&frame) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Water height in centimeters currently shown in the tank.
    pub fn water_cm(&self) -> Option<f64> {
        match self.config.source {
            Source::Manual => self.manual_cm,
            _ => {
                let mapper = self.history.mapper();
                self.history
                    .current_fill_level()
                    .map(|fill| fill / mapper.display_scale())
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('a') => self.view.toggle_autoscale(),
            KeyCode::Char('s') => self.view.cycle_smoothing(),
            KeyCode::Char('l') => self.view.toggle_lock(),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let index = (c as u8 - b'0') as usize;
                if index < self.config.levels.len() {
                    self.select_level(index);
                }
            }
            KeyCode::Left => {
                let index = self.selected.map_or(0, |i| i.saturating_sub(1));
                self.select_level(index);
            }
            KeyCode::Right => {
                let last = self.config.levels.len().saturating_sub(1);
                let index = self.selected.map_or(0, |i| (i + 1).min(last));
                self.select_level(index);
            }
            _ => {}
        }
    }

    fn select_level(&mut self, index: usize) {
        let Some(level) = self.config.levels.get(index) else {
            return;
        };
        self.selected = Some(index);

        if self.config.source == Source::Manual {
            let height = self.config.mapper.tank_height();
            self.manual_cm = Some(level.centimeters.clamp(0.0, height));
            self.status = format!("{} ({:.1} cm)", level.label, level.centimeters);
            return;
        }

        match self.writer.send(level.command) {
            Ok(()) => {
                info!(label = %level.label, command = %(level.command as char), "Level requested");
                self.status = format!("requested {} ({:.1} cm)", level.label, level.centimeters);
            }
            Err(e) => {
                warn!(label = %level.label, error = %e, "Level command failed");
                self.status = format!("{} not sent: {e}", level.label);
            }
        }
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let points = self.history.chart_points(self.config.chart_window);
        let bounds = self.view.update(&points);
        let stats: Option<StatsSnapshot> = self.ingestor.as_ref().map(|i| i.stats.snapshot());
        let (queue_backlog, queue_dropped) = self
            .ingestor
            .as_ref()
            .map_or((0, 0), |i| (i.consumer.len(), i.consumer.dropped()));
        let stats_row = self.history.stats();

        let height = self.config.mapper.tank_height();
        let water = self.water_cm();
        let reservoir = water.map(|w| height - w);

        let tanks = group(
            Direction::Horizontal,
            vec![Constraint::Percentage(50), Constraint::Percentage(50)],
            vec![
                leaf(TankPanel {
                    title: "Tank",
                    fill: water.map(|w| w / height),
                    water_cm: water,
                }),
                leaf(TankPanel {
                    title: "Reservoir",
                    fill: reservoir.map(|r| r / height),
                    water_cm: reservoir,
                }),
            ],
        );

        let right = group(
            Direction::Vertical,
            vec![Constraint::Percentage(60), Constraint::Percentage(40)],
            vec![
                leaf(ChartPanel::new(&points, bounds, &self.view, stats_row)),
                group(
                    Direction::Horizontal,
                    vec![Constraint::Percentage(45), Constraint::Percentage(55)],
                    vec![
                        leaf(HistoryPanel::new(&self.history)),
                        leaf(InfoPanel {
                            stats: stats.as_ref(),
                            history: &self.history,
                            view: &self.view,
                            queue_backlog,
                            queue_dropped,
                        }),
                    ],
                ),
            ],
        );

        let root: Node = group(
            Direction::Vertical,
            vec![
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ],
            vec![
                leaf(TitlePanel::new("Tank View", &self.status)),
                leaf(LevelsPanel {
                    table: &self.config.levels,
                    selected: self.selected,
                }),
                group(
                    Direction::Horizontal,
                    vec![Constraint::Percentage(30), Constraint::Percentage(70)],
                    vec![tanks, right],
                ),
                leaf(ParagraphPanel::new(HELP, "Controls")),
            ],
        );

        terminal.draw(|f| root.draw(f, f.area()))?;
        Ok(())
    }

    /// Stop the reader thread, if any.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.ingestor.as_mut().and_then(|i| i.handle.as_mut()) {
            handle.stop();
        }
    }
}

fn spawn_reader<C: crate::ingest::Connect + 'static>(
    connector: C,
    config: &Config,
    writer: &CommandWriter,
) -> Result<Ingestor> {
    let (producer, consumer) = FrameQueue::with_capacity(config.queue_capacity);
    let stats = ReaderStats::new();
    let reader = SerialReader::new(
        connector,
        producer,
        writer.clone(),
        Box::new(stats.clone()),
        config.timing,
    );
    let handle = reader.spawn().wrap_err("spawning serial reader thread")?;
    Ok(Ingestor {
        consumer,
        stats,
        handle: Some(handle),
    })
}
