//! src/main.rs
//!
//! Entrypoint delegating to `app::run()`.

mod app;
mod chart;
mod config;
mod error;
mod ingest;
mod logging;
mod panels;
mod tank;
mod ui;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    app::run()
}
