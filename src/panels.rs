//! src/panels.rs
//!
//! Top-level panels module and re-exports.

pub mod chart;
pub mod history;
pub mod info;
pub mod levels;
pub mod paragraph;
pub mod tank;
pub mod title;

pub use chart::ChartPanel;
pub use history::HistoryPanel;
pub use info::InfoPanel;
pub use levels::LevelsPanel;
pub use paragraph::ParagraphPanel;
pub use tank::TankPanel;
pub use title::TitlePanel;
