//! src/chart.rs
//!
//! Live chart view state.

pub mod view;

pub use view::ChartView;
