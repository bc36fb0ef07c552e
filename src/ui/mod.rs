//! Terminal rendering

pub mod results_panel;
