//! Command implementations behind the CLI
//!
//! - `analyze`: run one analysis job and render or export its result
//! - `deps`: check the external probing tool

mod analyze;
mod deps;

pub use analyze::{export, render, run_analysis, AnalyzeRequest};
pub use deps::check_dependencies;
