//! Per-file vulnerability analysis.
//!
//! A file goes through the scheduler, which asks the arbitrator to query every
//! requested model. Each answer is interpreted into findings and rated by the
//! quality scorer; the best-rated answer wins.

pub mod arbitrator;
pub mod interpreter;
pub mod prompt;
pub mod quality;
pub mod scheduler;

pub use interpreter::Interpretation;
pub use scheduler::{select_files, AnalysisScheduler, SchedulerConfig};
