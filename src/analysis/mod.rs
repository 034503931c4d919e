//! Mock food analysis.
//!
//! There is no detection model. A captured or uploaded image is
//! answered with a randomly chosen verdict from a fixed catalogue.

mod analyzer;
mod catalog;

pub use analyzer::{AnalysisReport, MockAnalyzer, Verdict, MAX_CONFIDENCE, MIN_CONFIDENCE};
pub use catalog::{Adulterant, ADULTERANTS, SAFETY_TIPS};
