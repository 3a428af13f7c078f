//! Code smell detection.

mod smells;
mod types;

pub use smells::SmellDetector;
pub use types::{Measurement, SmellKind, SmellResult};
