//! Processing engine: the per-screenshot pipeline and the monitor loop
//! that feeds it.

pub mod monitor;
pub mod pipeline;

pub use monitor::{Monitor, MonitorStats, ShutdownHandle};
pub use pipeline::{Pipeline, Processed};
