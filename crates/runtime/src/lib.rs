pub mod clock;
pub mod engine;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod snapshot;

pub use clock::{shutdown_channel, ShutdownSignal, ShutdownTrigger, SimulationClock};
pub use engine::SimulationEngine;
pub use events::{RunOutcome, RunSummary, TickReport};
pub use logging::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter};
pub use metrics::{TickLatencyMetrics, TickLatencyReport, TickTiming};
pub use snapshot::{snapshot_channel, SnapshotPublisher, SnapshotReader};
