//! Polling plugin that republishes LEDATRONIC status into a host item graph.
//!
//! The host automation framework is reached only through the narrow traits
//! in [`host`]: an [`ItemSink`] for item values, an optional
//! [`PauseControl`], and a [`Scheduler`] that runs the poll cycle.

pub mod config;
pub mod error;
pub mod host;
pub mod items;
pub mod poller;
pub mod scheduler;
pub mod snapshot;

pub use config::{PollerConfig, DEFAULT_CYCLE_SECS, DEFAULT_PORT, MIN_CYCLE_SECS};
pub use error::{PollError, Result};
pub use host::{ItemSink, Job, PauseControl, Scheduler};
pub use items::{ItemBinding, ItemRegistry};
pub use poller::{ItemRole, Poller};
pub use scheduler::ThreadScheduler;
pub use snapshot::SnapshotCell;
