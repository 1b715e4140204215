//! Interfaces to the host automation framework.

use std::time::Duration;

use ledatronic_schema::FieldValue;

/// Writes values into the host's item tree.
pub trait ItemSink: Send + Sync {
    /// Set `item_path` to `value`, attributed to `caller`.
    fn set_item(&self, item_path: &str, value: &FieldValue, caller: &str);
}

/// The host item that pauses and resumes the plugin.
pub trait PauseControl: Send + Sync {
    fn set_paused(&self, paused: bool, caller: &str);
}

/// A recurring job run by a [`Scheduler`].
pub type Job = Box<dyn FnMut() + Send + 'static>;

/// Runs recurring jobs on behalf of the plugin.
pub trait Scheduler: Send + Sync {
    /// Run `job` now and then every `interval`, never overlapping itself.
    fn schedule(&self, name: &str, interval: Duration, job: Job);

    /// Stop every job scheduled through this scheduler.
    fn remove_all(&self);
}
