use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::host::{Job, Scheduler};

/// Runs each scheduled job on its own thread.
///
/// A job runs immediately, then waits `interval` after each run finishes.
/// Stopping is checked between runs, so a job that is blocked keeps its
/// thread until it returns.
#[derive(Default)]
pub struct ThreadScheduler {
    jobs: Mutex<Vec<ScheduledJob>>,
}

struct ScheduledJob {
    name: String,
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait up to `timeout`; returns true if stopped.
    fn wait(&self, timeout: Duration) -> bool {
        let guard = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of jobs that have not been removed.
    pub fn job_names(&self) -> Vec<String> {
        self.lock_jobs().iter().map(|j| j.name.clone()).collect()
    }

    /// Stop all jobs and wait for their threads to finish.
    ///
    /// Must not be called from inside a job.
    pub fn shutdown(&self) {
        let jobs = std::mem::take(&mut *self.lock_jobs());
        for job in &jobs {
            job.stop.stop();
        }
        for mut job in jobs {
            if let Some(thread) = job.thread.take() {
                if thread.join().is_err() {
                    warn!(job = %job.name, "scheduled job panicked");
                }
            }
        }
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, Vec<ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, name: &str, interval: Duration, mut job: Job) {
        let stop = Arc::new(StopSignal::default());
        let thread_stop = Arc::clone(&stop);
        let job_name = name.to_string();

        let spawned = thread::Builder::new()
            .name(job_name.clone())
            .spawn(move || loop {
                if thread_stop.is_stopped() {
                    break;
                }
                job();
                if thread_stop.wait(interval) {
                    break;
                }
            });

        match spawned {
            Ok(thread) => {
                debug!(job = %name, ?interval, "scheduled job");
                self.lock_jobs().push(ScheduledJob {
                    name: job_name,
                    stop,
                    thread: Some(thread),
                });
            }
            Err(err) => warn!(job = %name, error = %err, "failed to spawn job thread"),
        }
    }

    fn remove_all(&self) {
        // Threads are detached: this may run inside one of the jobs.
        for job in self.lock_jobs().drain(..) {
            job.stop.stop();
            debug!(job = %job.name, "removed job");
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.remove_all();
    }
}
