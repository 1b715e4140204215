use std::io::Read;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use ledatronic_frame::FrameReader;
use ledatronic_schema::{decode, FieldValue, Schema, Snapshot};
use ledatronic_transport::{connect, ShutdownHandle};
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::{PollError, Result};
use crate::host::{ItemSink, PauseControl, Scheduler};
use crate::items::ItemRegistry;
use crate::snapshot::SnapshotCell;

/// The polling plugin for one controller.
///
/// Cheap to clone; clones share state, so one clone can run the poll loop
/// while another stops it.
///
/// `cancel` ends the sessions that are open or connecting when it is
/// called. Sessions started afterwards are unaffected.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

struct Inner {
    config: PollerConfig,
    schema: Schema,
    items: RwLock<ItemRegistry>,
    sink: Arc<dyn ItemSink>,
    pause: RwLock<Option<Arc<dyn PauseControl>>>,
    snapshot: SnapshotCell,
    alive: AtomicBool,
    sessions: Mutex<Sessions>,
}

/// Open poll sessions and the cancel epoch they started under.
#[derive(Default)]
struct Sessions {
    epoch: u64,
    open: Vec<(u64, ShutdownHandle)>,
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// How the host should treat an item offered to [`Poller::parse_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    /// The configured pause item; route its changes to
    /// [`Poller::on_item_changed`].
    Pause,
    /// Bound to a data point and written after every frame.
    DataPoint,
    /// Not used by this plugin.
    Ignored,
}

impl Poller {
    pub fn new(config: PollerConfig, schema: Schema, sink: Arc<dyn ItemSink>) -> Result<Self> {
        config.validate()?;
        debug!(host = %config.host, port = config.port, fields = schema.len(), "poller configured");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                schema,
                items: RwLock::new(ItemRegistry::new()),
                sink,
                pause: RwLock::new(None),
                snapshot: SnapshotCell::new(),
                alive: AtomicBool::new(false),
                sessions: Mutex::new(Sessions::default()),
            }),
        })
    }

    /// Attach the host's pause item.
    pub fn with_pause_control(self, pause: Arc<dyn PauseControl>) -> Self {
        self.set_pause_control(pause);
        self
    }

    /// Attach or replace the host's pause item; visible to all clones.
    pub fn set_pause_control(&self, pause: Arc<dyn PauseControl>) {
        *self
            .inner
            .pause
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pause);
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Name of the recurring poll job.
    pub fn job_name(&self) -> String {
        format!("{}_poll", self.name())
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Register a host item for a data point.
    pub fn bind_item(&self, item_path: &str, data_point: &str) {
        debug!(item = %item_path, data_point = %data_point, "binding item");
        self.inner
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .bind_data_point(item_path, data_point);
    }

    pub fn items(&self) -> ItemRegistry {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent snapshot, if any frame has been decoded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.latest()
    }

    /// Start time of the most recent poll session.
    pub fn last_update(&self) -> Option<SystemTime> {
        self.inner.snapshot.last_update()
    }

    /// Schedule the poll cycle and mark the plugin alive.
    pub fn run(&self, scheduler: &dyn Scheduler) {
        info!(plugin = %self.name(), "run");

        let poller = self.clone();
        scheduler.schedule(
            &self.job_name(),
            self.inner.config.effective_cycle(),
            Box::new(move || {
                // Already logged; the next cycle reconnects.
                let _ = poller.poll_device();
            }),
        );
        self.inner.alive.store(true, Ordering::SeqCst);
        self.report_paused(false);
    }

    /// Stop polling: unschedule, mark not alive and drop the active connection.
    pub fn stop(&self, scheduler: &dyn Scheduler) {
        info!(plugin = %self.name(), "stop");
        self.inner.alive.store(false, Ordering::SeqCst);
        self.report_paused(true);

        scheduler.remove_all();
        self.cancel();
    }

    /// React to a change of the host's pause item.
    ///
    /// Changes made by this plugin itself are ignored.
    pub fn on_pause_item_changed(&self, paused: bool, caller: &str, scheduler: &dyn Scheduler) {
        if caller == self.name() {
            return;
        }
        debug!(paused, caller, "pause item changed");
        if paused && self.is_alive() {
            self.stop(scheduler);
        } else if !paused && !self.is_alive() {
            self.run(scheduler);
        }
    }

    /// Offer a host item to the plugin.
    ///
    /// The configured pause item is recognised by path. Any other item is
    /// bound when it carries a data point.
    pub fn parse_item(&self, item_path: &str, data_point: Option<&str>) -> ItemRole {
        if self.inner.config.pause_item.as_deref() == Some(item_path) {
            debug!(item = %item_path, "pause item registered");
            return ItemRole::Pause;
        }
        match data_point {
            Some(data_point) => {
                self.bind_item(item_path, data_point);
                ItemRole::DataPoint
            }
            None => ItemRole::Ignored,
        }
    }

    /// The host changed an item this plugin registered.
    pub fn on_item_changed(
        &self,
        item_path: &str,
        value: &FieldValue,
        caller: &str,
        scheduler: &dyn Scheduler,
    ) {
        if self.inner.config.pause_item.as_deref() == Some(item_path) {
            self.on_pause_item_changed(value.is_truthy(), caller, scheduler);
            return;
        }
        if self.is_alive() && caller != self.name() {
            info!(item = %item_path, caller, "item changed outside this plugin");
        }
    }

    /// Abort the open poll sessions, including any still connecting.
    ///
    /// A blocked read returns end-of-stream and the session ends with
    /// `ConnectionInterrupted`.
    pub fn cancel(&self) {
        let mut sessions = self.inner.lock_sessions();
        sessions.epoch += 1;
        for (id, handle) in &sessions.open {
            debug!(session = id, "cancelling poll session");
            handle.shutdown();
        }
    }

    /// Connect and process frames until the connection fails.
    ///
    /// Only returns with an error; the connection is closed on every path.
    pub fn poll_device(&self) -> Result<()> {
        self.poll_device_with(|_| ControlFlow::Continue(()))
    }

    /// Like [`poll_device`](Self::poll_device), also handing each snapshot
    /// to `on_snapshot`. Returning `Break` ends the session with `Ok`.
    pub fn poll_device_with<F>(&self, on_snapshot: F) -> Result<()>
    where
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        let epoch = self.inner.lock_sessions().epoch;
        self.inner.snapshot.mark_poll_started();
        let addr = self.inner.config.addr();

        let result = connect(&addr, &self.inner.config.connect_options())
            .map_err(PollError::from)
            .and_then(|stream| {
                info!("Connected to {addr}");
                let mut reader = FrameReader::with_config(stream, self.inner.config.frame_config());
                let handle = reader.shutdown_handle()?;
                let _registration = ConnectionRegistration::new(&self.inner, epoch, handle);
                self.poll_frames(&mut reader, on_snapshot)
            });

        if let Err(err) = &result {
            if err.is_connection_refused() {
                warn!("Connection refused. Is the server running on {addr}?");
            } else if let PollError::Frame(_) | PollError::Transport(_) = err {
                warn!("Socket error: {err}");
            } else {
                warn!("An unexpected error occurred: {err}");
            }
        }
        result
    }

    /// Decode and publish every frame from `reader` until it fails or
    /// `on_snapshot` breaks.
    pub fn poll_frames<R, F>(&self, reader: &mut FrameReader<R>, mut on_snapshot: F) -> Result<()>
    where
        R: Read,
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        for payload in reader.frames() {
            let snapshot = self.handle_payload(&payload?);
            if on_snapshot(&snapshot).is_break() {
                debug!("poll session ended by caller");
                break;
            }
        }
        Ok(())
    }

    /// Decode one payload, store the snapshot and publish it.
    pub fn handle_payload(&self, payload: &[u8]) -> Arc<Snapshot> {
        let snapshot = Arc::new(decode(payload, &self.inner.schema));
        info!(
            active = snapshot.is_active(),
            errors = snapshot.errors().len(),
            "decoded status frame"
        );
        for error in snapshot.errors() {
            debug!(%error, "field decode error");
        }

        self.inner.snapshot.replace(Arc::clone(&snapshot));
        self.update_item_values(&snapshot);
        snapshot
    }

    /// Copy bound values from `snapshot` into the host items.
    pub fn update_item_values(&self, snapshot: &Snapshot) -> usize {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .update_item_values(snapshot, self.inner.sink.as_ref(), self.name())
    }
}

impl Poller {
    fn report_paused(&self, paused: bool) {
        let pause = self
            .inner
            .pause
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(pause) = pause {
            pause.set_paused(paused, self.name());
        }
    }
}

impl Inner {
    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a session's shutdown handle reachable by `cancel` while it is open.
struct ConnectionRegistration<'a> {
    inner: &'a Inner,
    id: u64,
}

impl<'a> ConnectionRegistration<'a> {
    /// `epoch` is the cancel epoch seen when the session started; a cancel
    /// since then ends the session right away.
    fn new(inner: &'a Inner, epoch: u64, handle: ShutdownHandle) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let mut sessions = inner.lock_sessions();
        if sessions.epoch != epoch {
            debug!(session = id, "cancelled while connecting");
            handle.shutdown();
        }
        sessions.open.push((id, handle));
        Self { inner, id }
    }
}

impl Drop for ConnectionRegistration<'_> {
    fn drop(&mut self) {
        self.inner
            .lock_sessions()
            .open
            .retain(|(id, _)| *id != self.id);
    }
}
