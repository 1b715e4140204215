#![cfg(feature = "poller")]

use std::net::TcpListener;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ledatronic::frame::{FrameWriter, PAYLOAD_LEN};
use ledatronic::poller::{ItemSink, Poller, PollerConfig, ThreadScheduler};
use ledatronic::schema::{FieldValue, Schema};

#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<(String, FieldValue, String)>>,
}

impl RecordingSink {
    fn updates(&self) -> Vec<(String, FieldValue, String)> {
        self.updates.lock().expect("sink lock").clone()
    }
}

impl ItemSink for RecordingSink {
    fn set_item(&self, item_path: &str, value: &FieldValue, caller: &str) {
        self.updates.lock().expect("sink lock").push((
            item_path.to_string(),
            value.clone(),
            caller.to_string(),
        ));
    }
}

fn payload(temp: u16, status: u8) -> [u8; PAYLOAD_LEN] {
    let mut payload = [0u8; PAYLOAD_LEN];
    payload[0..2].copy_from_slice(&temp.to_be_bytes());
    payload[4] = status;
    payload[10] = status;
    payload
}

/// Ends in a marker's first byte, so the frame right after it is lost.
const RESYNC_NOISE: &[u8] = &[0x13, 0x37, 0x0E];
const CLEAN_NOISE: &[u8] = &[0x13, 0x37];

/// Serve one connection: `noise`, then `frames`, then close.
fn spawn_device(
    noise: &'static [u8],
    frames: Vec<[u8; PAYLOAD_LEN]>,
) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut writer = FrameWriter::new(stream);
        writer.write_noise(noise).expect("noise");
        for frame in frames {
            // The poller may hang up early.
            if writer.send(&frame).is_err() {
                return;
            }
        }
    });
    (port, handle)
}

fn poller(port: u16, sink: Arc<RecordingSink>) -> Poller {
    let mut config = PollerConfig::new("127.0.0.1", port);
    config.name = "oven".to_string();
    Poller::new(config, Schema::ledatronic(), sink).expect("valid poller")
}

#[test]
fn publishes_every_frame_until_the_device_hangs_up() {
    // The trailing 0x0E in the noise is dropped together with the real
    // marker's first byte, so the first frame is lost to resync.
    let (port, device) = spawn_device(
        RESYNC_NOISE,
        vec![payload(20, 0), payload(450, 4), payload(455, 4)],
    );
    let sink = Arc::new(RecordingSink::default());
    let poller = poller(port, sink.clone());
    poller.bind_item("oven.temp", "current_combustion_temp");
    poller.bind_item("oven.state", "Status");
    poller.bind_item("oven.on", "active");

    let err = poller.poll_device().expect_err("session ends when the device closes");
    assert!(err.is_connection_interrupted());
    device.join().expect("device thread");

    let updates = sink.updates();
    let temps: Vec<_> = updates
        .iter()
        .filter(|(path, _, _)| path == "oven.temp")
        .map(|(_, value, _)| value.clone())
        .collect();
    assert_eq!(temps, vec![FieldValue::Int(450), FieldValue::Int(455)]);
    assert!(updates
        .iter()
        .any(|(path, value, _)| path == "oven.state"
            && *value == FieldValue::Text("Heizbetrieb".to_string())));
    assert!(updates
        .iter()
        .any(|(path, value, _)| path == "oven.on" && *value == FieldValue::Bool(true)));
    assert!(updates.iter().all(|(_, _, caller)| caller == "oven"));

    let latest = poller.snapshot().expect("snapshot stored");
    assert_eq!(
        latest.get("current_combustion_temp"),
        Some(&FieldValue::Int(455))
    );
    assert!(poller.last_update().is_some());
}

#[test]
fn callback_break_ends_session_cleanly() {
    let (port, device) = spawn_device(
        RESYNC_NOISE,
        vec![payload(300, 4), payload(310, 4), payload(320, 4)],
    );
    let sink = Arc::new(RecordingSink::default());
    let poller = poller(port, sink);

    let mut seen = Vec::new();
    poller
        .poll_device_with(|snapshot| {
            seen.push(snapshot.get("current_combustion_temp").cloned());
            ControlFlow::Break(())
        })
        .expect("break ends with Ok");
    device.join().expect("device thread");

    assert_eq!(seen.len(), 1);
}

#[test]
fn cold_oven_is_not_published_as_active() {
    let (port, device) = spawn_device(CLEAN_NOISE, vec![payload(0, 0), payload(25, 0)]);
    let sink = Arc::new(RecordingSink::default());
    let poller = poller(port, sink.clone());
    poller.bind_item("oven.on", "active");
    poller.bind_item("oven.temp", "current_combustion_temp");

    let mut decoded = 0;
    let _ = poller.poll_device_with(|_| {
        decoded += 1;
        ControlFlow::Continue(())
    });
    device.join().expect("device thread");
    assert_eq!(decoded, 2);

    // `false` and `0` are skipped; only the 25 °C reading goes out.
    assert_eq!(
        sink.updates()
            .into_iter()
            .map(|(path, value, _)| (path, value))
            .collect::<Vec<_>>(),
        vec![("oven.temp".to_string(), FieldValue::Int(25))]
    );
    let latest = poller.snapshot().expect("snapshot stored");
    assert!(!latest.is_active());
}

#[test]
fn scheduled_run_polls_immediately_and_stop_unschedules() {
    let (port, device) = spawn_device(RESYNC_NOISE, vec![payload(0, 0), payload(200, 4)]);
    let sink = Arc::new(RecordingSink::default());
    let poller = poller(port, sink.clone());
    poller.bind_item("oven.temp", "current_combustion_temp");

    let scheduler = ThreadScheduler::new();
    poller.run(&scheduler);
    assert!(poller.is_alive());
    assert_eq!(scheduler.job_names(), vec!["oven_poll".to_string()]);

    let deadline = Instant::now() + Duration::from_secs(5);
    while sink.updates().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    device.join().expect("device thread");

    poller.stop(&scheduler);
    scheduler.shutdown();
    assert!(!poller.is_alive());
    assert!(scheduler.job_names().is_empty());
    assert_eq!(sink.updates()[0].1, FieldValue::Int(200));
}
