use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ledatronic_frame::{FrameError, FrameWriter, PAYLOAD_LEN};
use tracing::{info, warn};

use crate::cmd::{parse_duration, SimulateArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};

const NOISE: [u8; 3] = [0x00, 0x42, 0x13];

/// Values the simulator puts on the wire.
#[derive(Debug, Clone, Copy)]
struct DeviceState {
    temp: u16,
    status: u8,
    burn_cycles: u16,
}

impl DeviceState {
    fn payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0..2].copy_from_slice(&self.temp.to_be_bytes());
        payload[2] = 60;
        payload[3] = 55;
        payload[4] = self.status;
        payload[7] = 12;
        payload[8..10].copy_from_slice(&self.temp.saturating_add(50).to_be_bytes());
        payload[10] = self.status;
        payload[11] = 80;
        payload[25..27].copy_from_slice(&self.burn_cycles.to_be_bytes());
        payload[31] = 58;
        payload[34] = 41;
        payload[35] = 52;
        payload[36] = 63;
        payload[37] = 65;
        payload[38] = 70;
        payload[39] = 62;
        payload[44] = 15;
        payload[50] = 1;
        payload
    }
}

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let listener = TcpListener::bind(&args.addr).map_err(|err| io_error("bind failed", err))?;
    let local = listener
        .local_addr()
        .map_err(|err| io_error("bind failed", err))?;
    info!(addr = %local, "simulator listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), local.to_string())?;

    let mut state = DeviceState {
        temp: args.temp,
        status: args.status,
        burn_cycles: 0,
    };

    while running.load(Ordering::SeqCst) {
        let (stream, peer) = listener
            .accept()
            .map_err(|err| io_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        info!(%peer, "client connected");

        match serve(stream, &args, interval, &running, &mut state) {
            Ok(sent) => info!(%peer, sent, "client session ended"),
            Err(FrameError::Io(err)) => warn!(%peer, "client went away: {err}"),
            Err(err) => return Err(frame_error("send failed", err)),
        }
    }

    Ok(SUCCESS)
}

fn serve(
    stream: TcpStream,
    args: &SimulateArgs,
    interval: Duration,
    running: &AtomicBool,
    state: &mut DeviceState,
) -> Result<usize, FrameError> {
    let mut writer = FrameWriter::new(stream);
    let mut sent = 0usize;

    while running.load(Ordering::SeqCst) {
        if args.frames.is_some_and(|limit| sent >= limit) {
            break;
        }
        if args.noise {
            writer.write_noise(&NOISE)?;
        }
        writer.send(&state.payload())?;
        sent += 1;
        state.burn_cycles = state.burn_cycles.wrapping_add(1);

        thread::sleep(interval);
    }

    Ok(sent)
}

/// Ctrl-C clears `running` and pokes the listener so a blocked accept returns.
fn install_ctrlc_handler(running: Arc<AtomicBool>, local: String) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = TcpStream::connect(&local);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledatronic_schema::{decode, FieldValue, Schema};

    #[test]
    fn payload_decodes_with_builtin_schema() {
        let state = DeviceState {
            temp: 450,
            status: 4,
            burn_cycles: 7,
        };
        let snapshot = decode(&state.payload(), &Schema::ledatronic());

        assert_eq!(
            snapshot.get("current_combustion_temp"),
            Some(&FieldValue::Int(450))
        );
        assert_eq!(snapshot.get("num_burn_cycles"), Some(&FieldValue::Int(7)));
        assert_eq!(snapshot.get("oven_state_raw"), Some(&FieldValue::Int(4)));
        assert!(snapshot.is_active());
        assert!(snapshot.errors().is_empty());
    }
}
