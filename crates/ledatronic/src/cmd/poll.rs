use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledatronic_poller::{ItemSink, Poller, PollerConfig, DEFAULT_PORT};
use ledatronic_schema::FieldValue;

use crate::cmd::{parse_duration, Context, PollArgs};
use crate::exit::{poll_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::print_snapshot;

/// The CLI prints snapshots instead of feeding a host item tree.
struct NoItems;

impl ItemSink for NoItems {
    fn set_item(&self, _item_path: &str, _value: &FieldValue, _caller: &str) {}
}

pub fn run(args: PollArgs, ctx: &Context) -> CliResult<i32> {
    let mut config = resolve_config(&args)?;
    if let Some(timeout) = &args.read_timeout {
        config.read_timeout_ms = Some(duration_ms(timeout)?);
    }
    if let Some(timeout) = &args.connect_timeout {
        config.connect_timeout_ms = Some(duration_ms(timeout)?);
    }

    let schema = match (&ctx.schema_file, &config.schema_file) {
        (None, Some(_)) => config
            .load_schema()
            .map_err(|err| poll_error("schema load failed", err))?,
        _ => ctx.load_schema()?,
    };

    let poller = Poller::new(config, schema.clone(), Arc::new(NoItems))
        .map_err(|err| poll_error("invalid configuration", err))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(poller.clone(), interrupted.clone())?;

    let mut printed = 0usize;
    let result = poller.poll_device_with(|snapshot| {
        print_snapshot(snapshot, &schema, ctx.format);
        printed = printed.saturating_add(1);
        match args.count {
            Some(count) if printed >= count => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    match result {
        Ok(()) => Ok(SUCCESS),
        Err(err) if interrupted.load(Ordering::SeqCst) && err.is_connection_interrupted() => {
            Ok(SUCCESS)
        }
        Err(err) => Err(poll_error("poll failed", err)),
    }
}

fn resolve_config(args: &PollArgs) -> CliResult<PollerConfig> {
    if let Some(path) = &args.config {
        return PollerConfig::from_json_file(path)
            .map_err(|err| poll_error("config load failed", err));
    }

    match &args.host {
        Some(host) => Ok(PollerConfig::new(host.clone(), args.port.unwrap_or(DEFAULT_PORT))),
        None => Err(CliError::new(USAGE, "either HOST or --config is required")),
    }
}

fn duration_ms(input: &str) -> CliResult<u64> {
    let duration = parse_duration(input)?;
    Ok(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

fn install_ctrlc_handler(poller: Poller, interrupted: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
        poller.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
