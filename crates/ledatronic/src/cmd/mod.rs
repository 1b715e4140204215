use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use ledatronic_schema::Schema;

use crate::exit::{schema_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod poll;
pub mod schema;
pub mod simulate;
pub mod version;

/// Global options shared by all commands.
pub struct Context {
    pub format: OutputFormat,
    pub schema_file: Option<PathBuf>,
}

impl Context {
    /// The schema from `--schema`, or the built-in layout.
    pub fn load_schema(&self) -> CliResult<Schema> {
        match &self.schema_file {
            Some(path) => {
                Schema::from_json_file(path).map_err(|err| schema_error("schema load failed", err))
            }
            None => Ok(Schema::ledatronic()),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a controller and print every decoded status frame.
    Poll(PollArgs),
    /// Decode a hex payload and print the fields.
    Decode(DecodeArgs),
    /// Print the field schema.
    Schema(SchemaArgs),
    /// Run a controller simulator that pushes status frames.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Poll(args) => poll::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Schema(args) => schema::run(args, ctx),
        Command::Simulate(args) => simulate::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PollArgs {
    /// Controller host name or address.
    #[arg(env = "LEDATRONIC_HOST", conflicts_with = "config")]
    pub host: Option<String>,
    /// Controller port.
    #[arg(env = "LEDATRONIC_PORT", conflicts_with = "config")]
    pub port: Option<u16>,
    /// Plugin configuration file (JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Exit after N decoded frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Abort when no byte arrives for this long (e.g. 30s). Default: wait forever.
    #[arg(long)]
    pub read_timeout: Option<String>,
    /// Give up connecting after this long (e.g. 5s).
    #[arg(long)]
    pub connect_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload as hex; whitespace is ignored and a leading `0e ff` marker is stripped.
    pub hex: String,
}

#[derive(Args, Debug, Default)]
pub struct SchemaArgs {}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Address to listen on (e.g. 127.0.0.1:10001).
    pub addr: String,
    /// Time between frames (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub interval: String,
    /// Combustion temperature reported in °C.
    #[arg(long, default_value = "450")]
    pub temp: u16,
    /// Oven status code.
    #[arg(long, default_value = "4")]
    pub status: u8,
    /// Write a few garbage bytes before every frame.
    #[arg(long)]
    pub noise: bool,
    /// Close each connection after N frames.
    #[arg(long)]
    pub frames: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}
