use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ledatronic {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ledatronic");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("LEDATRONIC_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "frame: marker={:02x}{:02x} payload_len={}",
        ledatronic_frame::START1,
        ledatronic_frame::START2,
        ledatronic_frame::PAYLOAD_LEN
    );
    println!("features: poller={}, cli=true", cfg!(feature = "poller"));

    Ok(SUCCESS)
}
