use thales_frame::PROTOCOL_VERSION;
use thales_transport::TERM_PORT;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("thales-remote {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: thales-remote");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("THALES_REMOTE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("THALES_REMOTE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("term_port: {TERM_PORT}");
    println!(
        "protocol_version: {:02X} {:02X}",
        PROTOCOL_VERSION[0], PROTOCOL_VERSION[1]
    );

    Ok(SUCCESS)
}
