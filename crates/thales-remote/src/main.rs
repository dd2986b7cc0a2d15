mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, TargetArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "thales-remote",
    version,
    about = "Remote Script client for Zahner Thales"
)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.target, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_with_target() {
        let cli = Cli::try_parse_from([
            "thales-remote",
            "--host",
            "192.168.2.78",
            "query",
            "POTENTIAL",
            "--port",
            "2600",
        ])
        .expect("query args should parse");

        assert_eq!(cli.target.host.as_deref(), Some("192.168.2.78"));
        assert_eq!(cli.target.port, 2600);
        assert_eq!(cli.target.session, "ScriptRemote");
        assert!(matches!(cli.command, Command::Query(ref args) if args.command == "POTENTIAL"));
    }

    #[test]
    fn parses_spectrum_defaults() {
        let cli = Cli::try_parse_from(["thales-remote", "spectrum", "--points", "5"])
            .expect("spectrum args should parse");
        match cli.command {
            Command::Spectrum(args) => {
                assert_eq!(args.points, 5);
                assert_eq!(args.lower, 1000.0);
                assert_eq!(args.upper, 2e5);
                assert!(args.amplitude.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn impedance_requires_frequency() {
        let err = Cli::try_parse_from(["thales-remote", "impedance"])
            .expect_err("missing --frequency should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_out_of_range_port() {
        let err = Cli::try_parse_from(["thales-remote", "--port", "70000", "measure"])
            .expect_err("port above u16 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
