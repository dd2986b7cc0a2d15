use std::time::Duration;

use clap::{Args, Subcommand};
use thales_connection::{Connection, ConnectionConfig};
use thales_script::RemoteScript;
use thales_transport::TERM_PORT;
use tracing::{debug, warn};

use crate::exit::{connection_error, script_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod impedance;
pub mod measure;
pub mod query;
pub mod spectrum;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one Remote Script command and print the reply.
    Query(QueryArgs),
    /// Read the cell potential and current.
    Measure(MeasureArgs),
    /// Measure impedance at a single frequency.
    Impedance(ImpedanceArgs),
    /// Measure an impedance spectrum over log-spaced frequencies.
    Spectrum(SpectrumArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Query(args) => query::run(args, target, format),
        Command::Measure(args) => measure::run(args, target, format),
        Command::Impedance(args) => impedance::run(args, target, format),
        Command::Spectrum(args) => spectrum::run(args, target, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where and how to reach Term.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Host running Term.
    #[arg(long, env = "THALES_HOST", global = true)]
    pub host: Option<String>,
    /// Term's Remote Script port.
    #[arg(long, env = "THALES_PORT", default_value_t = TERM_PORT, global = true)]
    pub port: u16,
    /// Session name announced in the handshake.
    #[arg(long, env = "THALES_SESSION", default_value = "ScriptRemote", global = true)]
    pub session: String,
    /// Maximum time to wait for each reply (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s", global = true)]
    pub reply_timeout: String,
    /// Maximum time for the TCP connect (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub connect_timeout: String,
    /// Pause between TCP connect and handshake.
    #[arg(long, default_value = "400ms", global = true, hide = true)]
    pub settle_delay: String,
    /// Pause after the handshake before the first command.
    #[arg(long, default_value = "800ms", global = true, hide = true)]
    pub session_setup_delay: String,
    /// Switch Term into Remote Script mode before running the command.
    #[arg(long, global = true)]
    pub force_remote_script: bool,
}

impl TargetArgs {
    fn host(&self) -> CliResult<&str> {
        self.host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| CliError::new(USAGE, "no host given (use --host or THALES_HOST)"))
    }

    fn connection_config(&self) -> CliResult<ConnectionConfig> {
        Ok(ConnectionConfig::default()
            .with_port(self.port)
            .with_connect_timeout(Some(parse_duration(&self.connect_timeout)?))
            .with_settle_delay(parse_delay(&self.settle_delay)?)
            .with_session_setup_delay(parse_delay(&self.session_setup_delay)?))
    }
}

/// Connect, run `action` with a Remote Script handle, and always disconnect.
pub fn with_session<T>(
    target: &TargetArgs,
    action: impl FnOnce(&RemoteScript<'_>) -> CliResult<T>,
) -> CliResult<T> {
    let host = target.host()?;
    let reply_timeout = parse_duration(&target.reply_timeout)?;
    let connection = Connection::with_config(target.connection_config()?);

    connection
        .connect(host, &target.session)
        .map_err(|err| connection_error("connect failed", err))?;
    debug!(host, port = target.port, session = %target.session, "connected to term");

    let script = RemoteScript::new(&connection).with_reply_timeout(reply_timeout);
    let result = if target.force_remote_script {
        script
            .force_thales_into_remote_script()
            .map_err(|err| script_error("switching to remote script failed", err))
            .and_then(|_| action(&script))
    } else {
        action(&script)
    };

    if let Err(err) = connection.disconnect() {
        warn!(error = %err, "disconnect failed");
    }
    result
}

/// Parse a positive duration such as `5s`, `250ms` or `3` (seconds).
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_delay(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Like [`parse_duration`], but zero is allowed.
pub fn parse_delay(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Remote Script command, e.g. POTENTIAL or Pset=0.1.
    pub command: String,
}

#[derive(Args, Debug, Default)]
pub struct MeasureArgs {}

#[derive(Args, Debug)]
pub struct ImpedanceArgs {
    /// Excitation frequency in Hz.
    #[arg(long)]
    pub frequency: f64,
    /// Excitation amplitude in V (A when galvanostatic).
    #[arg(long)]
    pub amplitude: Option<f64>,
    /// Measurement periods (clamped to 1..=100).
    #[arg(long)]
    pub periods: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SpectrumArgs {
    /// Lowest frequency in Hz.
    #[arg(long, default_value_t = 1000.0)]
    pub lower: f64,
    /// Highest frequency in Hz.
    #[arg(long, default_value_t = 2e5)]
    pub upper: f64,
    /// Number of log-spaced points, measured from high to low.
    #[arg(long, default_value_t = 10)]
    pub points: usize,
    /// Excitation amplitude in V (A when galvanostatic).
    #[arg(long)]
    pub amplitude: Option<f64>,
    /// Measurement periods per point (clamped to 1..=100).
    #[arg(long)]
    pub periods: Option<u32>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
