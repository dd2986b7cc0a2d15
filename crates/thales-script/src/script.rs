use std::time::Duration;

use thales_connection::Connection;
use thales_frame::{APP_CONTROL, REMOTE_SCRIPT};
use tracing::debug;

use crate::error::{Result, ScriptError};
use crate::impedance::Impedance;
use crate::reply;

/// Application control request switching Term into Remote Script mode.
pub const REMOTE_SCRIPT_REQUEST: &str = "<\x02>,ScriptRemote";

/// Bounds for the number of measurement periods per impedance point.
pub const MIN_PERIODS: u32 = 1;
pub const MAX_PERIODS: u32 = 100;

/// Operating mode of the potentiostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotentiostatMode {
    Potentiostatic,
    Galvanostatic,
    PseudoGalvanostatic,
}

impl PotentiostatMode {
    /// Remote Script assignments selecting this mode.
    pub fn command(self) -> &'static str {
        match self {
            PotentiostatMode::Potentiostatic => "Gal=0:GAL=0",
            PotentiostatMode::Galvanostatic => "Gal=-1:GAL=1",
            PotentiostatMode::PseudoGalvanostatic => "Gal=0:GAL=-1",
        }
    }
}

/// Remote Script commands over an established [`Connection`].
///
/// Every command is one request telegram followed by one reply. Replies are
/// taken from the front of the connection's queue, so a `RemoteScript` must
/// not share its connection with other concurrent request/reply traffic.
#[derive(Debug, Clone, Copy)]
pub struct RemoteScript<'a> {
    connection: &'a Connection,
    reply_timeout: Option<Duration>,
}

impl<'a> RemoteScript<'a> {
    /// Commands wait for replies without a bound.
    pub fn new(connection: &'a Connection) -> Self {
        Self {
            connection,
            reply_timeout: None,
        }
    }

    /// Fail commands with [`ScriptError::Timeout`] when Term takes longer
    /// than `timeout` to reply.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn connection(&self) -> &'a Connection {
        self.connection
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout
    }

    /// Execute one Remote Script command and return Term's reply text.
    ///
    /// `command` is sent as `1:<command>:`.
    pub fn execute_remote_command(&self, command: &str) -> Result<String> {
        self.request(command, format!("1:{command}:"), REMOTE_SCRIPT)
    }

    /// Ask Term to switch into Remote Script mode.
    pub fn force_thales_into_remote_script(&self) -> Result<String> {
        self.request("ScriptRemote", REMOTE_SCRIPT_REQUEST.to_string(), APP_CONTROL)
    }

    /// Cell current in amperes.
    pub fn get_current(&self) -> Result<f64> {
        let reply = self.execute_remote_command("CURRENT")?;
        reply::current(&reply)
    }

    /// Cell potential in volts.
    pub fn get_potential(&self) -> Result<f64> {
        let reply = self.execute_remote_command("POTENTIAL")?;
        reply::potential(&reply)
    }

    /// Galvanostatic set point in amperes.
    pub fn set_current(&self, current: f64) -> Result<()> {
        self.assign(format!("Cset={current}"))
    }

    /// Potentiostatic set point in volts.
    pub fn set_potential(&self, potential: f64) -> Result<()> {
        self.assign(format!("Pset={potential}"))
    }

    pub fn enable_potentiostat(&self, enabled: bool) -> Result<()> {
        self.assign(if enabled { "Pot=-1" } else { "Pot=0" })
    }

    pub fn set_potentiostat_mode(&self, mode: PotentiostatMode) -> Result<()> {
        self.assign(mode.command())
    }

    /// Excitation frequency in hertz.
    pub fn set_frequency(&self, frequency: f64) -> Result<()> {
        self.assign(format!("Frq={frequency}"))
    }

    /// Excitation amplitude in volts (or amperes when galvanostatic).
    ///
    /// Term expects milli units on the wire.
    pub fn set_amplitude(&self, amplitude: f64) -> Result<()> {
        self.assign(format!("Ampl={}", amplitude * 1e3))
    }

    /// Measurement periods per impedance point, clamped to
    /// [`MIN_PERIODS`]..=[`MAX_PERIODS`].
    pub fn set_number_of_periods(&self, periods: u32) -> Result<()> {
        let periods = periods.clamp(MIN_PERIODS, MAX_PERIODS);
        self.assign(format!("Nw={periods}"))
    }

    /// Measure impedance with the current frequency, amplitude and periods.
    pub fn get_impedance(&self) -> Result<Impedance> {
        let reply = self.execute_remote_command("IMPEDANCE")?;
        let (real, imaginary) = reply::impedance(&reply)?;
        Ok(Impedance::new(real, imaginary))
    }

    /// Set the frequency, then measure.
    pub fn get_impedance_at(&self, frequency: f64) -> Result<Impedance> {
        self.set_frequency(frequency)?;
        self.get_impedance()
    }

    /// Set frequency, amplitude and periods, then measure.
    pub fn get_impedance_with(
        &self,
        frequency: f64,
        amplitude: f64,
        periods: u32,
    ) -> Result<Impedance> {
        self.set_frequency(frequency)?;
        self.set_amplitude(amplitude)?;
        self.set_number_of_periods(periods)?;
        self.get_impedance()
    }

    fn assign(&self, command: impl AsRef<str>) -> Result<()> {
        let command = command.as_ref();
        let reply = self.execute_remote_command(command)?;
        debug!(command, reply = %reply, "remote script assignment");
        Ok(())
    }

    fn request(&self, command: &str, payload: String, message_type: u8) -> Result<String> {
        let telegram = match self.reply_timeout {
            Some(timeout) => self
                .connection
                .send_and_wait_for_reply_timeout(payload, message_type, timeout)?
                .ok_or_else(|| ScriptError::Timeout {
                    command: command.to_string(),
                    timeout,
                })?,
            None => self.connection.send_and_wait_for_reply(payload, message_type)?,
        };

        let reply = telegram.text().into_owned();
        if reply.trim().is_empty() {
            return Err(ScriptError::NoReply {
                command: command.to_string(),
            });
        }
        Ok(reply)
    }
}
