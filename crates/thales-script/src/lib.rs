//! Remote Script commands for Zahner Thales.
//!
//! [`RemoteScript`] turns the text protocol spoken over a
//! [`thales_connection::Connection`] into typed calls: set points, modes,
//! and potential, current and impedance measurements.
//!
//! ```no_run
//! use thales_connection::Connection;
//! use thales_script::{PotentiostatMode, RemoteScript};
//!
//! # fn main() -> thales_script::Result<()> {
//! let connection = Connection::new();
//! connection.connect("192.168.2.78", "ScriptRemote")?;
//!
//! let script = RemoteScript::new(&connection);
//! script.force_thales_into_remote_script()?;
//! script.set_potentiostat_mode(PotentiostatMode::Potentiostatic)?;
//! script.set_potential(0.0)?;
//! script.enable_potentiostat(true)?;
//! println!("{} V", script.get_potential()?);
//!
//! let z = script.get_impedance_with(2000.0, 10e-3, 3)?;
//! println!("{z}");
//!
//! connection.disconnect()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod impedance;
pub mod reply;
pub mod script;
pub mod sweep;

pub use error::{Result, ScriptError};
pub use impedance::Impedance;
pub use script::{PotentiostatMode, RemoteScript, MAX_PERIODS, MIN_PERIODS, REMOTE_SCRIPT_REQUEST};
pub use sweep::log_spaced_frequencies;
