use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thales_script::log_spaced_frequencies;
use tracing::{info, warn};

use crate::cmd::impedance::apply_excitation;
use crate::cmd::{with_session, SpectrumArgs, TargetArgs};
use crate::exit::{script_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS};
use crate::output::{print_impedance, ImpedancePoint, OutputFormat};

pub fn run(args: SpectrumArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let frequencies = log_spaced_frequencies(args.lower, args.upper, args.points)
        .map_err(|err| script_error("invalid spectrum", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let points = with_session(target, |script| {
        apply_excitation(script, args.amplitude, args.periods)?;

        let mut points = Vec::with_capacity(frequencies.len());
        for &frequency in &frequencies {
            if !running.load(Ordering::SeqCst) {
                warn!(measured = points.len(), "spectrum interrupted");
                break;
            }
            let impedance = script
                .get_impedance_at(frequency)
                .map_err(|err| script_error("impedance measurement failed", err))?;
            info!(frequency, magnitude = impedance.magnitude(), "spectrum point");
            points.push(ImpedancePoint::new(frequency, impedance));
        }
        Ok(points)
    })?;

    print_impedance(&points, format);
    if points.len() < frequencies.len() {
        return Ok(INTERRUPTED);
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
