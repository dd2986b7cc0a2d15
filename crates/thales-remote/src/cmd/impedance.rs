use thales_script::RemoteScript;

use crate::cmd::{with_session, ImpedanceArgs, TargetArgs};
use crate::exit::{script_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_impedance, ImpedancePoint, OutputFormat};

pub fn run(args: ImpedanceArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    check_frequency(args.frequency)?;

    let point = with_session(target, |script| {
        apply_excitation(script, args.amplitude, args.periods)?;
        let impedance = script
            .get_impedance_at(args.frequency)
            .map_err(|err| script_error("impedance measurement failed", err))?;
        Ok(ImpedancePoint::new(args.frequency, impedance))
    })?;

    print_impedance(&[point], format);
    Ok(SUCCESS)
}

/// Send the optional amplitude and period settings shared by the impedance commands.
pub(crate) fn apply_excitation(
    script: &RemoteScript<'_>,
    amplitude: Option<f64>,
    periods: Option<u32>,
) -> CliResult<()> {
    if let Some(amplitude) = amplitude {
        script
            .set_amplitude(amplitude)
            .map_err(|err| script_error("setting amplitude failed", err))?;
    }
    if let Some(periods) = periods {
        script
            .set_number_of_periods(periods)
            .map_err(|err| script_error("setting periods failed", err))?;
    }
    Ok(())
}

fn check_frequency(frequency: f64) -> CliResult<()> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(CliError::new(
            USAGE,
            format!("frequency must be positive, got {frequency}"),
        ))
    }
}
