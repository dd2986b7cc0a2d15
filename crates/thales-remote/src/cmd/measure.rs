use crate::cmd::{with_session, MeasureArgs, TargetArgs};
use crate::exit::{script_error, CliResult, SUCCESS};
use crate::output::{print_measurement, OutputFormat};

pub fn run(_args: MeasureArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let (potential, current) = with_session(target, |script| {
        let potential = script
            .get_potential()
            .map_err(|err| script_error("reading potential failed", err))?;
        let current = script
            .get_current()
            .map_err(|err| script_error("reading current failed", err))?;
        Ok((potential, current))
    })?;

    print_measurement(potential, current, format);
    Ok(SUCCESS)
}
