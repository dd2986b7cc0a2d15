use crate::cmd::{with_session, QueryArgs, TargetArgs};
use crate::exit::{script_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: QueryArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.trim();
    if command.is_empty() {
        return Err(CliError::new(USAGE, "command must not be empty"));
    }

    let reply = with_session(target, |script| {
        script
            .execute_remote_command(command)
            .map_err(|err| script_error("query failed", err))
    })?;

    print_reply(command, &reply, format);
    Ok(SUCCESS)
}
